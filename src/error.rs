//! Error types for quill.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Malformed value objects. Reported synchronously, never retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("content cannot be empty")]
    EmptyContent,

    #[error("sender cannot be empty")]
    EmptySender,

    #[error("invalid message type: {0}")]
    InvalidMessageType(String),

    #[error("invalid category: {0}")]
    InvalidCategory(String),

    #[error("invalid reference type: {0}")]
    InvalidReferenceType(String),

    #[error("reference value cannot be empty")]
    EmptyReferenceValue,

    #[error("invalid reference format: {0}")]
    InvalidReferenceFormat(String),

    #[error("confidence score must be between 0 and 1, got {0}")]
    ConfidenceOutOfRange(f64),

    #[error("invalid id: {0}")]
    InvalidId(String),
}

/// Transport errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send reply on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} returned HTTP {status}: {body}")]
    HttpStatus {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures of the classification, reference, and documentation oracles.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Could not parse oracle response: {0}")]
    Parse(String),

    #[error("Invalid analysis: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Oracle unavailable: {0}")]
    Unavailable(String),
}

/// Document store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid document path: {0}")]
    InvalidPath(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pipeline-abort errors. Each wraps the collaborator failure of its step.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Analysis failed: {0}")]
    Analysis(#[source] OracleError),

    #[error("Reference detection failed: {0}")]
    ReferenceDetection(#[source] OracleError),

    #[error("Documentation generation failed: {0}")]
    Generation(#[source] OracleError),

    #[error("Documentation store failed: {0}")]
    Store(#[from] StoreError),

    #[error("Reply failed: {0}")]
    Reply(#[from] ChannelError),

    #[error("Invalid message: {0}")]
    Validation(#[from] ValidationError),

    #[error("Processing cancelled")]
    Cancelled,
}
