//! Collaborator contracts consumed by the pipeline, and its result types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{
    AnalysisResult, Category, Message, MessageId, MessageType, Reference, ThreadId,
};
use crate::error::{OracleError, StoreError};

// ── Oracles ─────────────────────────────────────────────────────────

/// Assigns type, category and confidence to raw text.
#[async_trait]
pub trait ClassificationOracle: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<AnalysisResult, OracleError>;
}

/// Finds references to other messages or documents in raw text.
#[async_trait]
pub trait ReferenceOracle: Send + Sync {
    async fn detect_references(&self, text: &str) -> Result<Vec<Reference>, OracleError>;
}

/// Renders a message into a Markdown document.
#[async_trait]
pub trait DocumentationGenerator: Send + Sync {
    async fn generate(&self, text: &str, metadata: &DocMetadata) -> Result<String, OracleError>;
}

// ── Document store ──────────────────────────────────────────────────

/// Persists rendered documents under relative, `/`-separated paths.
///
/// `store` replaces an existing path; `update` requires one.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn store(
        &self,
        path: &str,
        content: &str,
        metadata: &DocMetadata,
    ) -> Result<(), StoreError>;

    async fn get(&self, path: &str) -> Result<String, StoreError>;

    async fn update(
        &self,
        path: &str,
        content: &str,
        metadata: &DocMetadata,
    ) -> Result<(), StoreError>;

    /// Document paths under `prefix`, sorted. A missing prefix lists nothing.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// Context passed to the generator and stored alongside a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocMetadata {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub category: Category,
    pub created_at: DateTime<Utc>,
    pub message_id: MessageId,
    pub thread_id: ThreadId,
    pub sender: String,
    pub references: Vec<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl DocMetadata {
    pub fn from_message(message: &Message) -> Self {
        Self {
            message_type: message.message_type(),
            category: message.category(),
            created_at: message.created_at(),
            message_id: message.id(),
            thread_id: message.thread_id(),
            sender: message.sender().to_string(),
            references: message.references().to_vec(),
            updated_at: None,
        }
    }
}

// ── Results ─────────────────────────────────────────────────────────

/// Side effects produced by routing one message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteOutcome {
    /// Path of the stored document, if one was written.
    pub document_path: Option<String>,
    /// Reply text sent back to the conversation, if any.
    pub reply: Option<String>,
}

/// A message that went through the whole pipeline.
#[derive(Debug, Clone)]
pub struct ProcessedMessage {
    pub message: Message,
    pub analysis: AnalysisResult,
    pub outcome: RouteOutcome,
    pub processed_at: DateTime<Utc>,
}
