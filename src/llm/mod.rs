//! LLM integration.
//!
//! Supports:
//! - **Ollama**: local or remote `/api/chat` endpoint over HTTP
//! - **OpenAI**: `/chat/completions`, or any compatible endpoint
//!
//! Only the LLM-backed oracle talks to a provider; the pipeline itself
//! sees the oracle traits.

pub mod ollama;
pub mod openai;
pub mod provider;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use provider::*;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::config::env_or;
use crate::error::{ConfigError, LlmError};

/// Model used for OpenAI when `OPENAI_MODEL` is unset.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmBackend {
    #[default]
    Ollama,
    OpenAi,
}

impl LlmBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAi => "openai",
        }
    }

    /// Prefix of the backend's environment variables.
    fn env_prefix(&self) -> &'static str {
        match self {
            Self::Ollama => "OLLAMA",
            Self::OpenAi => "OPENAI",
        }
    }
}

impl fmt::Display for LlmBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAi),
            other => Err(format!("unsupported provider '{other}' (expected ollama or openai)")),
        }
    }
}

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
    /// Required for OpenAI. For Ollama, a bearer token for endpoints behind
    /// an authenticating proxy.
    pub api_key: Option<SecretString>,
    /// OpenAI organization header.
    pub organization: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self::ollama()
    }
}

impl LlmConfig {
    /// Local Ollama defaults.
    pub fn ollama() -> Self {
        Self {
            backend: LlmBackend::Ollama,
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            temperature: 0.7,
            max_tokens: 1024,
            timeout: Duration::from_secs(120),
            api_key: None,
            organization: None,
        }
    }

    /// OpenAI defaults for `model`.
    pub fn openai(api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            backend: LlmBackend::OpenAi,
            base_url: "https://api.openai.com/v1".to_string(),
            model: model.into(),
            temperature: 0.7,
            max_tokens: 1024,
            timeout: Duration::from_secs(60),
            api_key: Some(api_key),
            organization: None,
        }
    }

    /// Load from the environment.
    ///
    /// `QUILL_LLM_PROVIDER` picks the backend (default `ollama`); the rest is
    /// read from `OLLAMA_*` or `OPENAI_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend: LlmBackend = env_or("QUILL_LLM_PROVIDER", LlmBackend::default())?;
        let key = |name: &str| format!("{}_{name}", backend.env_prefix());
        let api_key = optional_env(&key("API_KEY")).map(SecretString::from);

        let defaults = match backend {
            LlmBackend::Ollama => Self::ollama(),
            LlmBackend::OpenAi => {
                let api_key = api_key
                    .clone()
                    .ok_or_else(|| ConfigError::MissingEnvVar(key("API_KEY")))?;
                Self::openai(api_key, DEFAULT_OPENAI_MODEL)
            }
        };

        let config = Self {
            backend,
            base_url: env_or(&key("BASE_URL"), defaults.base_url)?,
            model: env_or(&key("MODEL"), defaults.model)?,
            temperature: env_or(&key("TEMPERATURE"), defaults.temperature)?,
            max_tokens: env_or(&key("MAX_TOKENS"), defaults.max_tokens)?,
            timeout: Duration::from_secs(env_or(
                &key("TIMEOUT_SECS"),
                defaults.timeout.as_secs(),
            )?),
            api_key,
            organization: match backend {
                LlmBackend::OpenAi => optional_env("OPENAI_ORGANIZATION"),
                LlmBackend::Ollama => None,
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let prefix = self.backend.env_prefix();
        let invalid = |name: &str, message: &str| ConfigError::InvalidValue {
            key: format!("{prefix}_{name}"),
            message: message.to_string(),
        };

        if self.backend == LlmBackend::OpenAi
            && self
                .api_key
                .as_ref()
                .is_none_or(|k| k.expose_secret().trim().is_empty())
        {
            return Err(ConfigError::MissingEnvVar(format!("{prefix}_API_KEY")));
        }
        if self.base_url.trim().is_empty() {
            return Err(invalid("BASE_URL", "cannot be empty"));
        }
        if self.model.trim().is_empty() {
            return Err(invalid("MODEL", "cannot be empty"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(invalid("TEMPERATURE", "must be between 0 and 2"));
        }
        if self.max_tokens == 0 {
            return Err(invalid("MAX_TOKENS", "must be greater than 0"));
        }
        if self.timeout.is_zero() {
            return Err(invalid("TIMEOUT_SECS", "must be greater than 0"));
        }
        Ok(())
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match config.backend {
        LlmBackend::Ollama => create_ollama_provider(config),
        LlmBackend::OpenAi => create_openai_provider(config),
    }
}

fn create_ollama_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let provider = OllamaProvider::new(config)?;
    tracing::info!("Using Ollama (model: {}, url: {})", config.model, config.base_url);
    Ok(Arc::new(provider))
}

fn create_openai_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let provider = OpenAiProvider::new(config)?;
    tracing::info!("Using OpenAI (model: {}, url: {})", config.model, config.base_url);
    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LlmConfig::default();
        assert_eq!(config.backend, LlmBackend::Ollama);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_temperature_out_of_range() {
        for temperature in [-0.1, 2.5] {
            let config = LlmConfig {
                temperature,
                ..LlmConfig::default()
            };
            assert!(config.validate().is_err(), "{temperature} accepted");
        }
    }

    #[test]
    fn test_empty_model_rejected() {
        let config = LlmConfig {
            model: "  ".into(),
            ..LlmConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("OLLAMA_MODEL"));
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("ollama".parse::<LlmBackend>().unwrap(), LlmBackend::Ollama);
        assert_eq!(" OpenAI ".parse::<LlmBackend>().unwrap(), LlmBackend::OpenAi);
        assert!("anthropic".parse::<LlmBackend>().is_err());
        assert_eq!(LlmBackend::OpenAi.to_string(), "openai");
    }

    #[test]
    fn test_openai_requires_api_key() {
        let config = LlmConfig {
            api_key: None,
            ..LlmConfig::openai(SecretString::from("sk-test"), "gpt-4o")
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "OPENAI_API_KEY"));

        let blank = LlmConfig::openai(SecretString::from("  "), "gpt-4o");
        assert!(matches!(blank.validate(), Err(ConfigError::MissingEnvVar(_))));
    }

    #[test]
    fn test_create_provider_reports_model() {
        let config = LlmConfig {
            model: "mistral".into(),
            api_key: Some(SecretString::from("test-key")),
            ..LlmConfig::default()
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.model_name(), "mistral");
    }

    #[test]
    fn test_create_openai_provider() {
        let config = LlmConfig::openai(SecretString::from("sk-test"), "gpt-4o");
        assert!(config.validate().is_ok());
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.model_name(), "gpt-4o");
    }
}
