//! LLM-backed oracle: classification, reference detection and
//! documentation generation by prompting an `LlmProvider`.

mod parse;
mod prompts;

pub use parse::{parse_analysis, parse_references};

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{AnalysisResult, Reference};
use crate::error::OracleError;
use crate::llm::{ChatMessage, CompletionRequest, FinishReason, LlmProvider};
use crate::pipeline::types::{
    ClassificationOracle, DocMetadata, DocumentationGenerator, ReferenceOracle,
};

pub struct LlmOracle {
    llm: Arc<dyn LlmProvider>,
}

impl LlmOracle {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    async fn ask(&self, system: &str, user: impl Into<String>) -> Result<String, OracleError> {
        let request =
            CompletionRequest::new(vec![ChatMessage::system(system), ChatMessage::user(user)]);
        let response = self.llm.complete(request).await?;

        if response.finish_reason == FinishReason::Length {
            debug!(model = %self.llm.model_name(), "Oracle answer hit the token limit");
        }
        Ok(response.content)
    }
}

#[async_trait]
impl ClassificationOracle for LlmOracle {
    async fn analyze(&self, text: &str) -> Result<AnalysisResult, OracleError> {
        let raw = self.ask(prompts::ANALYZE_SYSTEM_PROMPT, text).await?;
        parse_analysis(&raw)
    }
}

#[async_trait]
impl ReferenceOracle for LlmOracle {
    async fn detect_references(&self, text: &str) -> Result<Vec<Reference>, OracleError> {
        let raw = self.ask(prompts::REFERENCES_SYSTEM_PROMPT, text).await?;
        Ok(parse_references(&raw))
    }
}

#[async_trait]
impl DocumentationGenerator for LlmOracle {
    async fn generate(&self, text: &str, metadata: &DocMetadata) -> Result<String, OracleError> {
        let prompt = prompts::documentation_prompt(text, metadata);
        let document = self.ask(prompts::DOCUMENTATION_SYSTEM_PROMPT, prompt).await?;
        let document = document.trim();
        if document.is_empty() {
            return Err(OracleError::Parse("empty documentation".into()));
        }
        Ok(document.to_string())
    }
}
