//! Ollama chat provider (`POST {base_url}/api/chat`, non-streaming).

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::llm::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider,
};

const PROVIDER: &str = "ollama";

pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
    timeout: Duration,
    default_temperature: f32,
    default_max_tokens: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

impl OllamaProvider {
    pub fn new(config: &super::LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.into(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            timeout: config.timeout,
            default_temperature: config.temperature,
            default_max_tokens: config.max_tokens,
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }

    fn map_send_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout {
                provider: PROVIDER.into(),
                timeout: self.timeout,
            }
        } else {
            LlmError::RequestFailed {
                provider: PROVIDER.into(),
                reason: e.to_string(),
            }
        }
    }
}

fn finish_reason(done_reason: Option<&str>) -> FinishReason {
    match done_reason {
        Some("stop") | None => FinishReason::Stop,
        Some("length") => FinishReason::Length,
        Some(_) => FinishReason::Unknown,
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: &request.messages,
            stream: false,
            options: ChatOptions {
                temperature: request.temperature.unwrap_or(self.default_temperature),
                num_predict: request.max_tokens.unwrap_or(self.default_max_tokens),
            },
        };

        let mut builder = self.client.post(self.chat_url()).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let resp = builder.send().await.map_err(|e| self.map_send_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::HttpStatus {
                provider: PROVIDER.into(),
                status: status.as_u16(),
                body,
            });
        }

        let text = resp.text().await.map_err(|e| self.map_send_error(e))?;
        let parsed: ChatResponse = serde_json::from_str(&text)?;
        let message = parsed.message.ok_or_else(|| LlmError::InvalidResponse {
            provider: PROVIDER.into(),
            reason: "response has no message".into(),
        })?;

        tracing::debug!(
            model = %self.model,
            input_tokens = parsed.prompt_eval_count,
            output_tokens = parsed.eval_count,
            "Ollama completion finished"
        );

        Ok(CompletionResponse {
            content: message.content,
            input_tokens: parsed.prompt_eval_count,
            output_tokens: parsed.eval_count,
            finish_reason: finish_reason(parsed.done_reason.as_deref()),
        })
    }
}
