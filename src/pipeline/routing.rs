//! Routing policy: one handler per message type, chosen by table lookup.
//!
//! | Type        | Document | Reply                                        |
//! |-------------|----------|----------------------------------------------|
//! | idea        | yes      | "Captured idea in category: …"               |
//! | decision    | yes      | "Recorded decision in category: …"           |
//! | status      | yes      | "Logged status update in category: …"        |
//! | information | yes      | "Noted information in category: …"           |
//! | unknown     | no       | tag suggestions, only when confident         |
//!
//! A documentation failure aborts the handler before any reply is sent.
//! Routing the same message twice sends the reply twice.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::channels::Channel;
use crate::domain::{AnalysisResult, Message, MessageType};
use crate::error::PipelineError;
use crate::pipeline::cancellable;
use crate::pipeline::docs::DocumentationService;
use crate::pipeline::merge::TagDisposition;
use crate::pipeline::types::RouteOutcome;

/// Type-specific handling policy.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(
        &self,
        message: &Message,
        analysis: &AnalysisResult,
        cancel: &CancellationToken,
    ) -> Result<RouteOutcome, PipelineError>;
}

// ── Documenting handlers ────────────────────────────────────────────

/// Stores a document, then confirms in the conversation.
pub struct DocumentingHandler {
    /// Reply opener, e.g. "✅ Recorded decision".
    headline: &'static str,
    docs: Arc<DocumentationService>,
    channel: Arc<dyn Channel>,
}

impl DocumentingHandler {
    pub fn new(
        headline: &'static str,
        docs: Arc<DocumentationService>,
        channel: Arc<dyn Channel>,
    ) -> Self {
        Self {
            headline,
            docs,
            channel,
        }
    }

    fn reply_text(&self, message: &Message) -> String {
        let mut reply = format!("{} in category: {}", self.headline, message.category());
        if message.has_references() {
            reply.push_str(&format!(
                "\n🔗 Linked to {} related items",
                message.references().len()
            ));
        }
        reply
    }
}

#[async_trait]
impl MessageHandler for DocumentingHandler {
    async fn handle(
        &self,
        message: &Message,
        _analysis: &AnalysisResult,
        cancel: &CancellationToken,
    ) -> Result<RouteOutcome, PipelineError> {
        let path = self.docs.create_documentation(message, cancel).await?;

        let reply = self.reply_text(message);
        cancellable(
            cancel,
            self.channel.send_reply(message.reply_marker(), &reply),
        )
        .await??;

        Ok(RouteOutcome {
            document_path: Some(path),
            reply: Some(reply),
        })
    }
}

// ── Unknown handler ─────────────────────────────────────────────────

/// Offers tag suggestions for confidently analysed but unclassified messages.
pub struct SuggestionHandler {
    channel: Arc<dyn Channel>,
}

impl SuggestionHandler {
    pub fn new(channel: Arc<dyn Channel>) -> Self {
        Self { channel }
    }
}

/// Reply text offering `tags` to the user.
pub fn suggestion_text(tags: &[String]) -> String {
    let mut text =
        String::from("💡 I noticed this might be relevant. Consider adding these tags:\n");
    for tag in tags {
        text.push_str(&format!("- #{}\n", tag));
    }
    text
}

#[async_trait]
impl MessageHandler for SuggestionHandler {
    async fn handle(
        &self,
        message: &Message,
        analysis: &AnalysisResult,
        cancel: &CancellationToken,
    ) -> Result<RouteOutcome, PipelineError> {
        let tags = match TagDisposition::for_analysis(analysis) {
            TagDisposition::Surface(tags) => tags,
            TagDisposition::LowConfidence(withheld) => {
                debug!(
                    id = %message.id(),
                    confidence = analysis.confidence(),
                    tags = ?withheld,
                    "Low-confidence tag suggestions withheld"
                );
                return Ok(RouteOutcome::default());
            }
            TagDisposition::None => {
                debug!(id = %message.id(), "Unclassified message, nothing to suggest");
                return Ok(RouteOutcome::default());
            }
        };

        let reply = suggestion_text(&tags);
        cancellable(
            cancel,
            self.channel.send_reply(message.reply_marker(), &reply),
        )
        .await??;

        Ok(RouteOutcome {
            document_path: None,
            reply: Some(reply),
        })
    }
}

// ── Router ──────────────────────────────────────────────────────────

/// Handler table keyed by message type.
pub struct Router {
    handlers: HashMap<MessageType, Arc<dyn MessageHandler>>,
    fallback: Arc<dyn MessageHandler>,
}

impl Router {
    /// Build the standard table.
    pub fn new(docs: Arc<DocumentationService>, channel: Arc<dyn Channel>) -> Self {
        let documenting = |headline| -> Arc<dyn MessageHandler> {
            Arc::new(DocumentingHandler::new(
                headline,
                Arc::clone(&docs),
                Arc::clone(&channel),
            ))
        };
        let unknown: Arc<dyn MessageHandler> =
            Arc::new(SuggestionHandler::new(Arc::clone(&channel)));

        let handlers = HashMap::from([
            (MessageType::Idea, documenting("📝 Captured idea")),
            (MessageType::Decision, documenting("✅ Recorded decision")),
            (MessageType::Status, documenting("📊 Logged status update")),
            (MessageType::Information, documenting("ℹ️ Noted information")),
            (MessageType::Unknown, Arc::clone(&unknown)),
        ]);

        Self {
            handlers,
            fallback: unknown,
        }
    }

    /// Replace the handler for one type.
    pub fn with_handler(
        mut self,
        message_type: MessageType,
        handler: Arc<dyn MessageHandler>,
    ) -> Self {
        self.handlers.insert(message_type, handler);
        self
    }

    /// Run the handler for the analysis' type.
    pub async fn route(
        &self,
        message: &Message,
        analysis: &AnalysisResult,
        cancel: &CancellationToken,
    ) -> Result<RouteOutcome, PipelineError> {
        let message_type = analysis.message_type();
        let handler = self.handlers.get(&message_type).unwrap_or(&self.fallback);

        let outcome = handler.handle(message, analysis, cancel).await?;

        info!(
            id = %message.id(),
            message_type = %message_type,
            category = %message.category(),
            documented = outcome.document_path.is_some(),
            replied = outcome.reply.is_some(),
            "Routed message"
        );
        Ok(outcome)
    }
}
