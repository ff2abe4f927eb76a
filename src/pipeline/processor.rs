//! Message processor: classifies a correlated message and routes it.
//!
//! Flow:
//! 1. Classification oracle → `AnalysisResult` (failure aborts)
//! 2. Merge the analysis into the message
//! 3. Reference detection, only when the message still has none
//! 4. Route by type → document and/or reply
//!
//! No step is retried here. Side effects already performed when a later
//! step fails are not rolled back.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::Message;
use crate::error::PipelineError;
use crate::pipeline::cancellable;
use crate::pipeline::merge::{apply_analysis, detect_references_if_absent};
use crate::pipeline::routing::Router;
use crate::pipeline::types::{ClassificationOracle, ProcessedMessage, ReferenceOracle};

pub struct MessageProcessor {
    classifier: Arc<dyn ClassificationOracle>,
    references: Arc<dyn ReferenceOracle>,
    router: Router,
}

impl MessageProcessor {
    pub fn new(
        classifier: Arc<dyn ClassificationOracle>,
        references: Arc<dyn ReferenceOracle>,
        router: Router,
    ) -> Self {
        Self {
            classifier,
            references,
            router,
        }
    }

    /// Run one message through the full pipeline.
    ///
    /// The message is classified in place; on success the returned
    /// `ProcessedMessage` carries a copy of its final state.
    pub async fn process(
        &self,
        message: &mut Message,
        cancel: &CancellationToken,
    ) -> Result<ProcessedMessage, PipelineError> {
        info!(
            id = %message.id(),
            thread_id = %message.thread_id(),
            sender = %message.sender(),
            "Processing message"
        );

        let analysis = cancellable(cancel, self.classifier.analyze(message.content().text()))
            .await?
            .map_err(PipelineError::Analysis)?;

        debug!(
            id = %message.id(),
            message_type = %analysis.message_type(),
            confidence = analysis.confidence(),
            "Analysis complete"
        );

        let merged = apply_analysis(message, &analysis);
        if merged.category_dropped {
            debug!(id = %message.id(), "Analysis category ignored");
        }

        cancellable(
            cancel,
            detect_references_if_absent(message, self.references.as_ref()),
        )
        .await?
        .map_err(PipelineError::ReferenceDetection)?;

        let outcome = self.router.route(message, &analysis, cancel).await?;

        Ok(ProcessedMessage {
            message: message.clone(),
            analysis,
            outcome,
            processed_at: Utc::now(),
        })
    }
}
