//! Message processing pipeline.
//!
//! Every correlated message flows through:
//! 1. `ClassificationOracle::analyze()`: type, category, confidence
//! 2. `merge::apply_analysis()`: fold the analysis into the message
//! 3. `merge::detect_references_if_absent()`: reference fallback
//! 4. `routing::Router::route()`: document and/or reply by type
//!
//! Collaborator calls race the shutdown token and abort with
//! `PipelineError::Cancelled` once it fires.

pub mod docs;
pub mod merge;
pub mod processor;
pub mod routing;
pub mod types;

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::PipelineError;

/// Await `fut` unless `cancel` fires first.
pub(crate) async fn cancellable<F>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, PipelineError>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PipelineError::Cancelled),
        out = fut => Ok(out),
    }
}
