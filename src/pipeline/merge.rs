//! Classification merge: folds an analysis result into a message.

use tracing::debug;

use crate::domain::{AnalysisResult, Message, MessageType};
use crate::error::OracleError;
use crate::pipeline::types::ReferenceOracle;

/// How an analysis' suggested tags are treated when routing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TagDisposition {
    /// Not applicable: classified type, or no tags suggested.
    #[default]
    None,
    /// Unclassified but confident: offer these tags to the user.
    Surface(Vec<String>),
    /// Unclassified and low confidence: kept for logging only.
    LowConfidence(Vec<String>),
}

impl TagDisposition {
    pub fn for_analysis(analysis: &AnalysisResult) -> Self {
        if analysis.message_type() != MessageType::Unknown || !analysis.has_suggested_tags() {
            return Self::None;
        }
        let tags = analysis.suggested_tags().to_vec();
        if analysis.is_high_confidence() {
            Self::Surface(tags)
        } else {
            Self::LowConfidence(tags)
        }
    }
}

/// Result of merging one analysis.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MergeOutcome {
    /// The analysis category was outside the known set and was dropped.
    pub category_dropped: bool,
    /// Number of references appended from the analysis.
    pub references_added: usize,
}

/// Fold `analysis` into `message`.
///
/// The classified type becomes the message's type. The category is taken
/// only when recognized; otherwise the prior category stays. Analysis
/// references are appended without deduplication.
pub fn apply_analysis(message: &mut Message, analysis: &AnalysisResult) -> MergeOutcome {
    message.set_message_type(analysis.message_type());

    let category_dropped = match analysis.category() {
        Some(category) => {
            message.set_category(category);
            false
        }
        None => {
            debug!(
                id = %message.id(),
                kept = %message.category(),
                "Unrecognized analysis category, keeping prior category"
            );
            true
        }
    };

    for reference in analysis.references() {
        message.add_reference(reference.clone());
    }

    MergeOutcome {
        category_dropped,
        references_added: analysis.references().len(),
    }
}

/// Ask the reference oracle for references when the message has none.
///
/// Never overwrites existing references. Returns how many were added; a
/// failing oracle is an error for the caller.
pub async fn detect_references_if_absent(
    message: &mut Message,
    oracle: &dyn ReferenceOracle,
) -> Result<usize, OracleError> {
    if message.has_references() {
        return Ok(0);
    }

    let found = oracle.detect_references(message.content().text()).await?;
    let count = found.len();
    for reference in found {
        message.add_reference(reference);
    }

    debug!(id = %message.id(), count, "Reference detection complete");
    Ok(count)
}
