//! Classification oracle output.

use serde::Serialize;

use crate::domain::{Category, MessageType, Reference};
use crate::error::ValidationError;

/// Confidence at or above which an analysis counts as high confidence.
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.8;

/// Result of analysing one message's text.
///
/// `category` is `None` when the oracle answered with a value outside the
/// known set; the merge step then keeps the message's prior category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    message_type: MessageType,
    category: Option<Category>,
    confidence: f64,
    suggested_tags: Vec<String>,
    references: Vec<Reference>,
}

impl AnalysisResult {
    /// Fails unless `confidence` lies in the closed interval [0, 1].
    pub fn new(
        message_type: MessageType,
        category: Option<Category>,
        confidence: f64,
        suggested_tags: Vec<String>,
    ) -> Result<Self, ValidationError> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(ValidationError::ConfidenceOutOfRange(confidence));
        }
        Ok(Self {
            message_type,
            category,
            confidence,
            suggested_tags,
            references: Vec::new(),
        })
    }

    pub fn with_references(mut self, references: Vec<Reference>) -> Self {
        self.references = references;
        self
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn suggested_tags(&self) -> &[String] {
        &self.suggested_tags
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub fn is_high_confidence(&self) -> bool {
        self.confidence >= HIGH_CONFIDENCE_THRESHOLD
    }

    pub fn has_suggested_tags(&self) -> bool {
        !self.suggested_tags.is_empty()
    }

    pub fn has_references(&self) -> bool {
        !self.references.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(confidence: f64) -> Result<AnalysisResult, ValidationError> {
        AnalysisResult::new(
            MessageType::Idea,
            Some(Category::Product),
            confidence,
            vec![],
        )
    }

    #[test]
    fn boundaries_are_accepted() {
        assert!(analysis(0.0).is_ok());
        assert!(analysis(1.0).is_ok());
        assert!(analysis(0.5).is_ok());
    }

    #[test]
    fn out_of_range_is_rejected() {
        for bad in [-0.01, 1.01, -1.0, 42.0, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(analysis(bad), Err(ValidationError::ConfidenceOutOfRange(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn high_confidence_threshold_is_inclusive() {
        assert!(analysis(0.8).unwrap().is_high_confidence());
        assert!(!analysis(0.79).unwrap().is_high_confidence());
    }

    #[test]
    fn references_attach() {
        let refs = vec![Reference::message("M1").unwrap()];
        let a = analysis(0.9).unwrap().with_references(refs.clone());
        assert!(a.has_references());
        assert_eq!(a.references(), refs.as_slice());
    }
}
