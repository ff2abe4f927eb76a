//! Parsing of oracle responses: JSON first, `key: value` lines as fallback.

use serde::Deserialize;
use tracing::debug;

use crate::domain::{AnalysisResult, Category, MessageType, Reference, ReferenceType};
use crate::error::OracleError;

/// Confidence assumed when a plain-text answer does not state one.
const TEXT_FALLBACK_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    #[serde(rename = "Type", alias = "type", default)]
    message_type: String,
    #[serde(rename = "Category", alias = "category", default)]
    category: String,
    #[serde(
        rename = "ConfidenceScore",
        alias = "confidence_score",
        alias = "confidence",
        default
    )]
    confidence: f64,
    #[serde(
        rename = "SuggestedTags",
        alias = "suggested_tags",
        alias = "tags",
        default
    )]
    suggested_tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawReference {
    #[serde(rename = "type", alias = "Type", default)]
    ref_type: String,
    #[serde(alias = "Value", default)]
    value: String,
}

/// Parse a classification answer.
///
/// An unrecognized type reads as `unknown`; an unrecognized category is
/// reported as `None`. A confidence outside [0, 1] is an error.
pub fn parse_analysis(raw: &str) -> Result<AnalysisResult, OracleError> {
    let json = extract_json_object(raw);
    let parsed = match serde_json::from_str::<RawAnalysis>(&json) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!(error = %e, "Analysis is not JSON, reading key/value lines");
            analysis_from_text(raw)
        }
    };

    let category = match Category::parse(&parsed.category) {
        Ok(category) => Some(category),
        Err(_) => {
            debug!(category = %parsed.category, "Unrecognized category in analysis");
            None
        }
    };

    Ok(AnalysisResult::new(
        MessageType::parse_lenient(&parsed.message_type),
        category,
        parsed.confidence,
        clean_tags(parsed.suggested_tags),
    )?)
}

/// Parse a reference-detection answer. Entries with an unknown type or an
/// empty value are skipped.
pub fn parse_references(raw: &str) -> Vec<Reference> {
    let json = extract_json_array(raw);
    match serde_json::from_str::<Vec<RawReference>>(&json) {
        Ok(entries) => entries
            .into_iter()
            .filter_map(|entry| {
                let ref_type = ReferenceType::parse(&entry.ref_type).ok()?;
                Reference::new(ref_type, &entry.value).ok()
            })
            .collect(),
        Err(e) => {
            debug!(error = %e, "References are not JSON, reading key/value lines");
            references_from_text(raw)
        }
    }
}

fn analysis_from_text(text: &str) -> RawAnalysis {
    let mut analysis = RawAnalysis {
        message_type: MessageType::Unknown.as_str().to_string(),
        category: Category::Unknown.as_str().to_string(),
        confidence: TEXT_FALLBACK_CONFIDENCE,
        suggested_tags: Vec::new(),
    };

    for (key, value) in key_value_lines(text) {
        match key.as_str() {
            "type" => analysis.message_type = value.to_lowercase(),
            "category" => analysis.category = value.to_lowercase(),
            "confidence" => {
                if let Ok(score) = value.parse() {
                    analysis.confidence = score;
                }
            }
            "tags" => {
                analysis.suggested_tags = value.split(',').map(str::to_string).collect();
            }
            _ => {}
        }
    }
    analysis
}

fn references_from_text(text: &str) -> Vec<Reference> {
    key_value_lines(text)
        .filter_map(|(key, value)| {
            let ref_type = match key.as_str() {
                "message" => ReferenceType::Message,
                "document" => ReferenceType::Document,
                _ => return None,
            };
            Reference::new(ref_type, value).ok()
        })
        .collect()
}

/// `key: value` pairs, one per line, with list bullets stripped and keys
/// lowercased.
fn key_value_lines(text: &str) -> impl Iterator<Item = (String, &str)> {
    text.lines().filter_map(|line| {
        let line = line.trim().trim_start_matches(['-', '*']).trim_start();
        let (key, value) = line.split_once(':')?;
        Some((key.trim().to_lowercase(), value.trim()))
    })
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|tag| tag.trim().trim_start_matches('#').trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Extract a JSON object from LLM output (handles markdown wrapping).
pub(crate) fn extract_json_object(text: &str) -> String {
    extract_json(text, '{', '}')
}

/// Extract a JSON array from LLM output (handles markdown wrapping).
pub(crate) fn extract_json_array(text: &str) -> String {
    extract_json(text, '[', ']')
}

fn extract_json(text: &str, open: char, close: char) -> String {
    let trimmed = text.trim();

    // Already bare JSON
    if trimmed.starts_with(open) {
        return trimmed.to_string();
    }

    // Wrapped in a markdown code block
    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if inner.starts_with(open) {
                return inner.to_string();
            }
        }
    }

    // Embedded in prose
    if let (Some(start), Some(end)) = (trimmed.find(open), trimmed.rfind(close))
        && end > start
    {
        return trimmed[start..=end].to_string();
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Analysis ────────────────────────────────────────────────────

    #[test]
    fn parse_json_analysis() {
        let a = parse_analysis(
            r##"{"Type":"decision","Category":"operations","ConfidenceScore":0.92,"SuggestedTags":["deploy","#infra"]}"##,
        )
        .unwrap();
        assert_eq!(a.message_type(), MessageType::Decision);
        assert_eq!(a.category(), Some(Category::Operations));
        assert_eq!(a.confidence(), 0.92);
        assert_eq!(a.suggested_tags(), ["deploy", "infra"]);
    }

    #[test]
    fn parse_analysis_wrapped_in_markdown() {
        let raw = "Here you go:\n```json\n{\"Type\": \"idea\", \"Category\": \"product\", \"ConfidenceScore\": 0.8}\n```";
        let a = parse_analysis(raw).unwrap();
        assert_eq!(a.message_type(), MessageType::Idea);
        assert_eq!(a.category(), Some(Category::Product));
    }

    #[test]
    fn parse_lowercase_keys() {
        let a = parse_analysis(r#"{"type":"status","category":"data-analysis","confidence":0.7}"#)
            .unwrap();
        assert_eq!(a.message_type(), MessageType::Status);
        assert_eq!(a.category(), Some(Category::DataAnalysis));
    }

    #[test]
    fn unrecognized_values_degrade() {
        let a = parse_analysis(r#"{"Type":"rant","Category":"marketing","ConfidenceScore":0.9}"#)
            .unwrap();
        assert_eq!(a.message_type(), MessageType::Unknown);
        assert_eq!(a.category(), None);
    }

    #[test]
    fn information_type_is_kept() {
        let a = parse_analysis(r#"{"Type":"information","Category":"other","ConfidenceScore":0.6}"#)
            .unwrap();
        assert_eq!(a.message_type(), MessageType::Information);
    }

    #[test]
    fn out_of_range_confidence_is_an_error() {
        let err = parse_analysis(r#"{"Type":"idea","Category":"product","ConfidenceScore":1.4}"#)
            .unwrap_err();
        assert!(matches!(err, OracleError::Invalid(_)));
    }

    #[test]
    fn text_fallback_reads_key_value_lines() {
        let raw = "Type: Idea\nCategory: Development\nConfidence: 0.85\nTags: api, caching, ";
        let a = parse_analysis(raw).unwrap();
        assert_eq!(a.message_type(), MessageType::Idea);
        assert_eq!(a.category(), Some(Category::Development));
        assert_eq!(a.confidence(), 0.85);
        assert_eq!(a.suggested_tags(), ["api", "caching"]);
    }

    #[test]
    fn text_fallback_defaults() {
        let a = parse_analysis("I am not sure what this is.").unwrap();
        assert_eq!(a.message_type(), MessageType::Unknown);
        assert_eq!(a.category(), Some(Category::Unknown));
        assert_eq!(a.confidence(), 0.5);
        assert!(!a.has_suggested_tags());
    }

    // ── References ──────────────────────────────────────────────────

    #[test]
    fn parse_json_references() {
        let refs = parse_references(
            r#"[{"type":"message","value":"1700.1"},{"type":"Document","value":" docs/a.md "},{"type":"ticket","value":"X-1"},{"type":"document","value":""}]"#,
        );
        assert_eq!(
            refs,
            vec![
                Reference::message("1700.1").unwrap(),
                Reference::document("docs/a.md").unwrap(),
            ]
        );
    }

    #[test]
    fn empty_array_means_no_references() {
        assert!(parse_references("[]").is_empty());
        assert!(parse_references("```json\n[]\n```").is_empty());
    }

    #[test]
    fn text_fallback_references() {
        let refs = parse_references(
            "Found these:\n- message: 1699.5\n- document: https://wiki/runbook\n- person: bob",
        );
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0], Reference::message("1699.5").unwrap());
        assert_eq!(refs[1].value(), "https://wiki/runbook");
    }

    // ── JSON extraction ─────────────────────────────────────────────

    #[test]
    fn extract_json_direct_object() {
        assert_eq!(extract_json_object(r#"  {"a":1}  "#), r#"{"a":1}"#);
    }

    #[test]
    fn extract_json_from_plain_code_block() {
        let text = "```\n{\"a\":1}\n```";
        assert_eq!(extract_json_object(text), r#"{"a":1}"#);
    }

    #[test]
    fn extract_json_embedded_in_text() {
        let text = r#"Sure! {"a": {"b": 2}} Hope that helps."#;
        assert_eq!(extract_json_object(text), r#"{"a": {"b": 2}}"#);
    }

    #[test]
    fn extract_array_embedded_in_text() {
        let text = r#"References: [{"type":"message","value":"1"}]"#;
        assert_eq!(extract_json_array(text), r#"[{"type":"message","value":"1"}]"#);
    }
}
