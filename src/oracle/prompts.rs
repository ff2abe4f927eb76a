//! Prompt templates for the LLM-backed oracle.

use crate::pipeline::types::DocMetadata;

pub(crate) const ANALYZE_SYSTEM_PROMPT: &str = r#"You analyze chat messages for a team knowledge base. Classify the message and answer with a single JSON object:
{
  "Type": "idea" | "decision" | "status" | "information" | "unknown",
  "Category": "operations" | "development" | "product" | "quality_assurance" | "data_analysis" | "other" | "unknown",
  "ConfidenceScore": number between 0 and 1,
  "SuggestedTags": ["tag", ...]
}

Types:
- idea: a proposal or suggestion
- decision: something that was agreed or decided
- status: progress on ongoing work
- information: knowledge shared for reference
- unknown: none of the above

Categories:
- operations: processes, infrastructure, logistics
- development: code and technical implementation
- product: features, design, roadmap
- quality_assurance: testing, quality, bugs
- data_analysis: data, analytics, insights
- other: anything else
- unknown: cannot tell

SuggestedTags are short lowercase keywords without the leading '#'. Respond with the JSON object only."#;

pub(crate) const DOCUMENTATION_SYSTEM_PROMPT: &str = r#"You write documentation for a team knowledge base from a single chat message.

Write clear, neutral Markdown with headings. Keep every fact from the message and add nothing that is not in it.

Structure by type:
- idea: background, proposal, expected benefits, open questions
- decision: context, decision, rationale, consequences
- status: progress, blockers, next steps
- information: key points and why they matter"#;

pub(crate) const REFERENCES_SYSTEM_PROMPT: &str = r#"You find references in chat messages. A reference points either to another message (by id or timestamp) or to a document (by path, file name or link).

Answer with a JSON array of objects with "type" and "value":
[
  {"type": "message", "value": "<message id>"},
  {"type": "document", "value": "<path or link>"}
]

Answer [] when there are none."#;

/// User prompt for the documentation generator.
pub(crate) fn documentation_prompt(text: &str, metadata: &DocMetadata) -> String {
    let mut prompt = format!("Write documentation for this message:\n\n{text}\n\nContext:\n");
    prompt.push_str(&format!("- Type: {}\n", metadata.message_type));
    prompt.push_str(&format!("- Category: {}\n", metadata.category));
    prompt.push_str(&format!("- Author: {}\n", metadata.sender));
    prompt.push_str(&format!("- Created: {}\n", metadata.created_at.to_rfc3339()));
    if !metadata.references.is_empty() {
        prompt.push_str("- References:\n");
        for reference in &metadata.references {
            prompt.push_str(&format!(
                "  - {}: {}\n",
                reference.ref_type(),
                reference.value()
            ));
        }
    }
    prompt.push_str("\nAnswer with the Markdown document only.");
    prompt
}
