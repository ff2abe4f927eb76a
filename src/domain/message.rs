//! Message content and the message entity.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Category, MessageId, MessageType, Reference, ThreadId};
use crate::error::ValidationError;

/// Maximum content length in characters. Longer text is truncated.
pub const MAX_CONTENT_LENGTH: usize = 10_000;

/// Trimmed, non-empty, length-capped message text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MessageContent(String);

impl MessageContent {
    pub fn new(text: &str) -> Result<Self, ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyContent);
        }
        let text = match text.char_indices().nth(MAX_CONTENT_LENGTH) {
            Some((cut, _)) => &text[..cut],
            None => text,
        };
        Ok(Self(text.to_string()))
    }

    pub fn text(&self) -> &str {
        &self.0
    }

    pub fn contains_url(&self) -> bool {
        self.0.contains("http://") || self.0.contains("https://")
    }

    pub fn word_count(&self) -> usize {
        self.0.split_whitespace().count()
    }

    /// Whether the text carries `#tag`.
    pub fn contains_tag(&self, tag: &str) -> bool {
        self.0.contains(&format!("#{tag}"))
    }
}

/// A chat message owned by the pipeline while it is processed.
///
/// Type, category and references start out unclassified and are filled in
/// place by the classification merge.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    id: MessageId,
    thread_id: ThreadId,
    sender: String,
    content: MessageContent,
    message_type: MessageType,
    category: Category,
    references: Vec<Reference>,
    created_at: DateTime<Utc>,
    reply_marker: String,
}

impl Message {
    /// Create an unclassified message.
    ///
    /// `reply_marker` is the transport's conversation marker that replies
    /// about this message are addressed to.
    pub fn new(
        thread_id: ThreadId,
        sender: &str,
        content: MessageContent,
        reply_marker: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let sender = sender.trim();
        if sender.is_empty() {
            return Err(ValidationError::EmptySender);
        }
        Ok(Self {
            id: MessageId::new(),
            thread_id,
            sender: sender.to_string(),
            content,
            message_type: MessageType::Unknown,
            category: Category::Unknown,
            references: Vec::new(),
            created_at: Utc::now(),
            reply_marker: reply_marker.into(),
        })
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn content(&self) -> &MessageContent {
        &self.content
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub fn has_references(&self) -> bool {
        !self.references.is_empty()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn reply_marker(&self) -> &str {
        &self.reply_marker
    }

    /// Append a reference. Duplicates are kept.
    pub fn add_reference(&mut self, reference: Reference) {
        self.references.push(reference);
    }

    pub fn set_category(&mut self, category: Category) {
        self.category = category;
    }

    pub fn set_message_type(&mut self, message_type: MessageType) {
        self.message_type = message_type;
    }
}
