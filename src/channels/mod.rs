//! Chat transport abstraction.

pub mod cli;

pub use cli::CliChannel;

use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::ChannelError;

/// One raw event delivered by a transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Platform-specific marker of this message (e.g. a Slack `ts`).
    pub marker: String,
    /// Marker of the message this one replies to, if any.
    pub parent_marker: Option<String>,
    /// Sender identity.
    pub sender: String,
    /// Raw text.
    pub text: String,
    /// Authored by a bot (including ourselves). Such events are skipped.
    #[serde(default)]
    pub from_bot: bool,
    /// When the transport received it.
    pub received_at: DateTime<Utc>,
}

impl InboundEvent {
    /// A root (non-reply) event received now.
    pub fn new(
        marker: impl Into<String>,
        sender: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            marker: marker.into(),
            parent_marker: None,
            sender: sender.into(),
            text: text.into(),
            from_bot: false,
            received_at: Utc::now(),
        }
    }

    pub fn in_reply_to(mut self, parent_marker: impl Into<String>) -> Self {
        self.parent_marker = Some(parent_marker.into());
        self
    }

    pub fn from_bot(mut self) -> Self {
        self.from_bot = true;
        self
    }
}

/// Stream of inbound events. Not replayable, unordered, may redeliver.
pub type EventStream = Pin<Box<dyn Stream<Item = InboundEvent> + Send>>;

/// A chat transport: inbound event stream plus outbound replies.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Channel name (e.g. "cli", "slack").
    fn name(&self) -> &str;

    /// Start receiving events.
    async fn start(&self) -> Result<EventStream, ChannelError>;

    /// Post `text` as a reply to the conversation identified by `target_marker`.
    async fn send_reply(&self, target_marker: &str, text: &str) -> Result<(), ChannelError>;
}
