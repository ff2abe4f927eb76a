//! Event intake: bot filtering, thread correlation, message construction.

use tracing::debug;

use crate::channels::InboundEvent;
use crate::correlation::ThreadCorrelator;
use crate::domain::{Message, MessageContent};
use crate::error::ValidationError;

/// What intake made of one event.
#[derive(Debug)]
pub enum Ingested {
    /// Ready for the pipeline.
    Message(Message),
    /// Authored by a bot; never processed.
    SkippedBot,
}

/// Correlate `event` and build the unclassified message for it.
///
/// Replies are addressed to the marker that opened the thread, however deep
/// the reply chain. Bot events and invalid events are turned away before
/// they touch the correlator.
pub fn ingest_event(
    correlator: &ThreadCorrelator,
    event: &InboundEvent,
) -> Result<Ingested, ValidationError> {
    if event.from_bot {
        debug!(marker = %event.marker, "Skipping bot-authored event");
        return Ok(Ingested::SkippedBot);
    }

    let content = MessageContent::new(&event.text)?;
    if event.sender.trim().is_empty() {
        return Err(ValidationError::EmptySender);
    }

    let thread = correlator.resolve_thread(&event.marker, event.parent_marker.as_deref());
    let message = Message::new(thread.thread_id, &event.sender, content, thread.root_marker)?;
    Ok(Ingested::Message(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingest(correlator: &ThreadCorrelator, event: InboundEvent) -> Message {
        match ingest_event(correlator, &event).unwrap() {
            Ingested::Message(m) => m,
            other => panic!("expected message, got {other:?}"),
        }
    }

    #[test]
    fn reply_joins_parent_thread_and_targets_root() {
        let correlator = ThreadCorrelator::default();
        let root = ingest(&correlator, InboundEvent::new("100.1", "alice", "Kickoff"));
        let reply = ingest(
            &correlator,
            InboundEvent::new("100.2", "bob", "Sounds good").in_reply_to("100.1"),
        );

        assert_eq!(root.thread_id(), reply.thread_id());
        assert_eq!(root.reply_marker(), "100.1");
        assert_eq!(reply.reply_marker(), "100.1");
    }

    #[test]
    fn bot_events_are_not_correlated() {
        let correlator = ThreadCorrelator::default();
        let event = InboundEvent::new("200.1", "quill", "📝 Captured idea").from_bot();

        assert!(matches!(
            ingest_event(&correlator, &event).unwrap(),
            Ingested::SkippedBot
        ));
        assert!(correlator.is_empty());
    }

    #[test]
    fn blank_text_is_rejected_before_correlation() {
        let correlator = ThreadCorrelator::default();
        let err = ingest_event(&correlator, &InboundEvent::new("300.1", "alice", "   "))
            .unwrap_err();
        assert_eq!(err, ValidationError::EmptyContent);
        assert!(correlator.is_empty());
    }

    #[test]
    fn blank_sender_is_rejected_before_correlation() {
        let correlator = ThreadCorrelator::default();
        let err = ingest_event(&correlator, &InboundEvent::new("400.1", " ", "hello"))
            .unwrap_err();
        assert_eq!(err, ValidationError::EmptySender);
        assert!(correlator.is_empty());

        // A later reply to the rejected marker starts its own thread.
        let reply = ingest(
            &correlator,
            InboundEvent::new("400.2", "bob", "hello?").in_reply_to("400.1"),
        );
        assert_eq!(reply.reply_marker(), "400.1");
        assert_eq!(correlator.len(), 2);
    }

    #[test]
    fn nested_reply_targets_thread_root() {
        let correlator = ThreadCorrelator::default();
        ingest(&correlator, InboundEvent::new("1", "alice", "Kickoff"));
        ingest(
            &correlator,
            InboundEvent::new("2", "bob", "Agreed").in_reply_to("1"),
        );
        let nested = ingest(
            &correlator,
            InboundEvent::new("3", "carol", "Done").in_reply_to("2"),
        );
        assert_eq!(nested.reply_marker(), "1");
    }
}
