//! CLI channel: stdin/stdout transport for local testing.
//!
//! Each non-empty line is one event with a generated marker (`cli-1`,
//! `cli-2`, ...). A line of the form `re:<marker> text` is a reply to
//! `<marker>`.
//!
//! Stdin is read on a dedicated OS thread: a blocked read there never holds
//! up runtime shutdown, and the thread ends with the process.

use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use futures::stream;
use tokio::sync::mpsc::UnboundedSender;

use crate::channels::{Channel, EventStream, InboundEvent};
use crate::error::ChannelError;

const REPLY_PREFIX: &str = "re:";

/// A simple CLI channel that reads from stdin and writes to stdout.
pub struct CliChannel {
    sender: String,
    counter: Arc<AtomicU64>,
}

impl CliChannel {
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            counter: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new("local-user")
    }
}

/// Turn one input line into an event, or `None` for blank input.
pub fn parse_line(line: &str, marker: String, sender: &str) -> Option<InboundEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(rest) = line.strip_prefix(REPLY_PREFIX) {
        let (parent, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        if !parent.is_empty() {
            return Some(InboundEvent::new(marker, sender, text.trim()).in_reply_to(parent));
        }
    }

    Some(InboundEvent::new(marker, sender, line))
}

/// Forward events parsed from `reader` until EOF, a read error, or the
/// receiving side going away.
fn read_events(
    reader: impl BufRead,
    tx: &UnboundedSender<InboundEvent>,
    sender: &str,
    counter: &AtomicU64,
) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::error!("Error reading stdin: {}", e);
                break;
            }
        };
        let n = counter.fetch_add(1, Ordering::Relaxed) + 1;
        let marker = format!("cli-{n}");
        let Some(event) = parse_line(&line, marker.clone(), sender) else {
            continue;
        };
        eprintln!("   [{marker}] queued");
        if tx.send(event).is_err() {
            break;
        }
    }
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<EventStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let sender = self.sender.clone();
        let counter = Arc::clone(&self.counter);

        std::thread::Builder::new()
            .name("quill-stdin".into())
            .spawn(move || {
                let stdin = std::io::stdin();
                read_events(stdin.lock(), &tx, &sender, &counter);
            })
            .map_err(|e| ChannelError::StartupFailed {
                name: "cli".into(),
                reason: format!("Failed to spawn stdin reader: {e}"),
            })?;

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn send_reply(&self, target_marker: &str, text: &str) -> Result<(), ChannelError> {
        println!("\n[reply to {target_marker}]\n{text}\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_line_is_root_event() {
        let event = parse_line("  We shipped v2  ", "cli-1".into(), "me").unwrap();
        assert_eq!(event.marker, "cli-1");
        assert_eq!(event.text, "We shipped v2");
        assert!(event.parent_marker.is_none());
        assert_eq!(event.sender, "me");
    }

    #[test]
    fn reply_prefix_sets_parent() {
        let event = parse_line("re:cli-1 agreed, go ahead", "cli-2".into(), "me").unwrap();
        assert_eq!(event.parent_marker.as_deref(), Some("cli-1"));
        assert_eq!(event.text, "agreed, go ahead");
    }

    #[test]
    fn blank_line_is_skipped() {
        assert!(parse_line("   ", "cli-3".into(), "me").is_none());
    }

    #[test]
    fn reader_forwards_lines_until_eof() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let counter = AtomicU64::new(0);
        let input = std::io::Cursor::new("Ship v2 today\n\nre:cli-1 done\n");

        read_events(input, &tx, "me", &counter);

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert!(rx.try_recv().is_err());
        assert_eq!(first.marker, "cli-1");
        assert_eq!(second.marker, "cli-3");
        assert_eq!(second.parent_marker.as_deref(), Some("cli-1"));
        assert_eq!(counter.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn reader_stops_when_receiver_is_gone() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        let counter = AtomicU64::new(0);
        let input = std::io::Cursor::new("one\ntwo\nthree\n");

        read_events(input, &tx, "me", &counter);
        assert_eq!(counter.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn bare_prefix_is_plain_text() {
        let event = parse_line("re:", "cli-4".into(), "me").unwrap();
        assert!(event.parent_marker.is_none());
        assert_eq!(event.text, "re:");
    }
}
