//! Worker pool: a producer pumps the channel's event stream into a
//! bounded queue; `workers` tasks drain it through the pipeline.
//!
//! A full queue blocks the producer (backpressure). Cancelling the token
//! stops the producer, stops workers from taking new events and aborts
//! in-flight collaborator calls. When the stream ends, workers drain what
//! is queued and exit.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::StreamExt;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::channels::{EventStream, InboundEvent};
use crate::correlation::ThreadCorrelator;
use crate::error::{ConfigError, PipelineError};
use crate::pipeline::processor::MessageProcessor;
use crate::worker::ingest::{Ingested, ingest_event};

/// Default number of processing workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Default ingestion queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Pool sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub workers: usize,
    pub queue_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidValue {
                key: "QUILL_WORKERS".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "QUILL_QUEUE_CAPACITY".into(),
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Shared dependencies for every worker.
#[derive(Clone)]
pub struct WorkerDeps {
    pub correlator: Arc<ThreadCorrelator>,
    pub processor: Arc<MessageProcessor>,
}

#[derive(Default)]
struct Counters {
    received: AtomicU64,
    processed: AtomicU64,
    skipped: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
}

/// Event counts for one pool run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Events accepted into the queue.
    pub received: u64,
    /// Messages that completed the pipeline.
    pub processed: u64,
    /// Bot-authored events.
    pub skipped: u64,
    /// Events dropped as invalid.
    pub rejected: u64,
    /// Messages whose pipeline run failed or was cancelled.
    pub failed: u64,
}

impl Counters {
    fn snapshot(&self) -> PoolStats {
        PoolStats {
            received: self.received.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

type SharedReceiver = Arc<Mutex<mpsc::Receiver<InboundEvent>>>;

pub struct WorkerPool {
    deps: WorkerDeps,
    config: PoolConfig,
}

impl WorkerPool {
    pub fn new(deps: WorkerDeps, config: PoolConfig) -> Self {
        Self { deps, config }
    }

    /// Process `events` until the stream ends or `cancel` fires, then join
    /// every task.
    pub async fn run(&self, events: EventStream, cancel: CancellationToken) -> PoolStats {
        let (tx, rx) = mpsc::channel(self.config.queue_capacity.max(1));
        let rx: SharedReceiver = Arc::new(Mutex::new(rx));
        let counters = Arc::new(Counters::default());

        info!(
            workers = self.config.workers,
            queue_capacity = self.config.queue_capacity,
            "Worker pool starting"
        );

        let producer = tokio::spawn(pump_events(
            events,
            tx,
            cancel.clone(),
            Arc::clone(&counters),
        ));

        let workers: Vec<JoinHandle<()>> = (0..self.config.workers.max(1))
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    Arc::clone(&rx),
                    self.deps.clone(),
                    cancel.clone(),
                    Arc::clone(&counters),
                ))
            })
            .collect();

        if let Err(e) = producer.await {
            error!(error = %e, "Producer task panicked");
        }
        for handle in workers {
            if let Err(e) = handle.await {
                error!(error = %e, "Worker task panicked");
            }
        }

        let stats = counters.snapshot();
        info!(
            received = stats.received,
            processed = stats.processed,
            skipped = stats.skipped,
            rejected = stats.rejected,
            failed = stats.failed,
            "Worker pool stopped"
        );
        stats
    }
}

/// Forward events into the queue. Dropping `tx` on exit lets workers
/// drain and stop.
async fn pump_events(
    mut events: EventStream,
    tx: mpsc::Sender<InboundEvent>,
    cancel: CancellationToken,
    counters: Arc<Counters>,
) {
    loop {
        let event = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = events.next() => match next {
                Some(event) => event,
                None => {
                    debug!("Event stream ended");
                    break;
                }
            },
        };

        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            sent = tx.send(event) => sent,
        };
        if sent.is_err() {
            break;
        }
        counters.received.fetch_add(1, Ordering::Relaxed);
    }
}

async fn worker_loop(
    worker_id: usize,
    rx: SharedReceiver,
    deps: WorkerDeps,
    cancel: CancellationToken,
    counters: Arc<Counters>,
) {
    debug!(worker_id, "Worker started");

    loop {
        let next = {
            let mut rx = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                guard = rx.lock() => guard,
            };
            tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                event = rx.recv() => event,
            }
        };
        let Some(event) = next else {
            break;
        };

        handle_event(worker_id, &deps, event, &cancel, &counters).await;
    }

    debug!(worker_id, "Worker stopped");
}

async fn handle_event(
    worker_id: usize,
    deps: &WorkerDeps,
    event: InboundEvent,
    cancel: &CancellationToken,
    counters: &Counters,
) {
    let mut message = match ingest_event(&deps.correlator, &event) {
        Ok(Ingested::Message(message)) => message,
        Ok(Ingested::SkippedBot) => {
            counters.skipped.fetch_add(1, Ordering::Relaxed);
            return;
        }
        Err(e) => {
            warn!(marker = %event.marker, error = %e, "Dropping invalid event");
            counters.rejected.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };

    match deps.processor.process(&mut message, cancel).await {
        Ok(processed) => {
            counters.processed.fetch_add(1, Ordering::Relaxed);
            debug!(
                worker_id,
                id = %processed.message.id(),
                documented = processed.outcome.document_path.is_some(),
                "Message processed"
            );
        }
        Err(PipelineError::Cancelled) => {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            info!(worker_id, id = %message.id(), "Processing cancelled by shutdown");
        }
        Err(e) => {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            error!(
                worker_id,
                id = %message.id(),
                thread_id = %message.thread_id(),
                error = %e,
                "Failed to process message"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PoolConfig::default();
        assert_eq!(config.workers, 4);
        assert_eq!(config.queue_capacity, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let no_workers = PoolConfig {
            workers: 0,
            ..Default::default()
        };
        let no_queue = PoolConfig {
            queue_capacity: 0,
            ..Default::default()
        };
        assert!(no_workers.validate().is_err());
        assert!(no_queue.validate().is_err());
    }
}
