//! Thread correlation: maps transport conversation markers to thread ids.
//!
//! Every `resolve` runs its lookup and insert inside a single mutex
//! critical section, so concurrent callers racing on the same marker always
//! observe one allocation. The table is bounded: least-recently-seen markers
//! are evicted past `capacity`, and idle markers are swept after `ttl`.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::ThreadId;

/// Default maximum number of tracked markers.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Default idle lifetime of a marker.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// A thread and the marker that opened it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedThread {
    pub thread_id: ThreadId,
    /// Root marker of the thread. For a provisional thread this is the
    /// unseen parent's marker.
    pub root_marker: String,
}

#[derive(Debug)]
struct Entry {
    thread: ResolvedThread,
    last_seen: Instant,
    tick: u64,
}

/// Marker table plus a recency index (tick → marker) for LRU eviction.
#[derive(Debug, Default)]
struct Table {
    entries: HashMap<String, Entry>,
    recency: BTreeMap<u64, String>,
    next_tick: u64,
}

impl Table {
    fn bump(&mut self) -> u64 {
        let tick = self.next_tick;
        self.next_tick += 1;
        tick
    }

    /// Look up a marker and refresh its recency.
    fn touch(&mut self, marker: &str, now: Instant) -> Option<ResolvedThread> {
        let tick = self.bump();
        let entry = self.entries.get_mut(marker)?;
        self.recency.remove(&entry.tick);
        entry.tick = tick;
        entry.last_seen = now;
        self.recency.insert(tick, marker.to_string());
        Some(entry.thread.clone())
    }

    fn insert(&mut self, marker: &str, thread: ResolvedThread, now: Instant) {
        let tick = self.bump();
        let previous = self.entries.insert(
            marker.to_string(),
            Entry {
                thread,
                last_seen: now,
                tick,
            },
        );
        if let Some(previous) = previous {
            self.recency.remove(&previous.tick);
        }
        self.recency.insert(tick, marker.to_string());
    }

    fn evict_to(&mut self, capacity: usize) -> usize {
        let mut evicted = 0;
        while self.entries.len() > capacity {
            let Some((_, marker)) = self.recency.pop_first() else {
                break;
            };
            self.entries.remove(&marker);
            evicted += 1;
        }
        evicted
    }
}

/// Concurrency-safe marker → thread id registry.
#[derive(Debug)]
pub struct ThreadCorrelator {
    table: Mutex<Table>,
    capacity: usize,
    ttl: Option<Duration>,
}

impl ThreadCorrelator {
    /// Create a correlator. A `capacity` of zero is treated as one.
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            table: Mutex::new(Table::default()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        // Every mutation leaves the table consistent, so a poisoned lock is
        // still safe to use.
        self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Assign a thread id to an event.
    ///
    /// - No parent: reuse the marker's id if known, else start a new thread.
    /// - Known parent: join the parent's thread and register `marker` too, so
    ///   replies to this reply resolve the same way.
    /// - Unknown parent (root not seen yet): start a provisional thread keyed
    ///   by the parent marker and register both markers under it.
    pub fn resolve(&self, marker: &str, parent_marker: Option<&str>) -> ThreadId {
        self.resolve_thread(marker, parent_marker).thread_id
    }

    /// Like [`resolve`](Self::resolve), also returning the thread's root
    /// marker.
    pub fn resolve_thread(&self, marker: &str, parent_marker: Option<&str>) -> ResolvedThread {
        let now = Instant::now();
        let mut table = self.lock();

        let thread = match parent_marker {
            None => match table.touch(marker, now) {
                Some(thread) => thread,
                None => {
                    let thread = ResolvedThread {
                        thread_id: ThreadId::new(),
                        root_marker: marker.to_string(),
                    };
                    table.insert(marker, thread.clone(), now);
                    debug!(marker, thread_id = %thread.thread_id, "New thread");
                    thread
                }
            },
            Some(parent) => {
                let thread = match table.touch(parent, now) {
                    Some(thread) => thread,
                    None => {
                        let thread = ResolvedThread {
                            thread_id: ThreadId::new(),
                            root_marker: parent.to_string(),
                        };
                        table.insert(parent, thread.clone(), now);
                        debug!(
                            marker,
                            parent,
                            thread_id = %thread.thread_id,
                            "Parent not seen yet, starting provisional thread"
                        );
                        thread
                    }
                };
                if table.touch(marker, now).is_none() {
                    table.insert(marker, thread.clone(), now);
                }
                thread
            }
        };

        let evicted = table.evict_to(self.capacity);
        if evicted > 0 {
            debug!(evicted, "Evicted least-recently-seen thread markers");
        }

        thread
    }

    /// Current thread id for a marker, without registering anything.
    pub fn lookup(&self, marker: &str) -> Option<ThreadId> {
        self.lock().entries.get(marker).map(|e| e.thread.thread_id)
    }

    /// Remove markers idle for longer than the TTL. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };
        let now = Instant::now();
        let mut table = self.lock();
        let Table {
            entries, recency, ..
        } = &mut *table;

        let before = entries.len();
        entries.retain(|_, entry| {
            let keep = now.duration_since(entry.last_seen) <= ttl;
            if !keep {
                recency.remove(&entry.tick);
            }
            keep
        });
        let removed = before - entries.len();

        if removed > 0 {
            info!(removed, remaining = entries.len(), "Swept idle thread markers");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ThreadCorrelator {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, Some(DEFAULT_TTL))
    }
}

/// Spawn a background task that periodically sweeps idle markers until
/// `shutdown` is cancelled.
pub fn spawn_sweep_task(
    correlator: Arc<ThreadCorrelator>,
    every: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await; // Skip immediate first tick
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("Thread marker sweep stopped");
                    return;
                }
                _ = interval.tick() => {
                    correlator.sweep_expired();
                }
            }
        }
    })
}
