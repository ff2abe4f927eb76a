//! Worker system: concurrent ingestion of chat events.
//!
//! Core components:
//! - `ingest`: turns one inbound event into a correlated `Message`
//! - `pool`: bounded queue, producer task and N processing workers

pub mod ingest;
pub mod pool;

pub use ingest::{Ingested, ingest_event};
pub use pool::{PoolConfig, PoolStats, WorkerDeps, WorkerPool};
