//! Quill: turns team chat into documentation.
//!
//! Chat events are correlated into threads, classified by an oracle and
//! routed by type: ideas, decisions, status updates and shared information
//! become stored documents with a confirmation reply; unclassified messages
//! may get tag suggestions.

pub mod channels;
pub mod config;
pub mod correlation;
pub mod domain;
pub mod error;
pub mod llm;
pub mod oracle;
pub mod pipeline;
pub mod shutdown;
pub mod store;
pub mod worker;
