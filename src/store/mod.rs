//! Persistence layer: document storage backends.

pub mod fs;

pub use fs::FsDocumentStore;
