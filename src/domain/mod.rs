//! Domain value objects. Pure validation, no I/O.

pub mod analysis;
pub mod id;
pub mod message;
pub mod reference;
pub mod types;

pub use analysis::{AnalysisResult, HIGH_CONFIDENCE_THRESHOLD};
pub use id::{MessageId, ThreadId};
pub use message::{MAX_CONTENT_LENGTH, Message, MessageContent};
pub use reference::{Reference, ReferenceType};
pub use types::{Category, MessageType};
