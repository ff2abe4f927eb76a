//! Time-ordered identifiers for messages and threads.
//!
//! Both wrap a UUIDv7: globally unique, and the canonical string form sorts
//! lexicographically in creation order.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

macro_rules! time_ordered_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new time-sortable identifier.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creation time encoded in the identifier.
            pub fn created_at(&self) -> Option<DateTime<Utc>> {
                let (secs, nanos) = self.0.get_timestamp()?.to_unix();
                DateTime::from_timestamp(secs as i64, nanos)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::parse_str(s.trim())
                    .map_err(|_| ValidationError::InvalidId(s.to_string()))?;
                if uuid.get_version_num() != 7 {
                    return Err(ValidationError::InvalidId(s.to_string()));
                }
                Ok(Self(uuid))
            }
        }
    };
}

time_ordered_id!(
    /// Identity of a single inbound message.
    MessageId
);

time_ordered_id!(
    /// Identity of a logical conversation thread.
    ThreadId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = MessageId::new();
        let b = MessageId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn ids_sort_by_creation_time() {
        let first = ThreadId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = ThreadId::new();
        assert!(first < second);
        assert!(first.to_string() < second.to_string());
    }

    #[test]
    fn parse_roundtrip() {
        let id = MessageId::new();
        let parsed: MessageId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_rejects_garbage_and_other_versions() {
        assert!("not-an-id".parse::<ThreadId>().is_err());
        let v4 = Uuid::new_v4().to_string();
        assert!(v4.parse::<ThreadId>().is_err());
    }

    #[test]
    fn created_at_is_recent() {
        let id = MessageId::new();
        let ts = id.created_at().unwrap();
        let age = Utc::now().signed_duration_since(ts);
        assert!(age.num_seconds() < 5);
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = ThreadId::new();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));
    }
}
