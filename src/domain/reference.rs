//! Typed links from a message to another message or a stored document.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Kind of entity a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    Message,
    Document,
    Unknown,
}

impl ReferenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Document => "document",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.trim().to_lowercase().as_str() {
            "message" => Ok(Self::Message),
            "document" => Ok(Self::Document),
            "unknown" => Ok(Self::Unknown),
            _ => Err(ValidationError::InvalidReferenceType(s.to_string())),
        }
    }
}

impl fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable reference value object. Equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Reference {
    #[serde(rename = "type")]
    ref_type: ReferenceType,
    value: String,
}

impl Reference {
    /// Build a reference; the value is trimmed and must be non-empty.
    pub fn new(ref_type: ReferenceType, value: impl AsRef<str>) -> Result<Self, ValidationError> {
        let value = value.as_ref().trim();
        if value.is_empty() {
            return Err(ValidationError::EmptyReferenceValue);
        }
        Ok(Self {
            ref_type,
            value: value.to_string(),
        })
    }

    pub fn message(message_id: impl AsRef<str>) -> Result<Self, ValidationError> {
        Self::new(ReferenceType::Message, message_id)
    }

    pub fn document(path: impl AsRef<str>) -> Result<Self, ValidationError> {
        Self::new(ReferenceType::Document, path)
    }

    pub fn ref_type(&self) -> ReferenceType {
        self.ref_type
    }

    /// Message id or document path.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ref_type, self.value)
    }
}

/// Parses the `type:value` form produced by `Display`.
impl FromStr for Reference {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, value) = s
            .split_once(':')
            .ok_or_else(|| ValidationError::InvalidReferenceFormat(s.to_string()))?;
        Self::new(ReferenceType::parse(kind)?, value)
    }
}
