//! Message type and category enums.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// What a message is, as decided by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Idea,
    Decision,
    Status,
    /// Legacy "general information" type from the older analysis model.
    Information,
    Unknown,
}

impl MessageType {
    pub const ALL: [MessageType; 5] = [
        Self::Idea,
        Self::Decision,
        Self::Status,
        Self::Information,
        Self::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idea => "idea",
            Self::Decision => "decision",
            Self::Status => "status",
            Self::Information => "information",
            Self::Unknown => "unknown",
        }
    }

    /// Case-insensitive parse. Unrecognized input is an error.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| ValidationError::InvalidMessageType(s.to_string()))
    }

    /// Parse, falling back to `Unknown` for anything unrecognized.
    pub fn parse_lenient(s: &str) -> Self {
        Self::parse(s).unwrap_or(Self::Unknown)
    }

    /// Whether messages of this type produce a stored document.
    pub fn is_documented(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Project area a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Operations,
    Development,
    Product,
    QualityAssurance,
    DataAnalysis,
    Other,
    Unknown,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Self::Operations,
        Self::Development,
        Self::Product,
        Self::QualityAssurance,
        Self::DataAnalysis,
        Self::Other,
        Self::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Operations => "operations",
            Self::Development => "development",
            Self::Product => "product",
            Self::QualityAssurance => "quality_assurance",
            Self::DataAnalysis => "data_analysis",
            Self::Other => "other",
            Self::Unknown => "unknown",
        }
    }

    /// Case-insensitive parse. Hyphenated spellings (`quality-assurance`)
    /// from the older project settings format are accepted.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| ValidationError::InvalidCategory(s.to_string()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
