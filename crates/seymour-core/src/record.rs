//! Classified records and the observations they are built from

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pattern::HexPattern;
use crate::ranker::{ClassificationResult, MatchCandidate};

/// Integer world coordinate where an item was seen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Location {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.x, self.y, self.z)
    }
}

/// One item as reported by an observation source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// Stable item id; a fresh one is generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub display_name: String,
    pub hex: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Observation {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        hex: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            display_name: display_name.into(),
            hex: hex.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// The observation id, or a new random one
    pub fn id_or_generate(&self) -> String {
        self.id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }
}

/// A classified item, keyed by `id` in the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub display_name: String,
    pub hex: String,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub best_match: Option<MatchCandidate>,
    #[serde(default)]
    pub top3: Option<Vec<MatchCandidate>>,
    #[serde(default)]
    pub word_match: Option<String>,
    #[serde(default)]
    pub special_pattern: Option<HexPattern>,
    pub observed_at: DateTime<Utc>,
}

impl Record {
    /// Unclassified record
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        hex: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            hex: hex.into(),
            location: None,
            best_match: None,
            top3: None,
            word_match: None,
            special_pattern: None,
            observed_at: Utc::now(),
        }
    }

    /// Replace best match and top 3 with a fresh ranking result
    pub fn apply_classification(&mut self, result: Option<ClassificationResult>) {
        match result {
            Some(result) => {
                self.best_match = Some(result.best_match);
                self.top3 = Some(result.top3);
            }
            None => {
                self.best_match = None;
                self.top3 = None;
            }
        }
    }

    /// Tier of the best match, if classified
    pub fn tier(&self) -> Option<u8> {
        self.best_match.as_ref().map(|m| m.tier)
    }
}
