use std::path::PathBuf;
use thiserror::Error;

use crate::session::ObservationMode;

#[derive(Debug, Error)]
pub enum SeymourError {
    #[error("Invalid hex code: '{input}' - must be 6 characters (0-9, A-F)")]
    InvalidHex { input: String },

    #[error("Invalid word pattern: '{pattern}' - {reason}")]
    InvalidWordPattern { pattern: String, reason: String },

    #[error("Custom color not found: {name}")]
    CustomColorNotFound { name: String },

    #[error("Word not found: {word}")]
    WordNotFound { word: String },

    #[error("Record not found: {id}")]
    RecordNotFound { id: String },

    #[error("Cannot start {requested} while {active} is active")]
    ModeConflict {
        active: ObservationMode,
        requested: ObservationMode,
    },

    #[error("Invalid priority order: {message}")]
    InvalidPriorityOrder { message: String },

    #[error("Catalog parse error: {message}")]
    CatalogParse { message: String },

    #[error("Config parse error in {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Config key not found: {key}")]
    ConfigKeyNotFound { key: String },

    #[error("Invalid config value for {key}: {message}")]
    ConfigValue { key: String, message: String },

    #[error("Failed to save collection: {message}")]
    PersistFailed { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Home directory not found")]
    HomeNotFound,
}

pub type Result<T> = std::result::Result<T, SeymourError>;

impl SeymourError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidHex { .. } | Self::InvalidWordPattern { .. } => 2,
            Self::CustomColorNotFound { .. }
            | Self::WordNotFound { .. }
            | Self::RecordNotFound { .. } => 3,
            Self::ModeConflict { .. } => 4,
            Self::ConfigParse { .. }
            | Self::ConfigKeyNotFound { .. }
            | Self::ConfigValue { .. }
            | Self::InvalidPriorityOrder { .. } => 5,
            Self::CatalogParse { .. } => 6,
            _ => 1,
        }
    }
}
