use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::color;
use crate::error::{Result, SeymourError};
use crate::pattern::WordList;
use crate::ranker::{MatchPolicy, PriorityOrder};

const CONFIG_FILE: &str = "config.toml";
const DATA_FILE: &str = "data.toml";

/// Default config template with rich comments
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# seymour configuration file
# Location: ~/.seymour/config.toml

[analysis]
# Attach word matches from data.toml to scanned pieces
words = true
# Detect special hex patterns (paired, repeating, palindrome, axbxcx)
patterns = true
# Report pieces sharing a hex code
dupes = true

[filters]
# Match against your own colors from data.toml
custom_colors = true
# Match against fade dye stages
fade_dyes = true
# When false, only fade stages with deltaE <= 2.0 are considered
show_high_fades = false
# Allow "3p" set colors on helmets
three_piece_sets = false
# Only use colors meant for the piece type (generic colors always allowed)
piece_specific = false

[priority]
# Ordering of non-exact matches with tier 0-2, most preferred first.
# Must list all 8 classes exactly once.
order = [
    "custom-t1",
    "custom-t2",
    "normal-t0",
    "normal-t1",
    "fade-t0",
    "fade-t1",
    "normal-t2",
    "fade-t2",
]

[store]
# Quiet period before changes are written, in milliseconds
debounce_ms = 1000
# Relative paths are resolved against this directory
collection_file = "collection.json"
"#;

/// Global configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub priority: PriorityConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Optional analysis features
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_true")]
    pub words: bool,
    #[serde(default = "default_true")]
    pub patterns: bool,
    #[serde(default = "default_true")]
    pub dupes: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            words: true,
            patterns: true,
            dupes: true,
        }
    }
}

/// Candidate sources and filters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_true")]
    pub custom_colors: bool,
    #[serde(default = "default_true")]
    pub fade_dyes: bool,
    #[serde(default)]
    pub show_high_fades: bool,
    #[serde(default)]
    pub three_piece_sets: bool,
    #[serde(default)]
    pub piece_specific: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            custom_colors: true,
            fade_dyes: true,
            show_high_fades: false,
            three_piece_sets: false,
            piece_specific: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityConfig {
    #[serde(default)]
    pub order: PriorityOrder,
}

/// Collection persistence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_collection_file")]
    pub collection_file: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            collection_file: default_collection_file(),
        }
    }
}

impl StoreConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Collection file, resolved against `base_dir` when relative
    pub fn collection_path(&self, base_dir: &Path) -> PathBuf {
        let path = Path::new(&self.collection_file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    1000
}

fn default_collection_file() -> String {
    "collection.json".to_string()
}

impl Config {
    /// Load config from base directory
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content).map_err(|e| SeymourError::ConfigParse {
            path: path.clone(),
            message: e.to_string(),
        })?;

        Ok(config)
    }

    /// Save config to base directory
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        let content = toml::to_string_pretty(self).map_err(|e| SeymourError::ConfigParse {
            path: path.clone(),
            message: e.to_string(),
        })?;

        fs::write(&path, content)?;
        Ok(())
    }

    /// Get config file path
    pub fn path(base_dir: &Path) -> PathBuf {
        base_dir.join(CONFIG_FILE)
    }

    /// Initialize config with default template (rich comments)
    pub fn init(base_dir: &Path) -> Result<PathBuf> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        if !path.exists() {
            fs::write(&path, DEFAULT_CONFIG_TEMPLATE)?;
        }

        Ok(path)
    }

    /// Get a config value by dot-notation key
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "analysis.words" => self.analysis.words.to_string(),
            "analysis.patterns" => self.analysis.patterns.to_string(),
            "analysis.dupes" => self.analysis.dupes.to_string(),
            "filters.custom_colors" => self.filters.custom_colors.to_string(),
            "filters.fade_dyes" => self.filters.fade_dyes.to_string(),
            "filters.show_high_fades" => self.filters.show_high_fades.to_string(),
            "filters.three_piece_sets" => self.filters.three_piece_sets.to_string(),
            "filters.piece_specific" => self.filters.piece_specific.to_string(),
            "priority.order" => self.priority.order.to_string(),
            "store.debounce_ms" => self.store.debounce_ms.to_string(),
            "store.collection_file" => self.store.collection_file.clone(),
            _ => return None,
        };
        Some(value)
    }

    /// Set a config value by dot-notation key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "analysis.words" => self.analysis.words = parse_bool(key, value)?,
            "analysis.patterns" => self.analysis.patterns = parse_bool(key, value)?,
            "analysis.dupes" => self.analysis.dupes = parse_bool(key, value)?,
            "filters.custom_colors" => self.filters.custom_colors = parse_bool(key, value)?,
            "filters.fade_dyes" => self.filters.fade_dyes = parse_bool(key, value)?,
            "filters.show_high_fades" => self.filters.show_high_fades = parse_bool(key, value)?,
            "filters.three_piece_sets" => self.filters.three_piece_sets = parse_bool(key, value)?,
            "filters.piece_specific" => self.filters.piece_specific = parse_bool(key, value)?,
            "priority.order" => self.priority.order = PriorityOrder::parse_list(value)?,
            "store.debounce_ms" => {
                self.store.debounce_ms =
                    value
                        .trim()
                        .parse()
                        .map_err(|e: std::num::ParseIntError| SeymourError::ConfigValue {
                            key: key.to_string(),
                            message: e.to_string(),
                        })?
            }
            "store.collection_file" => {
                let file = value.trim();
                if file.is_empty() {
                    return Err(SeymourError::ConfigValue {
                        key: key.to_string(),
                        message: "must not be empty".to_string(),
                    });
                }
                self.store.collection_file = file.to_string();
            }
            _ => {
                return Err(SeymourError::ConfigKeyNotFound {
                    key: key.to_string(),
                })
            }
        }
        Ok(())
    }

    /// List all config keys with their current values
    pub fn list(&self) -> Vec<(String, String)> {
        Self::KEYS
            .iter()
            .filter_map(|key| self.get(key).map(|value| (key.to_string(), value)))
            .collect()
    }

    pub const KEYS: &'static [&'static str] = &[
        "analysis.words",
        "analysis.patterns",
        "analysis.dupes",
        "filters.custom_colors",
        "filters.fade_dyes",
        "filters.show_high_fades",
        "filters.three_piece_sets",
        "filters.piece_specific",
        "priority.order",
        "store.debounce_ms",
        "store.collection_file",
    ];

    /// Snapshot of the ranking policy for one classification pass
    pub fn match_policy(&self) -> MatchPolicy {
        MatchPolicy {
            custom_colors: self.filters.custom_colors,
            target_colors: true,
            fade_dyes: self.filters.fade_dyes,
            piece_specific: self.filters.piece_specific,
            three_piece_sets: self.filters.three_piece_sets,
            show_high_fades: self.filters.show_high_fades,
            priority: self.priority.order.clone(),
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        other => Err(SeymourError::ConfigValue {
            key: key.to_string(),
            message: format!("expected true or false, got '{}'", other),
        }),
    }
}

// ============================================================================
// User data (custom colors and words)
// ============================================================================

/// User-maintained tables stored in `data.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    #[serde(default)]
    pub custom_colors: IndexMap<String, String>,
    #[serde(default)]
    pub words: WordList,
}

impl UserData {
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = Self::path(base_dir);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        toml::from_str(&content).map_err(|e| SeymourError::ConfigParse {
            path,
            message: e.to_string(),
        })
    }

    pub fn save(&self, base_dir: &Path) -> Result<()> {
        fs::create_dir_all(base_dir)?;
        let content = toml::to_string_pretty(self)?;
        fs::write(Self::path(base_dir), content)?;
        Ok(())
    }

    pub fn path(base_dir: &Path) -> PathBuf {
        base_dir.join(DATA_FILE)
    }

    /// Add or replace a custom color. Returns the previous hex, if any.
    pub fn add_color(&mut self, name: &str, hex: &str) -> Result<Option<String>> {
        let normalized = color::normalize_hex(hex).ok_or_else(|| SeymourError::InvalidHex {
            input: hex.to_string(),
        })?;
        Ok(self.custom_colors.insert(name.trim().to_string(), normalized))
    }

    /// Remove a custom color. Returns its hex.
    pub fn remove_color(&mut self, name: &str) -> Result<String> {
        self.custom_colors
            .shift_remove(name.trim())
            .ok_or_else(|| SeymourError::CustomColorNotFound {
                name: name.trim().to_string(),
            })
    }
}
