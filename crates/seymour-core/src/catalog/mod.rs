//! Color catalog
//!
//! Holds the three color sources (custom, target, fade) and a memoized Lab
//! cache keyed by uppercase hex. Target and fade palettes are static after
//! construction; custom colors live in a versioned map and every change bumps
//! the version, which invalidates the cache wholesale.

pub mod loader;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::color::{self, LabColor};
use crate::error::{Result, SeymourError};

pub use loader::{load_catalog_file, load_catalog_json, CatalogData};

/// Separator between a fade family name and its stage suffix
pub const FADE_STAGE_SEPARATOR: &str = " - ";

/// Which palette a color comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSource {
    Custom,
    Target,
    Fade,
}

impl ColorSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Custom => "custom",
            Self::Target => "target",
            Self::Fade => "fade",
        }
    }
}

impl fmt::Display for ColorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named color
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorEntry {
    pub name: String,
    pub hex: String,
}

impl ColorEntry {
    pub fn new(name: impl Into<String>, hex: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hex: hex.into(),
        }
    }
}

/// Fade family base name of a fade entry (`"Aurora - Stage 3"` -> `"Aurora"`)
pub fn fade_base_name(name: &str) -> &str {
    name.split(FADE_STAGE_SEPARATOR).next().unwrap_or(name)
}

#[derive(Debug, Default)]
struct LabCache {
    version: u64,
    entries: HashMap<String, LabColor>,
}

/// Reference color catalog shared by all rankers
#[derive(Debug, Default)]
pub struct ColorCatalog {
    target: Vec<ColorEntry>,
    fade: Vec<ColorEntry>,
    fade_families: HashSet<String>,
    custom: RwLock<IndexMap<String, String>>,
    version: AtomicU64,
    lab_cache: RwLock<LabCache>,
}

impl ColorCatalog {
    /// Build a catalog from static target and fade palettes
    pub fn new(target: Vec<ColorEntry>, fade: Vec<ColorEntry>) -> Self {
        let fade_families = fade
            .iter()
            .map(|e| fade_base_name(&e.name).to_string())
            .collect();
        Self {
            target,
            fade,
            fade_families,
            ..Self::default()
        }
    }

    pub fn from_data(data: CatalogData) -> Self {
        Self::new(data.target, data.fade)
    }

    /// Replace the custom colors, e.g. after loading user data
    pub fn with_custom_colors(self, custom: IndexMap<String, String>) -> Self {
        *self.custom.write().unwrap_or_else(PoisonError::into_inner) = custom;
        self.bump_version();
        self
    }

    pub fn target_colors(&self) -> &[ColorEntry] {
        &self.target
    }

    pub fn fade_dyes(&self) -> &[ColorEntry] {
        &self.fade
    }

    /// Point-in-time copy of the custom colors, in insertion order
    pub fn custom_colors(&self) -> Vec<ColorEntry> {
        self.custom
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, hex)| ColorEntry::new(name.clone(), hex.clone()))
            .collect()
    }

    pub fn is_custom_color(&self, name: &str) -> bool {
        self.custom
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Add or replace a custom color. Returns the previous hex, if any.
    pub fn add_custom(&self, name: &str, hex: &str) -> Result<Option<String>> {
        let hex = color::normalize_hex(hex).ok_or_else(|| SeymourError::InvalidHex {
            input: hex.to_string(),
        })?;
        let previous = self
            .custom
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), hex);
        self.bump_version();
        Ok(previous)
    }

    /// Remove a custom color. Returns its hex.
    pub fn remove_custom(&self, name: &str) -> Result<String> {
        let removed = self
            .custom
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .shift_remove(name);
        match removed {
            Some(hex) => {
                self.bump_version();
                Ok(hex)
            }
            None => Err(SeymourError::CustomColorNotFound {
                name: name.to_string(),
            }),
        }
    }

    /// True if `name` belongs to a known fade family, with or without a stage suffix
    pub fn is_fade_family(&self, name: &str) -> bool {
        self.fade_families.contains(fade_base_name(name))
    }

    pub fn fade_family_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fade_families.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Current content version; changes whenever custom colors change
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Cached Lab value for a hex code, computed on first use
    pub fn lab_for(&self, hex: &str) -> LabColor {
        let key = hex.trim_start_matches('#').to_ascii_uppercase();
        let version = self.version();

        {
            let cache = self.lab_cache.read().unwrap_or_else(PoisonError::into_inner);
            if cache.version == version {
                if let Some(lab) = cache.entries.get(&key) {
                    return *lab;
                }
            }
        }

        let lab = color::hex_to_lab(&key);
        let mut cache = self.lab_cache.write().unwrap_or_else(PoisonError::into_inner);
        if cache.version < version {
            cache.entries.clear();
            cache.version = version;
        }
        // A newer version may have landed while computing; never store into it
        if cache.version == version {
            cache.entries.insert(key, lab);
        }
        lab
    }

    /// Drop every cached Lab value
    pub fn invalidate_cache(&self) {
        self.bump_version();
    }

    /// Invalidate and pre-compute Lab values for every catalog entry
    pub fn rebuild_lab_cache(&self) {
        self.invalidate_cache();
        let custom = self.custom_colors();
        for entry in self.target.iter().chain(self.fade.iter()).chain(custom.iter()) {
            self.lab_for(&entry.hex);
        }
        debug!(entries = self.cached_entries(), "rebuilt lab cache");
    }

    pub fn cached_entries(&self) -> usize {
        let cache = self.lab_cache.read().unwrap_or_else(PoisonError::into_inner);
        if cache.version == self.version() {
            cache.entries.len()
        } else {
            0
        }
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
            && self.fade.is_empty()
            && self
                .custom
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .is_empty()
    }

    fn bump_version(&self) {
        self.version.fetch_add(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ColorCatalog {
        ColorCatalog::new(
            vec![ColorEntry::new("Ruby", "FF0000"), ColorEntry::new("Sky", "87CEEB")],
            vec![
                ColorEntry::new("Aurora - Stage 1", "00FF88"),
                ColorEntry::new("Aurora - Stage 2", "00CC88"),
                ColorEntry::new("Ember - Stage 1", "FF4400"),
            ],
        )
    }

    #[test]
    fn fade_families_ignore_stage_suffix() {
        let catalog = sample();
        assert!(catalog.is_fade_family("Aurora - Stage 7"));
        assert!(catalog.is_fade_family("Aurora"));
        assert!(catalog.is_fade_family("Ember - Stage 1"));
        assert!(!catalog.is_fade_family("Ruby"));
        assert_eq!(catalog.fade_family_names(), vec!["Aurora", "Ember"]);
    }

    #[test]
    fn lab_for_is_case_insensitive_and_cached() {
        let catalog = sample();
        let upper = catalog.lab_for("FF0000");
        let lower = catalog.lab_for("ff0000");
        assert_eq!(upper, lower);
        assert_eq!(upper, color::hex_to_lab("FF0000"));
        assert_eq!(catalog.cached_entries(), 1);
    }

    #[test]
    fn custom_mutation_invalidates_cache() {
        let catalog = sample();
        catalog.lab_for("FF0000");
        catalog.lab_for("00FF00");
        assert_eq!(catalog.cached_entries(), 2);
        let before = catalog.version();

        catalog.add_custom("Mine", "#abcdef").unwrap();
        assert!(catalog.version() > before);
        assert_eq!(catalog.cached_entries(), 0);

        catalog.lab_for("ABCDEF");
        assert_eq!(catalog.cached_entries(), 1);

        catalog.remove_custom("Mine").unwrap();
        assert_eq!(catalog.cached_entries(), 0);
    }

    #[test]
    fn add_custom_validates_and_normalizes() {
        let catalog = sample();
        assert!(matches!(
            catalog.add_custom("Bad", "12345"),
            Err(SeymourError::InvalidHex { .. })
        ));
        assert_eq!(catalog.add_custom("Mine", "#a1b2c3").unwrap(), None);
        assert_eq!(
            catalog.add_custom("Mine", "FFFFFF").unwrap().as_deref(),
            Some("A1B2C3")
        );
        assert_eq!(catalog.custom_colors(), vec![ColorEntry::new("Mine", "FFFFFF")]);
        assert!(catalog.is_custom_color("Mine"));
    }

    #[test]
    fn remove_missing_custom_color_fails() {
        let catalog = sample();
        assert!(matches!(
            catalog.remove_custom("Nope"),
            Err(SeymourError::CustomColorNotFound { .. })
        ));
    }

    #[test]
    fn rebuild_lab_cache_covers_all_entries() {
        let catalog = sample().with_custom_colors(
            [("Mine".to_string(), "123456".to_string())]
                .into_iter()
                .collect(),
        );
        catalog.rebuild_lab_cache();
        assert_eq!(catalog.cached_entries(), 6);
    }

    #[test]
    fn empty_catalog() {
        assert!(ColorCatalog::default().is_empty());
        assert!(!sample().is_empty());
    }
}
