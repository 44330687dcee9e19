//! Catalog resource loading
//!
//! Reads the bundled color resource:
//!
//! ```json
//! {
//!   "TARGET_COLORS": { "Ruby": "FF0000" },
//!   "FADE_DYES": { "Aurora - Stage 1": "00FF88" }
//! }
//! ```

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{info, warn};

use crate::color;
use crate::error::{Result, SeymourError};

use super::ColorEntry;

/// Parsed target and fade palettes, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogData {
    pub target: Vec<ColorEntry>,
    pub fade: Vec<ColorEntry>,
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(rename = "TARGET_COLORS", default)]
    target_colors: IndexMap<String, String>,
    #[serde(rename = "FADE_DYES", default)]
    fade_dyes: IndexMap<String, String>,
}

/// Parse catalog JSON text
pub fn load_catalog_json(content: &str) -> Result<CatalogData> {
    let file: CatalogFile =
        serde_json::from_str(content).map_err(|e| SeymourError::CatalogParse {
            message: e.to_string(),
        })?;

    let data = CatalogData {
        target: to_entries(file.target_colors),
        fade: to_entries(file.fade_dyes),
    };
    info!(
        target_colors = data.target.len(),
        fade_dyes = data.fade.len(),
        "loaded color catalog"
    );
    Ok(data)
}

/// Read and parse a catalog file
pub fn load_catalog_file(path: &Path) -> Result<CatalogData> {
    let content = fs::read_to_string(path)?;
    load_catalog_json(&content)
}

fn to_entries(map: IndexMap<String, String>) -> Vec<ColorEntry> {
    map.into_iter()
        .map(|(name, hex)| match color::normalize_hex(&hex) {
            Some(normalized) => ColorEntry::new(name, normalized),
            None => {
                // Kept as-is; ranking treats it as black
                warn!(%name, %hex, "catalog entry has malformed hex");
                ColorEntry::new(name, hex)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_both_sections_in_order() {
        let data = load_catalog_json(
            r##"{
                "TARGET_COLORS": {"Zinc": "aaaaaa", "Apple": "#00ff00"},
                "FADE_DYES": {"Aurora - Stage 2": "00CC88", "Aurora - Stage 1": "00FF88"}
            }"##,
        )
        .unwrap();

        assert_eq!(
            data.target,
            vec![ColorEntry::new("Zinc", "AAAAAA"), ColorEntry::new("Apple", "00FF00")]
        );
        assert_eq!(data.fade[0].name, "Aurora - Stage 2");
        assert_eq!(data.fade[1].name, "Aurora - Stage 1");
    }

    #[test]
    fn missing_sections_are_empty() {
        let data = load_catalog_json(r#"{"TARGET_COLORS": {"Ruby": "FF0000"}}"#).unwrap();
        assert_eq!(data.target.len(), 1);
        assert!(data.fade.is_empty());
    }

    #[test]
    fn malformed_hex_is_kept() {
        let data = load_catalog_json(r#"{"TARGET_COLORS": {"Broken": "XYZ"}}"#).unwrap();
        assert_eq!(data.target, vec![ColorEntry::new("Broken", "XYZ")]);
    }

    #[test]
    fn invalid_json_is_a_catalog_error() {
        let err = load_catalog_json("{not json").unwrap_err();
        assert!(matches!(err, SeymourError::CatalogParse { .. }));
    }

    #[test]
    fn loads_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("colors.json");
        fs::write(&path, r#"{"FADE_DYES": {"Ember - Stage 1": "ff4400"}}"#).unwrap();

        let data = load_catalog_file(&path).unwrap();
        assert_eq!(data.fade, vec![ColorEntry::new("Ember - Stage 1", "FF4400")]);
    }
}
