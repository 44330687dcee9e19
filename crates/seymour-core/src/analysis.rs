//! Observation → record classification pipeline

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::catalog::ColorCatalog;
use crate::color;
use crate::config::{Config, UserData};
use crate::pattern::{self, WordList};
use crate::piece::PieceCategory;
use crate::ranker::{ClassificationResult, MatchPolicy, MatchRanker};
use crate::record::{Observation, Record};

/// Item names the collection tracks
pub const TRACKED_ITEMS: &[&str] = &[
    "Velvet Top Hat",
    "Cashmere Jacket",
    "Satin Trousers",
    "Oxford Shoes",
];

const FORMAT_MARKER: char = '§';

/// Remove `§x` formatting codes from a display name
pub fn strip_formatting(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == FORMAT_MARKER {
            if let Some(&code) = chars.peek() {
                if is_format_code(code) {
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

fn is_format_code(c: char) -> bool {
    matches!(c, '0'..='9' | 'a'..='f' | 'k'..='o' | 'r')
}

/// Whether an observed item belongs in the collection
pub fn is_tracked_item(display_name: &str) -> bool {
    let clean = strip_formatting(display_name);
    TRACKED_ITEMS.iter().any(|item| clean.contains(item))
}

/// Everything one classification pass reads, captured up front
#[derive(Debug, Clone, Default)]
pub struct AnalysisSettings {
    pub policy: MatchPolicy,
    pub words: WordList,
    pub detect_words: bool,
    pub detect_patterns: bool,
}

impl AnalysisSettings {
    pub fn from_config(config: &Config, data: &UserData) -> Self {
        Self {
            policy: config.match_policy(),
            words: data.words.clone(),
            detect_words: config.analysis.words,
            detect_patterns: config.analysis.patterns,
        }
    }
}

/// Turns observations into classified records
#[derive(Debug, Clone)]
pub struct Analyzer {
    ranker: MatchRanker,
}

impl Analyzer {
    pub fn new(catalog: Arc<ColorCatalog>) -> Self {
        Self {
            ranker: MatchRanker::new(catalog),
        }
    }

    pub fn ranker(&self) -> &MatchRanker {
        &self.ranker
    }

    pub fn catalog(&self) -> &ColorCatalog {
        self.ranker.catalog()
    }

    /// Rank a hex for an item name (category inferred from the name)
    pub fn classify(
        &self,
        hex: &str,
        display_name: &str,
        policy: &MatchPolicy,
    ) -> Option<ClassificationResult> {
        let category = PieceCategory::infer(&strip_formatting(display_name));
        self.ranker.rank(hex, category, policy)
    }

    /// Build a fresh record from an observation
    pub fn analyze(&self, observation: &Observation, settings: &AnalysisSettings) -> Record {
        let display_name = strip_formatting(&observation.display_name);
        let hex = color::normalize_hex(&observation.hex)
            .unwrap_or_else(|| observation.hex.trim().to_string());

        let mut record = Record::new(observation.id_or_generate(), display_name, hex);
        record.location = observation.location;
        record.observed_at = Utc::now();
        self.refresh(&mut record, settings);

        debug!(
            id = %record.id,
            hex = %record.hex,
            best = record.best_match.as_ref().map(|m| m.name.as_str()).unwrap_or("-"),
            "analyzed observation"
        );
        record
    }

    /// Recompute every derived field of a record in place
    pub fn refresh(&self, record: &mut Record, settings: &AnalysisSettings) {
        let result = self.classify(&record.hex, &record.display_name, &settings.policy);
        record.apply_classification(result);
        record.special_pattern = self.pattern_for(&record.hex, settings);
        record.word_match = self.word_for(&record.hex, settings);
    }

    pub fn pattern_for(
        &self,
        hex: &str,
        settings: &AnalysisSettings,
    ) -> Option<pattern::HexPattern> {
        if settings.detect_patterns {
            pattern::detect_pattern(hex)
        } else {
            None
        }
    }

    pub fn word_for(&self, hex: &str, settings: &AnalysisSettings) -> Option<String> {
        if settings.detect_words {
            pattern::detect_word_match(hex, &settings.words).map(str::to_string)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ColorEntry;
    use crate::pattern::HexPattern;
    use crate::record::Location;

    fn analyzer() -> Analyzer {
        Analyzer::new(Arc::new(ColorCatalog::new(
            vec![ColorEntry::new("Ruby", "FF0000"), ColorEntry::new("Ruby 3p", "FF0000")],
            Vec::new(),
        )))
    }

    fn settings() -> AnalysisSettings {
        let mut words = WordList::new();
        words.add("fee", "FEEXXX").unwrap();
        AnalysisSettings {
            words,
            detect_words: true,
            detect_patterns: true,
            ..AnalysisSettings::default()
        }
    }

    #[test]
    fn test_strip_formatting() {
        assert_eq!(strip_formatting("§6§lVelvet Top Hat"), "Velvet Top Hat");
        assert_eq!(strip_formatting("§rPlain"), "Plain");
        // not a format code
        assert_eq!(strip_formatting("§zOdd"), "§zOdd");
        assert_eq!(strip_formatting("trailing §"), "trailing §");
    }

    #[test]
    fn test_tracked_items() {
        assert!(is_tracked_item("§5Velvet Top Hat"));
        assert!(is_tracked_item("Shiny Oxford Shoes"));
        assert!(!is_tracked_item("Leather Boots"));
    }

    #[test]
    fn test_analyze_builds_full_record() {
        let observation = Observation::new("id-1", "§dVelvet Top Hat", "#fee000")
            .with_location(Location::new(4, 70, -3));
        let record = analyzer().analyze(&observation, &settings());

        assert_eq!(record.id, "id-1");
        assert_eq!(record.display_name, "Velvet Top Hat");
        assert_eq!(record.hex, "FEE000");
        assert_eq!(record.location, Some(Location::new(4, 70, -3)));
        assert_eq!(record.word_match.as_deref(), Some("FEE"));
        assert_eq!(record.special_pattern, None);
        // helmet: the 3p entry is filtered
        let top3 = record.top3.unwrap();
        assert!(top3.iter().all(|m| m.name == "Ruby"));
    }

    #[test]
    fn test_features_can_be_disabled() {
        let mut settings = settings();
        settings.detect_words = false;
        settings.detect_patterns = false;

        let observation = Observation::new("id-2", "Satin Trousers", "FEEFEE");
        let record = analyzer().analyze(&observation, &settings);
        assert_eq!(record.word_match, None);
        assert_eq!(record.special_pattern, None);

        settings.detect_patterns = true;
        let record = analyzer().analyze(&observation, &settings);
        assert_eq!(record.special_pattern, Some(HexPattern::Repeating));
    }

    #[test]
    fn test_malformed_hex_gets_no_word_match() {
        let mut settings = settings();
        settings.words.add("any", "XXXXXX").unwrap();

        for hex in ["", "ÀÀÀ"] {
            let record = analyzer().analyze(&Observation::new("x", "Oxford Shoes", hex), &settings);
            assert_eq!(record.word_match, None, "hex {:?}", hex);
        }
    }

    #[test]
    fn test_empty_catalog_leaves_record_unclassified() {
        let analyzer = Analyzer::new(Arc::new(ColorCatalog::default()));
        let record = analyzer.analyze(
            &Observation::new("id-3", "Oxford Shoes", "123456"),
            &AnalysisSettings::default(),
        );
        assert!(record.best_match.is_none());
        assert!(record.top3.is_none());
    }
}
