//! Hex pattern and word detection

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, SeymourError};

/// Pattern character matching any hex digit
pub const WILDCARD: char = 'X';
pub const MAX_WORD_PATTERN_LEN: usize = 6;

/// Structural shape of a six-digit hex code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HexPattern {
    /// `AABBCC`
    Paired,
    /// `ABCABC`
    Repeating,
    /// `ABCCBA`
    Palindrome,
    /// `AxAxAx`, carrying the repeated digit (lowercase)
    AxBxCx(char),
}

impl fmt::Display for HexPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Paired => f.write_str("paired"),
            Self::Repeating => f.write_str("repeating"),
            Self::Palindrome => f.write_str("palindrome"),
            Self::AxBxCx(c) => write!(f, "axbxcx_{}", c),
        }
    }
}

impl FromStr for HexPattern {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "paired" => Ok(Self::Paired),
            "repeating" => Ok(Self::Repeating),
            "palindrome" => Ok(Self::Palindrome),
            other => {
                let digit = other
                    .strip_prefix("axbxcx_")
                    .and_then(|rest| {
                        let mut chars = rest.chars();
                        match (chars.next(), chars.next()) {
                            (Some(c), None) if c.is_ascii_hexdigit() => Some(c),
                            _ => None,
                        }
                    })
                    .ok_or_else(|| format!("unknown pattern: {}", s))?;
                Ok(Self::AxBxCx(digit))
            }
        }
    }
}

impl Serialize for HexPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HexPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Classify a hex code. First matching rule wins:
/// paired, repeating, palindrome, then AxBxCx.
pub fn detect_pattern(hex: &str) -> Option<HexPattern> {
    let hex = hex.trim_start_matches('#').to_ascii_uppercase();
    let c: Vec<char> = hex.chars().collect();
    if c.len() != 6 {
        return None;
    }

    if c[0] == c[1] && c[2] == c[3] && c[4] == c[5] {
        Some(HexPattern::Paired)
    } else if c[0] == c[3] && c[1] == c[4] && c[2] == c[5] {
        Some(HexPattern::Repeating)
    } else if c[0] == c[5] && c[1] == c[4] && c[2] == c[3] {
        Some(HexPattern::Palindrome)
    } else if c[0] == c[2] && c[2] == c[4] {
        Some(HexPattern::AxBxCx(c[0].to_ascii_lowercase()))
    } else {
        None
    }
}

/// Whether `hex` matches a wildcard pattern of the same length
pub fn matches_word_pattern(hex: &str, pattern: &str) -> bool {
    let hex = hex.trim_start_matches('#');
    if pattern.is_empty() || hex.chars().count() != pattern.chars().count() {
        return false;
    }
    hex.chars().zip(pattern.chars()).all(|(h, p)| {
        let p = p.to_ascii_uppercase();
        p == WILDCARD || h.to_ascii_uppercase() == p
    })
}

/// Validate and normalize a word pattern (`#` stripped, uppercase)
pub fn normalize_word_pattern(pattern: &str) -> Result<String> {
    let normalized = pattern.trim().replace('#', "").to_ascii_uppercase();
    let invalid = |reason: &str| SeymourError::InvalidWordPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    if !normalized
        .chars()
        .all(|c| c.is_ascii_hexdigit() || c == WILDCARD)
    {
        return Err(invalid("must only contain 0-9, A-F or X"));
    }
    if normalized.is_empty() || normalized.len() > MAX_WORD_PATTERN_LEN {
        return Err(invalid("must be 1-6 characters long"));
    }
    Ok(normalized)
}

/// User word dictionary: word -> pattern, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    into = "IndexMap<String, String>",
    try_from = "IndexMap<String, String>"
)]
pub struct WordList {
    words: IndexMap<String, String>,
}

impl WordList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a word. Returns the previous pattern, if any.
    pub fn add(&mut self, word: &str, pattern: &str) -> Result<Option<String>> {
        let pattern = normalize_word_pattern(pattern)?;
        Ok(self.words.insert(word.trim().to_uppercase(), pattern))
    }

    /// Remove a word. Returns its pattern.
    pub fn remove(&mut self, word: &str) -> Result<String> {
        let key = word.trim().to_uppercase();
        self.words
            .shift_remove(&key)
            .ok_or(SeymourError::WordNotFound { word: key })
    }

    pub fn get(&self, word: &str) -> Option<&str> {
        self.words.get(&word.trim().to_uppercase()).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.words.iter().map(|(w, p)| (w.as_str(), p.as_str()))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl From<WordList> for IndexMap<String, String> {
    fn from(list: WordList) -> Self {
        list.words
    }
}

/// Loaded tables go through the same checks as [`WordList::add`]
impl TryFrom<IndexMap<String, String>> for WordList {
    type Error = SeymourError;

    fn try_from(words: IndexMap<String, String>) -> Result<Self> {
        let mut list = Self::new();
        for (word, pattern) in words {
            list.add(&word, &pattern)?;
        }
        Ok(list)
    }
}

/// First word (in dictionary order) whose pattern matches `hex`
pub fn detect_word_match<'a>(hex: &str, words: &'a WordList) -> Option<&'a str> {
    words
        .iter()
        .find(|(_, pattern)| matches_word_pattern(hex, pattern))
        .map(|(word, _)| word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_shapes() {
        assert_eq!(detect_pattern("AABBCC"), Some(HexPattern::Paired));
        assert_eq!(detect_pattern("ABCABC"), Some(HexPattern::Repeating));
        assert_eq!(detect_pattern("ABCCBA"), Some(HexPattern::Palindrome));
        assert_eq!(detect_pattern("A1A2A3"), Some(HexPattern::AxBxCx('a')));
        assert_eq!(detect_pattern("123456"), None);
    }

    #[test]
    fn test_pattern_precedence() {
        // satisfies every rule
        assert_eq!(detect_pattern("111111"), Some(HexPattern::Paired));
        // paired and palindrome
        assert_eq!(detect_pattern("AABBAA"), Some(HexPattern::Paired));
        // repeating and palindrome
        assert_eq!(detect_pattern("ABAABA"), Some(HexPattern::Repeating));
        assert_eq!(detect_pattern("112233"), Some(HexPattern::Paired));
    }

    #[test]
    fn test_pattern_is_case_insensitive() {
        assert_eq!(detect_pattern("aabbcc"), Some(HexPattern::Paired));
        assert_eq!(detect_pattern("#f0f1f2"), Some(HexPattern::AxBxCx('f')));
    }

    #[test]
    fn test_pattern_requires_six_chars() {
        assert_eq!(detect_pattern("AAB"), None);
        assert_eq!(detect_pattern(""), None);
        assert_eq!(detect_pattern("AABBCCDD"), None);
    }

    #[test]
    fn test_pattern_string_form() {
        assert_eq!(HexPattern::AxBxCx('b').to_string(), "axbxcx_b");
        assert_eq!("axbxcx_b".parse::<HexPattern>(), Ok(HexPattern::AxBxCx('b')));
        assert_eq!("Palindrome".parse::<HexPattern>(), Ok(HexPattern::Palindrome));
        assert!("axbxcx_".parse::<HexPattern>().is_err());
        assert!("zigzag".parse::<HexPattern>().is_err());

        let json = serde_json::to_string(&HexPattern::Repeating).unwrap();
        assert_eq!(json, "\"repeating\"");
        let back: HexPattern = serde_json::from_str("\"axbxcx_3\"").unwrap();
        assert_eq!(back, HexPattern::AxBxCx('3'));
    }

    #[test]
    fn test_word_pattern_wildcards() {
        assert!(matches_word_pattern("BEEF00", "BEEFXX"));
        assert!(matches_word_pattern("beef12", "BEEFXX"));
        assert!(!matches_word_pattern("BEEE00", "BEEFXX"));
        // lengths must match, no offset search
        assert!(!matches_word_pattern("00BEEF", "BEEF"));
        assert!(matches_word_pattern("BEEF", "BEEF"));
    }

    #[test]
    fn test_empty_pattern_never_matches() {
        assert!(!matches_word_pattern("", ""));
        assert!(!matches_word_pattern("#", ""));
        assert!(!matches_word_pattern("BEEF00", ""));
    }

    #[test]
    fn test_word_pattern_length_counts_chars() {
        // three two-byte characters against six pattern characters
        assert!(!matches_word_pattern("ÀÀÀ", "XXXXXX"));
        assert!(!matches_word_pattern("ÀÀÀ", "XXX"));
        assert!(!matches_word_pattern("BEEFÀ", "BEEFXX"));
    }

    #[test]
    fn test_word_list_load_validates_patterns() {
        let back: WordList = toml::from_str("beef = \"#beefxx\"").unwrap();
        assert_eq!(back.get("BEEF"), Some("BEEFXX"));

        assert!(toml::from_str::<WordList>("FOO = \"\"").is_err());
        assert!(toml::from_str::<WordList>("FOO = \"GGGGGG\"").is_err());
        assert!(toml::from_str::<WordList>("FOO = \"ABCDEF0\"").is_err());
    }

    #[test]
    fn test_word_list_validation() {
        let mut words = WordList::new();
        assert!(matches!(
            words.add("bad", "BEEFZZ"),
            Err(SeymourError::InvalidWordPattern { .. })
        ));
        assert!(matches!(
            words.add("long", "ABCDEF0"),
            Err(SeymourError::InvalidWordPattern { .. })
        ));
        assert!(matches!(
            words.add("empty", "#"),
            Err(SeymourError::InvalidWordPattern { .. })
        ));

        assert_eq!(words.add("beef", "#beefxx").unwrap(), None);
        assert_eq!(words.get("BEEF"), Some("BEEFXX"));
        assert_eq!(words.add("Beef", "BEEF00").unwrap().as_deref(), Some("BEEFXX"));
        assert_eq!(words.len(), 1);
    }

    #[test]
    fn test_word_list_remove() {
        let mut words = WordList::new();
        words.add("cafe", "CAFEXX").unwrap();
        assert_eq!(words.remove("Cafe").unwrap(), "CAFEXX");
        assert!(words.is_empty());
        assert!(matches!(
            words.remove("cafe"),
            Err(SeymourError::WordNotFound { .. })
        ));
    }

    #[test]
    fn test_first_word_wins() {
        let mut words = WordList::new();
        words.add("dead", "DEADXX").unwrap();
        words.add("any", "XXXXXX").unwrap();
        words.add("beef", "BEEFXX").unwrap();

        assert_eq!(detect_word_match("DEAD00", &words), Some("DEAD"));
        assert_eq!(detect_word_match("BEEF00", &words), Some("ANY"));
        assert_eq!(detect_word_match("BEEF00", &WordList::new()), None);
    }

    #[test]
    fn test_word_list_toml_keeps_order() {
        let mut words = WordList::new();
        words.add("zed", "00").unwrap();
        words.add("abe", "ABE").unwrap();
        let text = toml::to_string(&words).unwrap();
        let back: WordList = toml::from_str(&text).unwrap();
        let keys: Vec<&str> = back.iter().map(|(w, _)| w).collect();
        assert_eq!(keys, vec!["ZED", "ABE"]);
    }
}
