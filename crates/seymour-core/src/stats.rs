//! Collection statistics and queries

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::color;
use crate::pattern::{self, HexPattern, WordList};
use crate::record::Record;

/// Best-match deltaE at or below which a piece counts as T1
pub const T1_MAX_DELTA_E: f64 = 2.0;
/// Best-match deltaE at or below which a piece counts as T2
pub const T2_MAX_DELTA_E: f64 = 5.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    pub total: usize,
    pub t1_normal: usize,
    pub t1_fade: usize,
    pub t2_normal: usize,
    pub t2_fade: usize,
    /// Pieces whose hex appears more than once
    pub dupes: usize,
}

impl CollectionStats {
    /// Custom matches count as normal
    pub fn compute<'a>(records: impl IntoIterator<Item = &'a Record>) -> Self {
        let mut stats = Self::default();
        let mut hex_counts: HashMap<String, usize> = HashMap::new();

        for record in records {
            stats.total += 1;
            *hex_counts.entry(hex_key(&record.hex)).or_default() += 1;

            let Some(best) = &record.best_match else {
                continue;
            };
            let fade = best.is_fade();
            if best.delta_e <= T1_MAX_DELTA_E {
                if fade {
                    stats.t1_fade += 1;
                } else {
                    stats.t1_normal += 1;
                }
            } else if best.delta_e <= T2_MAX_DELTA_E {
                if fade {
                    stats.t2_fade += 1;
                } else {
                    stats.t2_normal += 1;
                }
            }
        }

        stats.dupes = hex_counts.values().filter(|n| **n > 1).sum();
        stats
    }
}

fn hex_key(hex: &str) -> String {
    color::normalize_hex(hex).unwrap_or_else(|| hex.trim().to_ascii_uppercase())
}

/// Hex → ids for every hex held by more than one record
pub fn duplicate_groups<'a>(
    records: impl IntoIterator<Item = &'a Record>,
) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for record in records {
        groups
            .entry(hex_key(&record.hex))
            .or_default()
            .push(record.id.clone());
    }
    groups.retain(|_, ids| ids.len() > 1);
    for ids in groups.values_mut() {
        ids.sort();
    }
    groups
}

/// Records whose hex is one of `hexes` (case and `#` insensitive)
pub fn search_by_hex<'a, S: AsRef<str>>(
    records: impl IntoIterator<Item = &'a Record>,
    hexes: &[S],
) -> Vec<&'a Record> {
    let wanted: Vec<String> = hexes.iter().map(|h| hex_key(h.as_ref())).collect();
    records
        .into_iter()
        .filter(|r| wanted.contains(&hex_key(&r.hex)))
        .collect()
}

/// Ids of records showing a pattern.
///
/// `kind` is a pattern name (`paired`, `axbxcx_a`, ...); plain `axbxcx`
/// matches every AxBxCx digit.
pub fn pieces_with_pattern<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    kind: &str,
) -> Vec<String> {
    let kind = kind.trim().to_ascii_lowercase();
    let mut ids: Vec<String> = records
        .into_iter()
        .filter(|r| match pattern::detect_pattern(&r.hex) {
            Some(HexPattern::AxBxCx(_)) if kind == "axbxcx" => true,
            Some(found) => found.to_string() == kind,
            None => false,
        })
        .map(|r| r.id.clone())
        .collect();
    ids.sort();
    ids
}

/// Ids of records matching any word in the dictionary
pub fn pieces_with_words<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    words: &WordList,
) -> Vec<String> {
    let mut ids: Vec<String> = records
        .into_iter()
        .filter(|r| pattern::detect_word_match(&r.hex, words).is_some())
        .map(|r| r.id.clone())
        .collect();
    ids.sort();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ColorSource;
    use crate::ranker::{tier, MatchCandidate};

    fn record(id: &str, hex: &str, best: Option<(f64, ColorSource)>) -> Record {
        let mut record = Record::new(id, "Oxford Shoes", hex);
        record.best_match = best.map(|(delta_e, source)| MatchCandidate {
            name: "Any".to_string(),
            target_hex: "000000".to_string(),
            delta_e,
            absolute_distance: 0,
            tier: tier(delta_e, source),
            source,
        });
        record
    }

    #[test]
    fn test_stats_buckets() {
        let records = vec![
            record("1", "111111", Some((0.5, ColorSource::Target))),
            record("2", "222222", Some((2.0, ColorSource::Custom))),
            record("3", "333333", Some((1.5, ColorSource::Fade))),
            record("4", "444444", Some((4.0, ColorSource::Target))),
            record("5", "555555", Some((5.0, ColorSource::Fade))),
            record("6", "666666", Some((9.0, ColorSource::Target))),
            record("7", "777777", None),
        ];
        let stats = CollectionStats::compute(&records);
        assert_eq!(
            stats,
            CollectionStats {
                total: 7,
                t1_normal: 2,
                t1_fade: 1,
                t2_normal: 1,
                t2_fade: 1,
                dupes: 0,
            }
        );
    }

    #[test]
    fn test_dupes_count_every_piece_in_group() {
        let records = vec![
            record("a", "ABCDEF", None),
            record("b", "abcdef", None),
            record("c", "#ABCDEF", None),
            record("d", "123456", None),
            record("e", "123456", None),
            record("f", "000000", None),
        ];
        assert_eq!(CollectionStats::compute(&records).dupes, 5);

        let groups = duplicate_groups(&records);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["ABCDEF"], vec!["a", "b", "c"]);
        assert_eq!(groups["123456"], vec!["d", "e"]);
    }

    #[test]
    fn test_search_by_hex() {
        let records = vec![
            record("a", "ABCDEF", None),
            record("b", "123456", None),
            record("c", "FEDCBA", None),
        ];
        let found = search_by_hex(&records, &["#abcdef", "FEDCBA"]);
        let ids: Vec<&str> = found.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert!(search_by_hex(&records, &["000000"]).is_empty());
    }

    #[test]
    fn test_pieces_with_pattern() {
        let records = vec![
            record("p", "AABBCC", None),
            record("r", "ABCABC", None),
            record("x1", "A1A2A3", None),
            record("x2", "B1B2B3", None),
            record("n", "123456", None),
        ];
        assert_eq!(pieces_with_pattern(&records, "paired"), vec!["p"]);
        assert_eq!(pieces_with_pattern(&records, "Repeating"), vec!["r"]);
        assert_eq!(pieces_with_pattern(&records, "axbxcx_b"), vec!["x2"]);
        assert_eq!(pieces_with_pattern(&records, "axbxcx"), vec!["x1", "x2"]);
        assert!(pieces_with_pattern(&records, "palindrome").is_empty());
    }

    #[test]
    fn test_pieces_with_words() {
        let mut words = WordList::new();
        words.add("cafe", "CAFEXX").unwrap();
        let records = vec![
            record("b", "CAFE01", None),
            record("a", "CAFE00", None),
            record("c", "C0FFEE", None),
        ];
        assert_eq!(pieces_with_words(&records, &words), vec!["a", "b"]);
        assert!(pieces_with_words(&records, &WordList::new()).is_empty());
    }
}
