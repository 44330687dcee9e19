use serde::{Deserialize, Serialize};

use crate::catalog::ColorSource;

use super::policy::PriorityClass;

/// Best tier
pub const TIER_EXACT: u8 = 0;
/// Worst tier; never reordered by priority
pub const TIER_UNPRIORITIZED: u8 = 3;

/// Coarse quality bucket for a deltaE.
///
/// Custom colors have no tier 0; exact custom matches are handled by the
/// exact-match carve-out instead.
pub fn tier(delta_e: f64, source: ColorSource) -> u8 {
    match source {
        ColorSource::Custom => {
            if delta_e <= 2.0 {
                1
            } else if delta_e <= 5.0 {
                2
            } else {
                3
            }
        }
        ColorSource::Fade | ColorSource::Target => {
            if delta_e <= 1.0 {
                0
            } else if delta_e <= 2.0 {
                1
            } else if delta_e <= 5.0 {
                2
            } else {
                3
            }
        }
    }
}

/// One catalog color compared against a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub name: String,
    pub target_hex: String,
    pub delta_e: f64,
    pub absolute_distance: u32,
    pub tier: u8,
    pub source: ColorSource,
}

impl MatchCandidate {
    pub fn is_custom(&self) -> bool {
        self.source == ColorSource::Custom
    }

    pub fn is_fade(&self) -> bool {
        self.source == ColorSource::Fade
    }

    pub fn priority_class(&self) -> PriorityClass {
        PriorityClass::classify(self.is_custom(), self.is_fade(), self.tier)
    }
}

/// Outcome of ranking one query color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub best_match: MatchCandidate,
    /// At most three candidates, best first
    pub top3: Vec<MatchCandidate>,
    /// Tier of `best_match`
    pub tier: u8,
}

impl ClassificationResult {
    /// Build from a fully ordered candidate list; `None` when it is empty
    pub fn from_ranked(mut ranked: Vec<MatchCandidate>) -> Option<Self> {
        ranked.truncate(3);
        let best_match = ranked.first()?.clone();
        Some(Self {
            tier: best_match.tier,
            best_match,
            top3: ranked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, delta_e: f64) -> MatchCandidate {
        MatchCandidate {
            name: name.to_string(),
            target_hex: "000000".to_string(),
            delta_e,
            absolute_distance: 0,
            tier: tier(delta_e, ColorSource::Target),
            source: ColorSource::Target,
        }
    }

    #[test]
    fn custom_tiers() {
        assert_eq!(tier(0.0, ColorSource::Custom), 1);
        assert_eq!(tier(2.0, ColorSource::Custom), 1);
        assert_eq!(tier(2.01, ColorSource::Custom), 2);
        assert_eq!(tier(5.0, ColorSource::Custom), 2);
        assert_eq!(tier(5.01, ColorSource::Custom), 3);
    }

    #[test]
    fn fade_and_normal_tiers() {
        for source in [ColorSource::Fade, ColorSource::Target] {
            assert_eq!(tier(0.0, source), 0);
            assert_eq!(tier(1.0, source), 0);
            assert_eq!(tier(1.5, source), 1);
            assert_eq!(tier(2.0, source), 1);
            assert_eq!(tier(4.9, source), 2);
            assert_eq!(tier(5.1, source), 3);
        }
    }

    #[test]
    fn tiering_is_monotonic() {
        for source in [ColorSource::Custom, ColorSource::Fade, ColorSource::Target] {
            let mut last = 0;
            for step in 0..1000 {
                let t = tier(f64::from(step) * 0.01, source);
                assert!(t >= last, "tier dropped at step {} for {:?}", step, source);
                last = t;
            }
        }
    }

    #[test]
    fn from_ranked_truncates_and_picks_first() {
        let ranked = vec![
            candidate("a", 0.5),
            candidate("b", 1.5),
            candidate("c", 3.0),
            candidate("d", 9.0),
        ];
        let result = ClassificationResult::from_ranked(ranked).unwrap();
        assert_eq!(result.best_match.name, "a");
        assert_eq!(result.top3.len(), 3);
        assert_eq!(result.tier, 0);
    }

    #[test]
    fn from_ranked_empty_is_none() {
        assert!(ClassificationResult::from_ranked(Vec::new()).is_none());
    }
}
