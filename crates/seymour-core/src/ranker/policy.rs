//! Ranking policy
//!
//! A [`MatchPolicy`] is an immutable snapshot handed to every ranking call, so
//! a configuration change can never be half-applied to one ranking.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SeymourError};

/// One of the eight buckets non-exact, non-tier-3 candidates are ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriorityClass {
    CustomT1,
    CustomT2,
    FadeT0,
    FadeT1,
    FadeT2,
    NormalT0,
    NormalT1,
    NormalT2,
}

impl PriorityClass {
    pub const ALL: [PriorityClass; 8] = [
        Self::CustomT1,
        Self::CustomT2,
        Self::FadeT0,
        Self::FadeT1,
        Self::FadeT2,
        Self::NormalT0,
        Self::NormalT1,
        Self::NormalT2,
    ];

    /// Map a candidate to its class.
    ///
    /// Combinations outside the table (tier 3, custom tier 0) map to `NormalT2`;
    /// callers rely on this never failing.
    pub fn classify(is_custom: bool, is_fade: bool, tier: u8) -> Self {
        match (is_custom, is_fade, tier) {
            (true, _, 1) => Self::CustomT1,
            (true, _, 2) => Self::CustomT2,
            (false, true, 0) => Self::FadeT0,
            (false, true, 1) => Self::FadeT1,
            (false, true, 2) => Self::FadeT2,
            (false, false, 0) => Self::NormalT0,
            (false, false, 1) => Self::NormalT1,
            _ => Self::NormalT2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CustomT1 => "custom-t1",
            Self::CustomT2 => "custom-t2",
            Self::FadeT0 => "fade-t0",
            Self::FadeT1 => "fade-t1",
            Self::FadeT2 => "fade-t2",
            Self::NormalT0 => "normal-t0",
            Self::NormalT1 => "normal-t1",
            Self::NormalT2 => "normal-t2",
        }
    }
}

impl fmt::Display for PriorityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriorityClass {
    type Err = SeymourError;

    /// Accepts `custom-t1`, `custom_t1`, `CustomT1` and similar spellings
    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_' && *c != ' ')
            .flat_map(char::to_lowercase)
            .collect();
        Self::ALL
            .iter()
            .copied()
            .find(|class| class.as_str().replace('-', "") == key)
            .ok_or_else(|| SeymourError::InvalidPriorityOrder {
                message: format!("unknown priority class '{}'", s.trim()),
            })
    }
}

/// Total order over the eight priority classes (first = most preferred)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PriorityClass>", into = "Vec<PriorityClass>")]
pub struct PriorityOrder {
    order: Vec<PriorityClass>,
}

impl PriorityOrder {
    /// Build from a list that must contain every class exactly once
    pub fn new(order: Vec<PriorityClass>) -> Result<Self> {
        if order.len() != PriorityClass::ALL.len() {
            return Err(SeymourError::InvalidPriorityOrder {
                message: format!(
                    "expected {} classes, got {}",
                    PriorityClass::ALL.len(),
                    order.len()
                ),
            });
        }
        for class in PriorityClass::ALL {
            if !order.contains(&class) {
                return Err(SeymourError::InvalidPriorityOrder {
                    message: format!("missing class '{}'", class),
                });
            }
        }
        Ok(Self { order })
    }

    /// Parse a comma-separated list of class names
    pub fn parse_list(value: &str) -> Result<Self> {
        let trimmed = value.trim().trim_start_matches('[').trim_end_matches(']');
        let classes = trimmed
            .split(',')
            .map(|s| s.trim().trim_matches('"').trim_matches('\''))
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<PriorityClass>>>()?;
        Self::new(classes)
    }

    /// Position of a class; lower sorts first
    pub fn rank(&self, class: PriorityClass) -> usize {
        self.order
            .iter()
            .position(|c| *c == class)
            .unwrap_or(self.order.len())
    }

    pub fn classes(&self) -> &[PriorityClass] {
        &self.order
    }
}

impl Default for PriorityOrder {
    fn default() -> Self {
        Self {
            order: vec![
                PriorityClass::CustomT1,
                PriorityClass::CustomT2,
                PriorityClass::NormalT0,
                PriorityClass::NormalT1,
                PriorityClass::FadeT0,
                PriorityClass::FadeT1,
                PriorityClass::NormalT2,
                PriorityClass::FadeT2,
            ],
        }
    }
}

impl TryFrom<Vec<PriorityClass>> for PriorityOrder {
    type Error = SeymourError;

    fn try_from(order: Vec<PriorityClass>) -> Result<Self> {
        Self::new(order)
    }
}

impl From<PriorityOrder> for Vec<PriorityClass> {
    fn from(order: PriorityOrder) -> Self {
        order.order
    }
}

impl fmt::Display for PriorityOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.order.iter().map(PriorityClass::as_str).collect();
        write!(f, "{}", names.join(","))
    }
}

/// Sources, filters and priority order applied to one ranking call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPolicy {
    pub custom_colors: bool,
    pub target_colors: bool,
    pub fade_dyes: bool,
    /// Only colors usable for the query's piece category
    pub piece_specific: bool,
    /// Allow `3p` colors on helmets
    pub three_piece_sets: bool,
    /// Keep fade candidates with deltaE above 2.0
    pub show_high_fades: bool,
    pub priority: PriorityOrder,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            custom_colors: true,
            target_colors: true,
            fade_dyes: true,
            piece_specific: false,
            three_piece_sets: false,
            show_high_fades: false,
            priority: PriorityOrder::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_covers_the_table() {
        assert_eq!(PriorityClass::classify(true, false, 1), PriorityClass::CustomT1);
        assert_eq!(PriorityClass::classify(true, false, 2), PriorityClass::CustomT2);
        assert_eq!(PriorityClass::classify(false, true, 0), PriorityClass::FadeT0);
        assert_eq!(PriorityClass::classify(false, true, 1), PriorityClass::FadeT1);
        assert_eq!(PriorityClass::classify(false, true, 2), PriorityClass::FadeT2);
        assert_eq!(PriorityClass::classify(false, false, 0), PriorityClass::NormalT0);
        assert_eq!(PriorityClass::classify(false, false, 1), PriorityClass::NormalT1);
        assert_eq!(PriorityClass::classify(false, false, 2), PriorityClass::NormalT2);
    }

    #[test]
    fn classify_falls_back_to_normal_t2() {
        assert_eq!(PriorityClass::classify(true, false, 0), PriorityClass::NormalT2);
        assert_eq!(PriorityClass::classify(true, false, 3), PriorityClass::NormalT2);
        assert_eq!(PriorityClass::classify(false, true, 3), PriorityClass::NormalT2);
        assert_eq!(PriorityClass::classify(false, false, 3), PriorityClass::NormalT2);
    }

    #[test]
    fn class_names_parse_in_several_spellings() {
        assert_eq!(
            "custom-t1".parse::<PriorityClass>().unwrap(),
            PriorityClass::CustomT1
        );
        assert_eq!("FadeT2".parse::<PriorityClass>().unwrap(), PriorityClass::FadeT2);
        assert_eq!(
            "normal_t0".parse::<PriorityClass>().unwrap(),
            PriorityClass::NormalT0
        );
        assert!("bogus".parse::<PriorityClass>().is_err());
    }

    #[test]
    fn default_order_is_a_permutation() {
        let order = PriorityOrder::default();
        assert!(PriorityOrder::new(order.classes().to_vec()).is_ok());
        assert_eq!(order.rank(PriorityClass::CustomT1), 0);
        assert_eq!(order.rank(PriorityClass::FadeT2), 7);
    }

    #[test]
    fn order_rejects_missing_or_duplicate_classes() {
        let mut classes = PriorityClass::ALL.to_vec();
        classes.pop();
        assert!(PriorityOrder::new(classes.clone()).is_err());

        classes.push(PriorityClass::CustomT1);
        assert!(PriorityOrder::new(classes).is_err());
    }

    #[test]
    fn parse_list_roundtrips_display() {
        let order = PriorityOrder::default();
        let parsed = PriorityOrder::parse_list(&order.to_string()).unwrap();
        assert_eq!(parsed, order);

        let bracketed = PriorityOrder::parse_list(
            r#"["fade-t0", "fade-t1", "fade-t2", "normal-t0", "normal-t1", "normal-t2", "custom-t1", "custom-t2"]"#,
        )
        .unwrap();
        assert_eq!(bracketed.rank(PriorityClass::FadeT0), 0);
    }
}
