//! Match ranking
//!
//! Ranks every enabled catalog color against a query hex:
//!
//! 1. drop colors rejected by the piece-specific / 3-piece filters
//! 2. compute deltaE and absolute distance, drop high fades if disabled
//! 3. keep the 10 closest by deltaE
//! 4. exact matches (deltaE < 0.01) first, ascending
//! 5. tier 0-2 candidates by priority class, then deltaE
//! 6. tier 3 candidates by deltaE
//!
//! All sorts are stable, so equal candidates keep catalog order
//! (custom, then target, then fade).

mod policy;
mod types;

use std::sync::Arc;

use tracing::debug;

use crate::catalog::{ColorCatalog, ColorEntry, ColorSource};
use crate::color::{self, LabColor};
use crate::piece::{PieceCategory, THREE_PIECE_MARKER};

pub use policy::{MatchPolicy, PriorityClass, PriorityOrder};
pub use types::{tier, ClassificationResult, MatchCandidate, TIER_EXACT, TIER_UNPRIORITIZED};

/// Candidates kept after the initial deltaE sort
pub const PRE_RANK_LIMIT: usize = 10;
/// deltaE below which a candidate counts as an exact match
pub const EXACT_MATCH_THRESHOLD: f64 = 0.01;
/// Fade candidates above this deltaE are dropped unless high fades are shown
pub const HIGH_FADE_THRESHOLD: f64 = 2.0;

/// One query color with the context it is ranked in
struct Query<'a> {
    hex: &'a str,
    lab: LabColor,
    category: PieceCategory,
    policy: &'a MatchPolicy,
}

/// Ranks catalog colors against query colors
#[derive(Debug, Clone)]
pub struct MatchRanker {
    catalog: Arc<ColorCatalog>,
}

impl MatchRanker {
    pub fn new(catalog: Arc<ColorCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ColorCatalog {
        &self.catalog
    }

    /// Best match and top 3 for a query.
    ///
    /// `None` means no usable candidate (all sources disabled, empty or
    /// filtered out), which is an expected outcome.
    pub fn rank(
        &self,
        hex: &str,
        category: PieceCategory,
        policy: &MatchPolicy,
    ) -> Option<ClassificationResult> {
        let ranked = self.ranked_candidates(hex, category, policy);
        if ranked.is_empty() {
            debug!(%hex, %category, "no usable candidates");
        }
        ClassificationResult::from_ranked(ranked)
    }

    /// Rank using the category inferred from an item name
    pub fn rank_item(
        &self,
        hex: &str,
        item_name: &str,
        policy: &MatchPolicy,
    ) -> Option<ClassificationResult> {
        self.rank(hex, PieceCategory::infer(item_name), policy)
    }

    /// Full ordered candidate list (at most [`PRE_RANK_LIMIT`] entries)
    pub fn ranked_candidates(
        &self,
        hex: &str,
        category: PieceCategory,
        policy: &MatchPolicy,
    ) -> Vec<MatchCandidate> {
        let query = Query {
            hex,
            lab: self.catalog.lab_for(hex),
            category,
            policy,
        };
        let mut candidates = Vec::new();

        if policy.custom_colors {
            let custom = self.catalog.custom_colors();
            self.collect_candidates(&mut candidates, &custom, ColorSource::Custom, &query);
        }
        if policy.target_colors {
            let target = self.catalog.target_colors();
            self.collect_candidates(&mut candidates, target, ColorSource::Target, &query);
        }
        if policy.fade_dyes {
            let fade = self.catalog.fade_dyes();
            self.collect_candidates(&mut candidates, fade, ColorSource::Fade, &query);
        }

        let surviving = candidates.len();
        candidates.sort_by(|a, b| a.delta_e.total_cmp(&b.delta_e));
        candidates.truncate(PRE_RANK_LIMIT);

        let (exact, rest): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|c| c.delta_e < EXACT_MATCH_THRESHOLD);
        let (mut prioritized, unprioritized): (Vec<_>, Vec<_>) =
            rest.into_iter().partition(|c| c.tier < TIER_UNPRIORITIZED);

        prioritized.sort_by(|a, b| {
            policy
                .priority
                .rank(a.priority_class())
                .cmp(&policy.priority.rank(b.priority_class()))
                .then(a.delta_e.total_cmp(&b.delta_e))
        });

        debug!(
            %hex,
            %category,
            surviving,
            exact = exact.len(),
            prioritized = prioritized.len(),
            "ranked candidates"
        );

        exact
            .into_iter()
            .chain(prioritized)
            .chain(unprioritized)
            .collect()
    }

    fn collect_candidates(
        &self,
        out: &mut Vec<MatchCandidate>,
        entries: &[ColorEntry],
        source: ColorSource,
        query: &Query<'_>,
    ) {
        let policy = query.policy;
        for entry in entries {
            if is_filtered(&entry.name, query.category, policy) {
                continue;
            }

            let target_lab = self.catalog.lab_for(&entry.hex);
            let delta_e = color::delta_e(&query.lab, &target_lab);

            let high_fade = source == ColorSource::Fade && delta_e > HIGH_FADE_THRESHOLD;
            if high_fade && !policy.show_high_fades {
                continue;
            }

            out.push(MatchCandidate {
                name: entry.name.clone(),
                target_hex: entry.hex.clone(),
                delta_e,
                absolute_distance: color::absolute_distance(query.hex, &entry.hex),
                tier: tier(delta_e, source),
                source,
            });
        }
    }
}

/// Filters applied before any distance is computed
fn is_filtered(color_name: &str, category: PieceCategory, policy: &MatchPolicy) -> bool {
    if policy.piece_specific && !category.accepts_color(color_name) {
        return true;
    }
    category == PieceCategory::Helmet
        && !policy.three_piece_sets
        && color_name.contains(THREE_PIECE_MARKER)
}
