//! Bulk re-derivation of record fields after catalog or settings changes
//!
//! Each pass walks a key snapshot and updates records one at a time through
//! [`RecordStore::update`], so records added or removed concurrently are
//! simply missed or skipped. Writing back is left to the flush worker.

use tracing::info;

use crate::analysis::{AnalysisSettings, Analyzer};
use crate::record::Record;
use crate::store::RecordStore;

/// Counts from one rebuild pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildReport {
    /// Records visited
    pub total: usize,
    /// Records whose fields changed
    pub updated: usize,
}

/// Which derived fields a pass recomputes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildKind {
    Words,
    Patterns,
    /// Best match
    Analysis,
    /// Top 3 matches
    Matches,
}

impl RebuildKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Words => "words",
            Self::Patterns => "patterns",
            Self::Analysis => "analysis",
            Self::Matches => "matches",
        }
    }
}

pub fn rebuild(
    kind: RebuildKind,
    store: &RecordStore,
    analyzer: &Analyzer,
    settings: &AnalysisSettings,
) -> RebuildReport {
    let report = run_pass(store, |record| match kind {
        RebuildKind::Words => {
            let word = analyzer.word_for(&record.hex, settings);
            replace(&mut record.word_match, word)
        }
        RebuildKind::Patterns => {
            let pattern = analyzer.pattern_for(&record.hex, settings);
            replace(&mut record.special_pattern, pattern)
        }
        RebuildKind::Analysis => {
            let best = analyzer
                .classify(&record.hex, &record.display_name, &settings.policy)
                .map(|r| r.best_match);
            replace(&mut record.best_match, best)
        }
        RebuildKind::Matches => {
            let top3 = analyzer
                .classify(&record.hex, &record.display_name, &settings.policy)
                .map(|r| r.top3);
            replace(&mut record.top3, top3)
        }
    });

    info!(
        kind = kind.as_str(),
        total = report.total,
        updated = report.updated,
        "rebuild finished"
    );
    report
}

pub fn rebuild_words(
    store: &RecordStore,
    analyzer: &Analyzer,
    settings: &AnalysisSettings,
) -> RebuildReport {
    rebuild(RebuildKind::Words, store, analyzer, settings)
}

pub fn rebuild_patterns(
    store: &RecordStore,
    analyzer: &Analyzer,
    settings: &AnalysisSettings,
) -> RebuildReport {
    rebuild(RebuildKind::Patterns, store, analyzer, settings)
}

pub fn rebuild_analysis(
    store: &RecordStore,
    analyzer: &Analyzer,
    settings: &AnalysisSettings,
) -> RebuildReport {
    rebuild(RebuildKind::Analysis, store, analyzer, settings)
}

pub fn rebuild_matches(
    store: &RecordStore,
    analyzer: &Analyzer,
    settings: &AnalysisSettings,
) -> RebuildReport {
    rebuild(RebuildKind::Matches, store, analyzer, settings)
}

fn run_pass<F>(store: &RecordStore, mut apply: F) -> RebuildReport
where
    F: FnMut(&mut Record) -> bool,
{
    let mut report = RebuildReport::default();
    for id in store.keys() {
        if let Some(changed) = store.update(&id, &mut apply) {
            report.total += 1;
            if changed {
                report.updated += 1;
            }
        }
    }
    report
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}
