//! JSON Lines observation input for `scan`

use std::fs;
use std::path::Path;

use seymour_core::{Observation, Result};
use tracing::warn;

/// Observations parsed from one input file
#[derive(Debug, Default)]
pub struct ObservationBatch {
    pub observations: Vec<Observation>,
    /// 1-based line numbers that failed to parse
    pub skipped: Vec<usize>,
}

pub fn read_observations(path: &Path) -> Result<ObservationBatch> {
    let content = fs::read_to_string(path)?;
    Ok(parse_observations(&content))
}

/// Blank lines and `#` comments are ignored; malformed lines are skipped
pub fn parse_observations(content: &str) -> ObservationBatch {
    let mut batch = ObservationBatch::default();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match serde_json::from_str::<Observation>(line) {
            Ok(observation) => batch.observations.push(observation),
            Err(e) => {
                warn!(line = index + 1, error = %e, "skipping malformed observation");
                batch.skipped.push(index + 1);
            }
        }
    }
    batch
}
