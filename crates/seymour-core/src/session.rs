//! Scan / export observation session
//!
//! Scanning adds new records to the store; exporting collects records into a
//! separate buffer without touching the store. Only one mode can be active.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::analysis::{is_tracked_item, AnalysisSettings, Analyzer};
use crate::error::{Result, SeymourError};
use crate::record::{Observation, Record};
use crate::store::{FlushOutcome, RecordStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObservationMode {
    #[default]
    Idle,
    Scanning,
    Exporting,
}

impl fmt::Display for ObservationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Scanning => f.write_str("scan"),
            Self::Exporting => f.write_str("export"),
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    mode: ObservationMode,
    export: IndexMap<String, Record>,
}

/// Owner of the observation mode, the export buffer and the store handle
#[derive(Debug)]
pub struct Session {
    analyzer: Analyzer,
    store: Arc<RecordStore>,
    settings: AnalysisSettings,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new(analyzer: Analyzer, store: Arc<RecordStore>, settings: AnalysisSettings) -> Self {
        Self {
            analyzer,
            store,
            settings,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn mode(&self) -> ObservationMode {
        self.lock().mode
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    pub fn start_scan(&self) -> Result<()> {
        self.enter(ObservationMode::Scanning)
    }

    pub fn start_export(&self) -> Result<()> {
        self.enter(ObservationMode::Exporting)
    }

    fn enter(&self, requested: ObservationMode) -> Result<()> {
        let mut state = self.lock();
        match state.mode {
            ObservationMode::Idle => {
                state.mode = requested;
                info!(mode = %requested, "observation started");
                Ok(())
            }
            active if active == requested => Ok(()),
            active => Err(SeymourError::ModeConflict { active, requested }),
        }
    }

    /// Feed a batch of observations. Returns how many new records it produced.
    pub fn observe(&self, observations: &[Observation]) -> usize {
        let mut state = self.lock();
        let mode = state.mode;
        if mode == ObservationMode::Idle {
            return 0;
        }

        let mut added = 0;
        for observation in observations {
            if !is_tracked_item(&observation.display_name) {
                debug!(name = %observation.display_name, "ignoring untracked item");
                continue;
            }

            let id = observation.id_or_generate();
            let seen = match mode {
                ObservationMode::Scanning => self.store.contains(&id),
                _ => state.export.contains_key(&id),
            };
            if seen {
                continue;
            }

            let mut with_id = observation.clone();
            with_id.id = Some(id.clone());
            let record = self.analyzer.analyze(&with_id, &self.settings);
            match mode {
                ObservationMode::Scanning => {
                    self.store.put(record);
                }
                _ => {
                    state.export.insert(id, record);
                }
            }
            added += 1;
        }

        if added > 0 {
            match mode {
                ObservationMode::Scanning => {
                    info!(added, total = self.store.len(), "scanned new pieces")
                }
                _ => info!(added, total = state.export.len(), "added pieces to export"),
            }
        }
        added
    }

    /// Leave scan mode and write the collection right away
    pub fn stop_scan(&self) -> FlushOutcome {
        {
            let mut state = self.lock();
            if state.mode == ObservationMode::Scanning {
                state.mode = ObservationMode::Idle;
            }
        }
        self.store.force_flush()
    }

    /// Leave export mode, handing back the buffered records in observation order
    pub fn stop_export(&self) -> Vec<Record> {
        let mut state = self.lock();
        if state.mode != ObservationMode::Exporting {
            return Vec::new();
        }
        state.mode = ObservationMode::Idle;
        std::mem::take(&mut state.export).into_values().collect()
    }

    pub fn export_len(&self) -> usize {
        self.lock().export.len()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
