//! Record store
//!
//! Keyed collection of [`Record`]s with dirty tracking. Mutations only mark
//! the store dirty and signal the flush worker; the write-back itself happens
//! in [`RecordStore::flush`] / [`RecordStore::force_flush`].
//!
//! ```text
//! Clean --mutation--> Dirty --flush--> Saving --ok--> Clean
//!                                        |--error / mutated meanwhile--> Dirty
//! ```

mod flusher;
mod sink;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock};

use tokio::sync::Notify;
use tracing::{debug, error};

use crate::error::Result;
use crate::record::Record;

pub use flusher::{FlushWorker, DEFAULT_DEBOUNCE};
pub use sink::{JsonFileSink, MemorySink, RecordSink};

/// Persistence state of a store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Clean,
    Dirty,
    Saving,
}

impl fmt::Display for StoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => f.write_str("clean"),
            Self::Dirty => f.write_str("dirty"),
            Self::Saving => f.write_str("saving"),
        }
    }
}

/// What a flush call did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Wrote this many records
    Flushed(usize),
    /// Nothing to write
    Clean,
    /// Another flush was in progress; nothing done
    AlreadySaving,
    /// The sink failed; the store stays dirty
    Failed(String),
}

impl FlushOutcome {
    pub fn is_flushed(&self) -> bool {
        matches!(self, Self::Flushed(_))
    }
}

#[derive(Debug)]
struct FlushStatus {
    state: StoreState,
    /// Bumped on every mutation; a save only cleans the generation it started from
    generation: u64,
}

pub struct RecordStore {
    records: RwLock<HashMap<String, Record>>,
    status: Mutex<FlushStatus>,
    save_finished: Condvar,
    flush_requested: Arc<Notify>,
    sink: Arc<dyn RecordSink>,
}

impl fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStore")
            .field("len", &self.len())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl RecordStore {
    /// Empty, clean store
    pub fn new(sink: Arc<dyn RecordSink>) -> Self {
        Self::with_records(sink, HashMap::new())
    }

    /// Store populated from whatever the sink has persisted
    pub fn open(sink: Arc<dyn RecordSink>) -> Result<Self> {
        let records = sink.load()?.into_iter().collect();
        Ok(Self::with_records(sink, records))
    }

    fn with_records(sink: Arc<dyn RecordSink>, records: HashMap<String, Record>) -> Self {
        Self {
            records: RwLock::new(records),
            status: Mutex::new(FlushStatus {
                state: StoreState::Clean,
                generation: 0,
            }),
            save_finished: Condvar::new(),
            flush_requested: Arc::new(Notify::new()),
            sink,
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn get(&self, id: &str) -> Option<Record> {
        self.read_records().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.read_records().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.read_records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_records().is_empty()
    }

    /// Ids present right now, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.read_records().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Copy of every record, keyed and ordered by id
    pub fn snapshot(&self) -> BTreeMap<String, Record> {
        self.read_records()
            .iter()
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect()
    }

    /// Copy of every record, ordered by id
    pub fn records(&self) -> Vec<Record> {
        self.snapshot().into_values().collect()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Insert or replace a record. Returns the replaced one.
    pub fn put(&self, record: Record) -> Option<Record> {
        let previous = self.write_records().insert(record.id.clone(), record);
        self.mark_dirty();
        previous
    }

    pub fn remove(&self, id: &str) -> Option<Record> {
        let removed = self.write_records().remove(id);
        if removed.is_some() {
            self.mark_dirty();
        }
        removed
    }

    /// Apply `f` to one record under the write lock.
    ///
    /// `f` returns whether it changed anything. Returns `None` if the record
    /// does not exist (e.g. removed concurrently).
    pub fn update<F>(&self, id: &str, f: F) -> Option<bool>
    where
        F: FnOnce(&mut Record) -> bool,
    {
        let changed = {
            let mut records = self.write_records();
            let record = records.get_mut(id)?;
            f(record)
        };
        if changed {
            self.mark_dirty();
        }
        Some(changed)
    }

    /// Remove everything and write the empty set immediately
    pub fn clear(&self) -> FlushOutcome {
        let removed = {
            let mut records = self.write_records();
            let n = records.len();
            records.clear();
            n
        };
        debug!(removed, "cleared collection");
        self.mark_dirty();
        self.force_flush()
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    pub fn state(&self) -> StoreState {
        self.lock_status().state
    }

    pub fn is_dirty(&self) -> bool {
        self.state() != StoreState::Clean
    }

    /// Ask the flush worker for a debounced flush
    pub fn request_flush(&self) {
        self.flush_requested.notify_one();
    }

    /// Signal the flush worker waits on
    pub fn flush_signal(&self) -> Arc<Notify> {
        Arc::clone(&self.flush_requested)
    }

    /// Write the current snapshot if dirty. No-op while another flush runs.
    pub fn flush(&self) -> FlushOutcome {
        let generation = {
            let mut status = self.lock_status();
            match status.state {
                StoreState::Saving => return FlushOutcome::AlreadySaving,
                StoreState::Clean => return FlushOutcome::Clean,
                StoreState::Dirty => {
                    status.state = StoreState::Saving;
                    status.generation
                }
            }
        };
        self.write_snapshot(generation)
    }

    /// Wait out any in-flight flush, then write if still dirty
    pub fn force_flush(&self) -> FlushOutcome {
        let generation = {
            let mut status = self.lock_status();
            while status.state == StoreState::Saving {
                status = self
                    .save_finished
                    .wait(status)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            if status.state == StoreState::Clean {
                return FlushOutcome::Clean;
            }
            status.state = StoreState::Saving;
            status.generation
        };
        self.write_snapshot(generation)
    }

    fn write_snapshot(&self, generation: u64) -> FlushOutcome {
        let snapshot = self.snapshot();
        let result = self.sink.persist(&snapshot);

        let mut status = self.lock_status();
        let outcome = match result {
            Ok(()) => {
                status.state = if status.generation == generation {
                    StoreState::Clean
                } else {
                    StoreState::Dirty
                };
                FlushOutcome::Flushed(snapshot.len())
            }
            Err(e) => {
                error!(error = %e, "failed to save collection");
                status.state = StoreState::Dirty;
                FlushOutcome::Failed(e.to_string())
            }
        };
        drop(status);
        self.save_finished.notify_all();
        outcome
    }

    fn mark_dirty(&self) {
        {
            let mut status = self.lock_status();
            status.generation = status.generation.wrapping_add(1);
            if status.state == StoreState::Clean {
                status.state = StoreState::Dirty;
            }
        }
        self.request_flush();
    }

    fn lock_status(&self) -> MutexGuard<'_, FlushStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_records(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Record>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_records(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Record>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }
}
