//! Persistence backends for the record store

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use serde_json::Value;
use tracing::{info, warn};

use crate::error::Result;
use crate::record::Record;

/// Where flushed record sets go
pub trait RecordSink: Send + Sync {
    /// Overwrite persisted state with the full record set
    fn persist(&self, records: &BTreeMap<String, Record>) -> Result<()>;

    /// Read back the persisted record set (empty if nothing was saved yet)
    fn load(&self) -> Result<BTreeMap<String, Record>>;
}

/// Pretty JSON object keyed by record id
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl RecordSink for JsonFileSink {
    fn persist(&self, records: &BTreeMap<String, Record>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(records)?;
        let temp = self.temp_path();
        fs::write(&temp, content)?;
        fs::rename(&temp, &self.path)?;

        info!(count = records.len(), path = %self.path.display(), "saved collection");
        Ok(())
    }

    fn load(&self) -> Result<BTreeMap<String, Record>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path)?;
        let raw: BTreeMap<String, Value> = serde_json::from_str(&content)?;

        let mut records = BTreeMap::new();
        for (id, value) in raw {
            match serde_json::from_value::<Record>(value) {
                Ok(mut record) => {
                    record.id.clone_from(&id);
                    records.insert(id, record);
                }
                Err(e) => warn!(%id, error = %e, "skipping unreadable record"),
            }
        }

        info!(count = records.len(), path = %self.path.display(), "loaded collection");
        Ok(records)
    }
}

/// In-memory sink, for tests and throwaway stores
#[derive(Debug, Default)]
pub struct MemorySink {
    saved: Mutex<BTreeMap<String, Record>>,
    persist_count: AtomicUsize,
    fail: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated sink, as if a previous run had saved `records`
    pub fn with_records(records: impl IntoIterator<Item = Record>) -> Self {
        let sink = Self::default();
        *sink.saved.lock().unwrap_or_else(PoisonError::into_inner) =
            records.into_iter().map(|r| (r.id.clone(), r)).collect();
        sink
    }

    /// Make subsequent `persist` calls fail
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn persist_count(&self) -> usize {
        self.persist_count.load(Ordering::SeqCst)
    }

    pub fn saved(&self) -> BTreeMap<String, Record> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RecordSink for MemorySink {
    fn persist(&self, records: &BTreeMap<String, Record>) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(std::io::Error::other("memory sink set to fail").into());
        }
        *self.saved.lock().unwrap_or_else(PoisonError::into_inner) = records.clone();
        self.persist_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn load(&self) -> Result<BTreeMap<String, Record>> {
        Ok(self.saved())
    }
}
