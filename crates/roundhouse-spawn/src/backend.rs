//! Persistence backends for the spawn-point store.
//!
//! The store only sees this trait; the on-disk format is a JSON array of
//! [`SpawnRecord`]s (ordered, id-carrying). Anything that can load and
//! save that list works — the round core never touches the filesystem
//! itself.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::info;

use crate::{SpawnError, SpawnRecord};

/// Loads and saves the full spawn-point record list.
pub trait SpawnBackend: Send + 'static {
    /// Returns every persisted record, in stored order. A missing
    /// backing file is an empty store, not an error.
    fn load(&mut self) -> Result<Vec<SpawnRecord>, SpawnError>;

    /// Persists the full current record list, replacing what was there.
    fn save(&mut self, records: &[SpawnRecord]) -> Result<(), SpawnError>;
}

/// JSON-file backend: one pretty-printed array per store.
#[derive(Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SpawnBackend for JsonFileBackend {
    fn load(&mut self) -> Result<Vec<SpawnRecord>, SpawnError> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "no spawn point file yet, starting empty");
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&mut self, records: &[SpawnRecord]) -> Result<(), SpawnError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

/// In-memory backend for tests and embedders that persist elsewhere.
///
/// Clone-cheap; all clones share the same record list, so a test can
/// keep a clone and inspect what the store persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    records: Arc<Mutex<Vec<SpawnRecord>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<SpawnRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
        }
    }

    /// Snapshot of the currently persisted records.
    pub fn snapshot(&self) -> Vec<SpawnRecord> {
        self.guard().clone()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<SpawnRecord>> {
        match self.records.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl SpawnBackend for MemoryBackend {
    fn load(&mut self) -> Result<Vec<SpawnRecord>, SpawnError> {
        Ok(self.guard().clone())
    }

    fn save(&mut self, records: &[SpawnRecord]) -> Result<(), SpawnError> {
        *self.guard() = records.to_vec();
        Ok(())
    }
}
