//! Durable key/value storage
//!
//! The popup keeps its state in browser local storage. Here that is a [`KvStore`]:
//! synchronous `get`/`set` of JSON values by string key. [`FileStore`] persists the whole
//! map as one JSON object file; [`MemoryStore`] keeps it in memory only.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

use serde_json::Value;
use tracing::{debug, warn};

use crate::SyncError;

/// Synchronous key/value persistence shared by the rule store and settings
pub trait KvStore: Send + Sync {
    /// Read a value, `None` when the key was never written
    fn get(&self, key: &str) -> Option<Value>;

    /// Write a value, replacing any previous one
    ///
    /// # Errors
    ///
    /// Returns `SyncError` if the value could not be made durable.
    fn set(&self, key: &str, value: Value) -> Result<(), SyncError>;
}

type Entries = BTreeMap<String, Value>;

fn lock(entries: &Mutex<Entries>) -> MutexGuard<'_, Entries> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory store, contents are lost on drop
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Entries>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), SyncError> {
        lock(&self.entries).insert(key.to_owned(), value);
        Ok(())
    }
}

/// Store backed by a single JSON object file
///
/// The file is read once on [`FileStore::open`] and rewritten in full on every
/// [`KvStore::set`]. Writes go to a sibling temporary file which is then renamed over
/// the target, so a crash never leaves a half-written store behind.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<Entries>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`
    ///
    /// A missing file is an empty store. A file that cannot be parsed as a JSON object is
    /// also treated as empty; it is overwritten on the next write.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Io` if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SyncError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str::<Entries>(&text).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "ignoring malformed store file");
                Entries::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Entries::new(),
            Err(e) => return Err(SyncError::Io(e)),
        };

        debug!(path = %path.display(), keys = entries.len(), "opened store");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &Entries) -> Result<(), SyncError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &self.path).map_err(|e| SyncError::Storage {
            message: format!("failed to replace store file: {e}"),
            path: Some(self.path.clone()),
        })
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<Value> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), SyncError> {
        let mut entries = lock(&self.entries);
        entries.insert(key.to_owned(), value);
        self.persist(&entries)
    }
}
