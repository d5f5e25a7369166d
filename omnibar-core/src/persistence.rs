//! Durable storage for the history log: atomic JSON writes and the
//! `HistoryStore` collaborator.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::PersistenceError;

/// Where the history log goes after every mutation.
pub trait HistoryStore: Send + Sync {
    /// Load previously saved entries, oldest first.
    fn load(&self) -> Result<Vec<String>, PersistenceError>;

    /// Replace the stored entries.
    fn save(&self, entries: &[String]) -> Result<(), PersistenceError>;
}

/// Atomically write JSON data to a file.
///
/// Serializes `data` to pretty-printed JSON, writes to a `.tmp` sibling file,
/// then renames over the target path. Creates parent directories if needed.
pub fn atomic_write_json<T: serde::Serialize>(path: &Path, data: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(data).map_err(io::Error::other)?;
    atomic_write(path, json.as_bytes())
}

/// Atomically write raw bytes to a file.
pub fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, data)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Load and deserialize JSON from a file.
///
/// Returns `Ok(None)` if the file doesn't exist.
pub fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> io::Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = std::fs::read_to_string(path)?;
    let value =
        serde_json::from_str(&data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(Some(value))
}

/// History stored as a JSON array of strings.
#[derive(Debug, Clone)]
pub struct JsonHistoryStore {
    path: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStore for JsonHistoryStore {
    fn load(&self) -> Result<Vec<String>, PersistenceError> {
        match load_json::<Vec<String>>(&self.path) {
            Ok(entries) => Ok(entries.unwrap_or_default()),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => Err(PersistenceError::Corrupt {
                path: self.path.clone(),
                message: e.to_string(),
            }),
            Err(source) => Err(PersistenceError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn save(&self, entries: &[String]) -> Result<(), PersistenceError> {
        atomic_write_json(&self.path, &entries).map_err(|source| PersistenceError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// In-process store; also counts saves so callers can observe durability writes.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    entries: Mutex<Vec<String>>,
    saves: Mutex<usize>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<String>) -> Self {
        Self {
            entries: Mutex::new(entries),
            saves: Mutex::new(0),
        }
    }

    /// Snapshot of the last saved entries.
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Number of `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|count| *count).unwrap_or(0)
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self) -> Result<Vec<String>, PersistenceError> {
        Ok(self.entries())
    }

    fn save(&self, entries: &[String]) -> Result<(), PersistenceError> {
        if let Ok(mut stored) = self.entries.lock() {
            *stored = entries.to_vec();
        }
        if let Ok(mut count) = self.saves.lock() {
            *count += 1;
        }
        Ok(())
    }
}
