//! Key-value snapshot persistence with file locking.
//!
//! Each key maps to one JSON document. Reads take a shared lock; writes
//! go through a locked temp file and an atomic rename, so a crashed
//! writer never leaves a half-written snapshot behind. A corrupt or
//! unreadable document degrades to "no value" with a warning rather than
//! failing the load.

use crate::error::{Error, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Persisted key for the full session ledger snapshot
pub const KEY_HISTORY: &str = "workout_history";
/// Persisted key for the current streak integer
pub const KEY_STREAK: &str = "workout_streak";
/// Persisted key for the derived stats cache
pub const KEY_STATS: &str = "workout_stats";

/// Key-value persistence provider
///
/// Values are JSON documents; callers serialize their own types. `set`
/// must be atomic with respect to concurrent readers of the same key.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;
    fn set(&self, key: &str, value: &serde_json::Value) -> Result<()>;

    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<serde_json::Value>>> {
        keys.iter().map(|key| self.get(key)).collect()
    }
}

// ============================================================================
// File-backed store
// ============================================================================

/// One JSON file per key under a data directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let path = self.key_path(key);
        if !path.exists() {
            tracing::debug!("No snapshot for key '{}'", key);
            return Ok(None);
        }

        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open {:?}: {}. Treating as absent.", path, e);
                return Ok(None);
            }
        };

        // Shared lock for reading
        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock {:?}: {}. Treating as absent.", path, e);
            return Ok(None);
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!("Failed to read {:?}: {}. Treating as absent.", path, e);
            return Ok(None);
        }

        file.unlock()?;

        match serde_json::from_str(&contents) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!("Failed to parse {:?}: {}. Treating as absent.", path, e);
                Ok(None)
            }
        }
    }

    fn set(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.key_path(key);

        // Unique temp file in the same directory for atomic rename
        let temp = NamedTempFile::new_in(&self.dir)?;

        // Exclusive lock on the temp file to serialize concurrent writers
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(value)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        // Atomically replace the old snapshot
        temp.persist(&path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved snapshot for key '{}' to {:?}", key, path);
        Ok(())
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Ephemeral store for tests and throwaway sessions
#[derive(Default)]
pub struct MemoryStore {
    values: std::cell::RefCell<std::collections::HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        self.values.borrow_mut().insert(key.into(), value.clone());
        Ok(())
    }
}
