//! In-memory reference storage backend.

use fxhash::FxHashMap;
use parking_lot::RwLock;

use crate::path::Path;
use crate::value::Value;

use super::{Storage, StorageError};

/// Process-local storage backed by a hash map under a reader/writer lock.
///
/// Reads take the shared lock, writes the exclusive one. Values are cloned
/// out on read, so no lock is held while callers inspect them.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<FxHashMap<String, Value>>,
}

impl MemoryStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl std::fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStorage")
            .field("entries", &self.len())
            .finish()
    }
}

impl Storage for MemoryStorage {
    fn set(&self, path: &Path, value: Value) -> Result<(), StorageError> {
        self.entries.write().insert(path.to_string(), value);
        Ok(())
    }

    fn get(&self, path: &Path) -> Result<Value, StorageError> {
        self.entries
            .read()
            .get(&path.to_string())
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    fn all_keys(&self) -> Result<Vec<Path>, StorageError> {
        // Snapshot the keys under the read lock, parse and sort outside it.
        let keys: Vec<String> = self.entries.read().keys().cloned().collect();
        let mut paths = Vec::with_capacity(keys.len());
        for key in &keys {
            paths.push(Path::parse(key)?);
        }
        paths.sort_unstable();
        Ok(paths)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
