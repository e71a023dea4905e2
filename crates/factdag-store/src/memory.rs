use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::key::StoreKey;
use crate::traits::Storage;

/// In-memory, HashMap-based storage.
///
/// Intended for tests and embedding. Values live behind a `RwLock` and are
/// cloned on read.
pub struct MemoryStorage {
    entries: RwLock<HashMap<StoreKey, Vec<u8>>>,
}

impl MemoryStorage {
    /// Create a new empty storage.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored values across all namespaces.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.entries.read().map_err(|_| StoreError::LockPoisoned)?.len())
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn has_key(&self, key: &StoreKey) -> StoreResult<bool> {
        let map = self.entries.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.contains_key(key))
    }

    fn load(&self, key: &StoreKey) -> StoreResult<Option<Vec<u8>>> {
        let map = self.entries.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.get(key).cloned())
    }

    fn add(&self, key: &StoreKey, value: &[u8]) -> StoreResult<()> {
        let mut map = self.entries.write().map_err(|_| StoreError::LockPoisoned)?;
        if map.contains_key(key) {
            return Err(StoreError::KeyExists(key.clone()));
        }
        map.insert(key.clone(), value.to_vec());
        Ok(())
    }

    fn overwrite(&self, key: &StoreKey, value: &[u8]) -> StoreResult<()> {
        let mut map = self.entries.write().map_err(|_| StoreError::LockPoisoned)?;
        map.insert(key.clone(), value.to_vec());
        Ok(())
    }

    fn keys(&self, namespace: &str) -> StoreResult<Vec<StoreKey>> {
        let map = self.entries.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut keys: Vec<StoreKey> = map
            .keys()
            .filter(|k| k.namespace() == namespace)
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}

impl std::fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.entries.read().map(|m| m.len()).unwrap_or(0);
        f.debug_struct("MemoryStorage")
            .field("entry_count", &count)
            .finish()
    }
}
