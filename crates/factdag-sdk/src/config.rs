use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use factdag_store::{FileStorage, MemoryStorage, Storage};

use crate::error::{SdkError, SdkResult};

/// Configuration of a database instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Instance id, the upper half of every eid this instance mints.
    pub iid: u32,
    /// Where nodes and the head pointer are kept.
    pub storage: StorageConfig,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            iid: 0,
            storage: StorageConfig::Memory,
        }
    }
}

impl DbConfig {
    /// Parse a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(s: &str) -> SdkResult<Self> {
        toml::from_str(s).map_err(|e| SdkError::Config(e.to_string()))
    }
}

/// Storage backend selection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StorageConfig {
    /// Volatile in-memory storage.
    #[default]
    Memory,
    /// One file per key below `root`.
    File { root: PathBuf },
}

/// Open the backend described by `config`.
pub fn open_storage(config: &StorageConfig) -> SdkResult<Arc<dyn Storage>> {
    Ok(match config {
        StorageConfig::Memory => Arc::new(MemoryStorage::new()),
        StorageConfig::File { root } => Arc::new(FileStorage::open(root)?),
    })
}
