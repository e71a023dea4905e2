use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::key::StoreKey;
use crate::traits::Storage;

const TEMP_PREFIX: &str = ".tmp-";

/// Filesystem storage: one file per key at `<root>/<namespace>/<name>`.
///
/// Writes go to a temporary file in the target directory and are then
/// renamed into place, so readers never observe a partially written value.
/// `add` uses a no-clobber rename and fails if the key appeared meanwhile.
#[derive(Debug)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Open (or create) storage rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "opened file storage");
        Ok(Self { root })
    }

    /// The storage root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, key: &StoreKey) -> PathBuf {
        self.root.join(key.namespace()).join(key.name())
    }

    fn write_temp(&self, key: &StoreKey, value: &[u8]) -> StoreResult<tempfile::NamedTempFile> {
        let dir = self.root.join(key.namespace());
        fs::create_dir_all(&dir)?;
        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(&dir)?;
        tmp.write_all(value)?;
        tmp.as_file().sync_all()?;
        Ok(tmp)
    }
}

impl Storage for FileStorage {
    fn has_key(&self, key: &StoreKey) -> StoreResult<bool> {
        Ok(self.path_of(key).try_exists()?)
    }

    fn load(&self, key: &StoreKey) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(self.path_of(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn add(&self, key: &StoreKey, value: &[u8]) -> StoreResult<()> {
        let path = self.path_of(key);
        if path.try_exists()? {
            return Err(StoreError::KeyExists(key.clone()));
        }
        let tmp = self.write_temp(key, value)?;
        match tmp.persist_noclobber(&path) {
            Ok(_) => Ok(()),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                Err(StoreError::KeyExists(key.clone()))
            }
            Err(e) => Err(e.error.into()),
        }
    }

    fn overwrite(&self, key: &StoreKey, value: &[u8]) -> StoreResult<()> {
        let tmp = self.write_temp(key, value)?;
        tmp.persist(self.path_of(key)).map_err(|e| e.error)?;
        Ok(())
    }

    fn keys(&self, namespace: &str) -> StoreResult<Vec<StoreKey>> {
        let dir = self.root.join(namespace);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            keys.push(StoreKey::new(namespace, name)?);
        }
        keys.sort();
        Ok(keys)
    }
}
