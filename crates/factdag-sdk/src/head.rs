//! The mutable `refs/head` pointer to the current node.

use factdag_store::{Storage, StoreKey};
use factdag_types::Hash;

use crate::error::{SdkError, SdkResult};

pub const REFS_NAMESPACE: &str = "refs";
pub const HEAD_NAME: &str = "head";

fn head_key() -> SdkResult<StoreKey> {
    Ok(StoreKey::new(REFS_NAMESPACE, HEAD_NAME)?)
}

/// Point the head at `hash`, replacing any previous value.
pub fn write_head(storage: &dyn Storage, hash: &Hash) -> SdkResult<()> {
    storage.overwrite(&head_key()?, hash.to_hex().as_bytes())?;
    Ok(())
}

/// The current head, or `None` if the database was never initialized.
pub fn read_head(storage: &dyn Storage) -> SdkResult<Option<Hash>> {
    let Some(bytes) = storage.load(&head_key()?)? else {
        return Ok(None);
    };
    let text = std::str::from_utf8(&bytes).map_err(|e| SdkError::CorruptHead(e.to_string()))?;
    Hash::from_hex(text.trim())
        .map(Some)
        .map_err(|e| SdkError::CorruptHead(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use factdag_store::MemoryStorage;

    #[test]
    fn missing_head_is_none() {
        assert_eq!(read_head(&MemoryStorage::new()).unwrap(), None);
    }

    #[test]
    fn write_then_read() {
        let storage = MemoryStorage::new();
        let first = Hash::from_digest([1; 32]);
        let second = Hash::from_digest([2; 32]);
        write_head(&storage, &first).unwrap();
        write_head(&storage, &second).unwrap();
        assert_eq!(read_head(&storage).unwrap(), Some(second));
    }

    #[test]
    fn garbage_head_is_corrupt() {
        let storage = MemoryStorage::new();
        storage.overwrite(&head_key().unwrap(), b"zz").unwrap();
        assert!(matches!(read_head(&storage), Err(SdkError::CorruptHead(_))));
    }
}
