use crate::error::StoreResult;
use crate::key::StoreKey;

/// Raw key/value storage backend.
///
/// Implementations must satisfy these invariants:
/// - `add` never replaces: adding an existing key fails with
///   [`StoreError::KeyExists`](crate::StoreError::KeyExists).
/// - `overwrite` is the only way to replace a value. It is reserved for
///   mutable pointers such as the head reference.
/// - Concurrent calls from multiple threads are safe.
/// - Absence is `Ok(None)` / `Ok(false)`, never an error.
/// - All I/O errors are propagated, never silently ignored.
pub trait Storage: Send + Sync {
    /// Check whether a value is stored under `key`.
    fn has_key(&self, key: &StoreKey) -> StoreResult<bool>;

    /// Read the bytes stored under `key`.
    fn load(&self, key: &StoreKey) -> StoreResult<Option<Vec<u8>>>;

    /// Store `value` under a key that must not exist yet.
    fn add(&self, key: &StoreKey, value: &[u8]) -> StoreResult<()>;

    /// Store `value` under `key`, replacing any previous value.
    fn overwrite(&self, key: &StoreKey, value: &[u8]) -> StoreResult<()>;

    /// All keys in `namespace`, sorted.
    fn keys(&self, namespace: &str) -> StoreResult<Vec<StoreKey>>;
}
