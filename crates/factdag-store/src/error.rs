use crate::key::StoreKey;

/// Errors from storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// `add` was called for a key that already holds a value.
    #[error("key already exists: {0}")]
    KeyExists(StoreKey),

    /// The key cannot be mapped onto the backend.
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },

    /// A backend lock was poisoned by a panicking writer.
    #[error("storage lock poisoned")]
    LockPoisoned,

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;
