//! Error types for node storage.

use factdag_store::StoreError;
use factdag_types::Hash;

/// Errors that can occur while storing or loading nodes.
#[derive(Debug, thiserror::Error)]
pub enum DagError {
    /// Stored bytes do not belong to the node they are stored under.
    #[error("integrity violation for node {hash}")]
    Integrity {
        hash: Hash,
        #[source]
        cause: IntegrityCause,
    },

    /// A node carried a hash that disagrees with its content.
    #[error("node claims hash {claimed} but its content hashes to {computed}")]
    HashInconsistency { claimed: Hash, computed: Hash },

    /// A node reachable from a requested head is not in the source storage.
    #[error("node not found: {0}")]
    NodeNotFound(Hash),

    /// A key in the nodes namespace is not a hex-encoded hash.
    #[error("malformed node key: {0}")]
    MalformedKey(String),

    /// Serialization failure while encoding a node.
    #[error("serialization error: {0}")]
    Serialization(#[source] bincode::Error),

    /// The writer thread is gone and can no longer accept nodes.
    #[error("node writer stopped")]
    WriterStopped,

    /// Error from the raw storage backend.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// Failed to start the writer thread.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a stored node failed verification.
#[derive(Debug, thiserror::Error)]
pub enum IntegrityCause {
    #[error("stored bytes hash to {computed}")]
    HashMismatch { computed: Hash },

    #[error("stored bytes do not decode: {0}")]
    Decode(#[source] bincode::Error),
}

/// Convenience alias for node storage results.
pub type DagResult<T> = Result<T, DagError>;
