use thiserror::Error;

use factdag_types::{Eid, Hash};

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("parent node {0} is not stored")]
    UnstoredParent(String),

    #[error("stored node carries no hash: {0}")]
    Unhashed(String),

    #[error("head pointer is corrupt: {0}")]
    CorruptHead(String),

    #[error("eid {0} falls in the range reserved for built-in entities")]
    ReservedEid(Eid),

    #[error("instance {0} has no usable next-eid")]
    MissingNextEid(u32),

    #[error("node not found: {0}")]
    NodeNotFound(Hash),

    #[error("store error: {0}")]
    Store(#[from] factdag_store::StoreError),

    #[error("node storage error: {0}")]
    Dag(#[from] factdag_dag::DagError),

    #[error("model error: {0}")]
    Model(#[from] factdag_model::ModelError),
}

pub type SdkResult<T> = Result<T, SdkError>;
