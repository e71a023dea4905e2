use factdag_types::{DataType, TypeError};

use crate::attr::Shape;
use crate::graph::EntityHandle;

/// Errors from the entity/attribute model.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ModelError {
    /// An attribute name does not parse as `ns.path/name`.
    #[error("malformed key {key:?}: {reason}")]
    MalformedKey { key: String, reason: &'static str },

    /// A value's shape does not fit the attribute.
    #[error("attribute {attr} expects a {expected} value, got {actual}")]
    ShapeMismatch {
        attr: String,
        expected: Shape,
        actual: Shape,
    },

    /// A value's data type does not fit the attribute.
    #[error("attribute {attr} expects {expected} values, got {actual}")]
    TypeMismatch {
        attr: String,
        expected: DataType,
        actual: DataType,
    },

    /// A value attribute was declared with the reference data type.
    #[error("attribute {attr} cannot hold {data_type} values")]
    InvalidDataType { attr: String, data_type: DataType },

    /// `get` on an attribute the entity does not hold.
    #[error("missing attribute: {0}")]
    MissingAttribute(String),

    /// A reference points at an entity that was not unfolded.
    #[error("unresolved reference to entity {0}")]
    UnresolvedReference(EntityHandle),

    /// A handle that does not belong to the graph.
    #[error("unknown entity handle {0}")]
    UnknownHandle(EntityHandle),

    /// Facts were requested for an entity without an eid.
    #[error("entity has no eid")]
    Unidentified,

    /// The eid supply ran dry during unfolding.
    #[error("entity id supply exhausted")]
    EidsExhausted,

    /// A fact names an attribute absent from the schema.
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Result alias for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
