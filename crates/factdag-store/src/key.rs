use std::fmt;

use crate::error::{StoreError, StoreResult};

/// Address of a value in a [`Storage`](crate::Storage) backend.
///
/// Keys are two-level: a namespace (`nodes`, `refs`) and a name within it.
/// Both parts must be non-empty, must not start with `.`, and must not
/// contain path separators, so every key maps to exactly one file.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreKey {
    namespace: String,
    name: String,
}

impl StoreKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> StoreResult<Self> {
        let namespace = namespace.into();
        let name = name.into();
        validate_part(&namespace)?;
        validate_part(&name)?;
        Ok(Self { namespace, name })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

fn validate_part(part: &str) -> StoreResult<()> {
    let reason = if part.is_empty() {
        "empty key segment"
    } else if part.starts_with('.') {
        "key segment starts with '.'"
    } else if part.contains(['/', '\\', '\0']) {
        "key segment contains a separator"
    } else {
        return Ok(());
    };
    Err(StoreError::InvalidKey {
        key: part.to_string(),
        reason,
    })
}

impl fmt::Debug for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoreKey({}/{})", self.namespace, self.name)
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
