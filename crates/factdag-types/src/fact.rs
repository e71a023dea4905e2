use std::fmt;

use serde::{Deserialize, Serialize};

use crate::eid::Eid;
use crate::value::Value;

/// The atomic unit of stored data: "entity `eid` has `attr` = `value`".
///
/// `attr` is the canonical rendering of the attribute key (`ns.path/name`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fact {
    pub eid: Eid,
    pub attr: String,
    pub value: Value,
}

impl Fact {
    pub fn new(eid: Eid, attr: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            eid,
            attr: attr.into(),
            value: value.into(),
        }
    }
}

impl fmt::Debug for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {} {:?}]", self.eid, self.attr, self.value)
    }
}
