use std::fmt;

use serde::{Deserialize, Serialize};

use crate::eid::Eid;
use crate::error::TypeError;

/// Data type of an attribute value, with a stable numeric code.
///
/// The codes are persisted in schema facts and must never be renumbered.
/// Whether an attribute holds a list is tracked separately and is never
/// folded into the code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DataType {
    Bool,
    Byte,
    Int,
    Long,
    Str,
    Bytes,
    Instant,
    Ref,
}

impl DataType {
    /// All data types in code order.
    pub const ALL: [DataType; 8] = [
        DataType::Bool,
        DataType::Byte,
        DataType::Int,
        DataType::Long,
        DataType::Str,
        DataType::Bytes,
        DataType::Instant,
        DataType::Ref,
    ];

    pub const fn code(self) -> u8 {
        match self {
            DataType::Bool => 0,
            DataType::Byte => 1,
            DataType::Int => 2,
            DataType::Long => 3,
            DataType::Str => 4,
            DataType::Bytes => 5,
            DataType::Instant => 6,
            DataType::Ref => 7,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, TypeError> {
        Self::ALL
            .get(code as usize)
            .copied()
            .ok_or(TypeError::UnknownTypeCode(code))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Bool => "bool",
            DataType::Byte => "byte",
            DataType::Int => "int",
            DataType::Long => "long",
            DataType::Str => "str",
            DataType::Bytes => "bytes",
            DataType::Instant => "instant",
            DataType::Ref => "ref",
        };
        f.write_str(name)
    }
}

/// A single scalar value.
///
/// `Instant` is milliseconds since the UNIX epoch. `Ref` points at another
/// entity by identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Byte(u8),
    Int(i32),
    Long(i64),
    Str(String),
    Bytes(Vec<u8>),
    Instant(i64),
    Ref(Eid),
}

impl Value {
    /// The data type this value belongs to.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Bool(_) => DataType::Bool,
            Value::Byte(_) => DataType::Byte,
            Value::Int(_) => DataType::Int,
            Value::Long(_) => DataType::Long,
            Value::Str(_) => DataType::Str,
            Value::Bytes(_) => DataType::Bytes,
            Value::Instant(_) => DataType::Instant,
            Value::Ref(_) => DataType::Ref,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_byte(&self) -> Option<u8> {
        match self {
            Value::Byte(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_ref_eid(&self) -> Option<Eid> {
        match self {
            Value::Ref(eid) => Some(*eid),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Byte(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Eid> for Value {
    fn from(v: Eid) -> Self {
        Value::Ref(v)
    }
}
