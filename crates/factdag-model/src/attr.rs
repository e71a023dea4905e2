//! Attribute definitions.
//!
//! An [`Attr`] is one of four shapes, crossing scalar/list with
//! value/reference. Attributes are plain values: equality, hashing and
//! ordering cover the name, data type, uniqueness and shape, so they can key
//! entity maps directly.

use std::cmp::Ordering;
use std::fmt;

use factdag_types::{DataType, Eid, Fact, Value};

use crate::entity::{Entity, EntityValue};
use crate::error::{ModelError, ModelResult};
use crate::key::Key;
use crate::meta;

/// Definition shared by every attribute shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AttrDef {
    name: Key,
    data_type: DataType,
    unique: bool,
}

/// The structural shape of an attribute or value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Shape {
    Scalar,
    List,
    Ref,
    RefList,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Shape::Scalar => "scalar",
            Shape::List => "list",
            Shape::Ref => "reference",
            Shape::RefList => "reference-list",
        };
        f.write_str(s)
    }
}

/// An attribute definition.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Attr {
    /// One value of a non-reference type.
    Scalar(AttrDef),
    /// An ordered list of values of a non-reference type.
    List(AttrDef),
    /// A reference to exactly one entity.
    Ref(AttrDef),
    /// An ordered list of entity references.
    RefList(AttrDef),
}

impl Attr {
    /// A single-valued attribute. `data_type` must not be [`DataType::Ref`].
    pub fn scalar(name: &str, data_type: DataType) -> ModelResult<Self> {
        Ok(Attr::Scalar(value_def(name, data_type)?))
    }

    /// A list-valued attribute. `data_type` must not be [`DataType::Ref`].
    pub fn list(name: &str, data_type: DataType) -> ModelResult<Self> {
        Ok(Attr::List(value_def(name, data_type)?))
    }

    /// A reference to one entity.
    pub fn reference(name: &str) -> ModelResult<Self> {
        Ok(Attr::Ref(ref_def(name)?))
    }

    /// An ordered list of entity references.
    pub fn ref_list(name: &str) -> ModelResult<Self> {
        Ok(Attr::RefList(ref_def(name)?))
    }

    pub(crate) fn builtin_scalar(ns: &[&str], name: &str, data_type: DataType) -> Self {
        Attr::Scalar(AttrDef {
            name: Key::builtin(ns, name),
            data_type,
            unique: false,
        })
    }

    /// Rebuild an attribute from the values of its four schema facts.
    pub fn from_meta(name: &str, type_code: u8, unique: bool, list: bool) -> ModelResult<Self> {
        let data_type = DataType::from_code(type_code)?;
        let attr = match (data_type, list) {
            (DataType::Ref, false) => Attr::reference(name)?,
            (DataType::Ref, true) => Attr::ref_list(name)?,
            (_, false) => Attr::scalar(name, data_type)?,
            (_, true) => Attr::list(name, data_type)?,
        };
        Ok(if unique { attr.unique() } else { attr })
    }

    /// This attribute with values constrained to be unique across entities.
    pub fn unique(mut self) -> Self {
        self.def_mut().unique = true;
        self
    }

    fn def(&self) -> &AttrDef {
        match self {
            Attr::Scalar(def) | Attr::List(def) | Attr::Ref(def) | Attr::RefList(def) => def,
        }
    }

    fn def_mut(&mut self) -> &mut AttrDef {
        match self {
            Attr::Scalar(def) | Attr::List(def) | Attr::Ref(def) | Attr::RefList(def) => def,
        }
    }

    pub fn name(&self) -> &Key {
        &self.def().name
    }

    pub fn data_type(&self) -> DataType {
        self.def().data_type
    }

    pub fn is_unique(&self) -> bool {
        self.def().unique
    }

    pub fn shape(&self) -> Shape {
        match self {
            Attr::Scalar(_) => Shape::Scalar,
            Attr::List(_) => Shape::List,
            Attr::Ref(_) => Shape::Ref,
            Attr::RefList(_) => Shape::RefList,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Attr::List(_) | Attr::RefList(_))
    }

    pub fn is_ref(&self) -> bool {
        matches!(self, Attr::Ref(_) | Attr::RefList(_))
    }

    /// Pair this attribute with `value`, checking shape and data type.
    pub fn eq_to(&self, value: impl Into<EntityValue>) -> ModelResult<AttrValue> {
        let value = value.into();
        self.check(&value)?;
        Ok(AttrValue {
            attr: self.clone(),
            value,
        })
    }

    fn check(&self, value: &EntityValue) -> ModelResult<()> {
        match (self, value) {
            (Attr::Scalar(def), EntityValue::Scalar(v)) => def.check_type(v),
            (Attr::List(def), EntityValue::List(vs)) => vs.iter().try_for_each(|v| def.check_type(v)),
            (Attr::Ref(_), EntityValue::Ref(_)) => Ok(()),
            (Attr::RefList(_), EntityValue::RefList(_)) => Ok(()),
            _ => Err(ModelError::ShapeMismatch {
                attr: self.name().to_string(),
                expected: self.shape(),
                actual: value.shape(),
            }),
        }
    }

    /// The four schema facts describing this attribute, in the order
    /// name, type, unique, list.
    pub fn to_facts(&self, eid: Eid) -> Vec<Fact> {
        vec![
            Fact::new(eid, meta::name().name().to_string(), self.name().to_string()),
            Fact::new(eid, meta::data_type().name().to_string(), self.data_type().code()),
            Fact::new(eid, meta::unique().name().to_string(), self.is_unique()),
            Fact::new(eid, meta::list().name().to_string(), self.is_list()),
        ]
    }
}

impl AttrDef {
    fn check_type(&self, value: &Value) -> ModelResult<()> {
        if value.data_type() == self.data_type {
            Ok(())
        } else {
            Err(ModelError::TypeMismatch {
                attr: self.name.to_string(),
                expected: self.data_type,
                actual: value.data_type(),
            })
        }
    }
}

fn value_def(name: &str, data_type: DataType) -> ModelResult<AttrDef> {
    let name = Key::parse(name)?;
    if data_type == DataType::Ref {
        return Err(ModelError::InvalidDataType {
            attr: name.to_string(),
            data_type,
        });
    }
    Ok(AttrDef {
        name,
        data_type,
        unique: false,
    })
}

fn ref_def(name: &str) -> ModelResult<AttrDef> {
    Ok(AttrDef {
        name: Key::parse(name)?,
        data_type: DataType::Ref,
        unique: false,
    })
}

impl Ord for Attr {
    fn cmp(&self, other: &Self) -> Ordering {
        let key = |a: &Attr| (a.name().clone(), a.shape(), a.data_type(), a.is_unique());
        key(self).cmp(&key(other))
    }
}

impl PartialOrd for Attr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.name(), self.shape(), self.data_type())
    }
}

/// Attributes describe themselves through the schema meta-attributes.
impl Entity for Attr {
    fn eid(&self) -> Option<Eid> {
        None
    }

    fn keys(&self) -> Vec<Attr> {
        vec![meta::name(), meta::data_type(), meta::unique(), meta::list()]
    }

    fn try_get(&self, attr: &Attr) -> Option<EntityValue> {
        let value = if *attr == meta::name() {
            Value::from(self.name().to_string())
        } else if *attr == meta::data_type() {
            Value::from(self.data_type().code())
        } else if *attr == meta::unique() {
            Value::from(self.is_unique())
        } else if *attr == meta::list() {
            Value::from(self.is_list())
        } else {
            return None;
        };
        Some(EntityValue::Scalar(value))
    }
}

/// An attribute paired with a value that fits it.
///
/// Only constructed through [`Attr::eq_to`].
#[derive(Clone, Debug, PartialEq)]
pub struct AttrValue {
    attr: Attr,
    value: EntityValue,
}

impl AttrValue {
    pub fn attr(&self) -> &Attr {
        &self.attr
    }

    pub fn value(&self) -> &EntityValue {
        &self.value
    }

    pub fn into_parts(self) -> (Attr, EntityValue) {
        (self.attr, self.value)
    }
}
