//! Entities: attribute maps with an optional identity.
//!
//! All entity types are persistent values. `with` and `remove` return a new
//! entity and leave the receiver untouched; unchanged maps are shared
//! between versions through an `Arc`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use factdag_types::{Eid, Value};

use crate::attr::{Attr, AttrValue, Shape};
use crate::db::{pull, Db};
use crate::error::{ModelError, ModelResult};
use crate::graph::EntityHandle;
use crate::meta;

/// Attribute map backing every entity.
pub type AttrMap = BTreeMap<Attr, EntityValue>;

/// The value held by one attribute of an entity.
#[derive(Clone, Debug, PartialEq)]
pub enum EntityValue {
    Scalar(Value),
    List(Vec<Value>),
    Ref(RefValue),
    RefList(Vec<RefValue>),
}

impl EntityValue {
    pub fn shape(&self) -> Shape {
        match self {
            EntityValue::Scalar(_) => Shape::Scalar,
            EntityValue::List(_) => Shape::List,
            EntityValue::Ref(_) => Shape::Ref,
            EntityValue::RefList(_) => Shape::RefList,
        }
    }

    /// A reference list pointing at graph entities.
    pub fn handles(handles: impl IntoIterator<Item = EntityHandle>) -> Self {
        EntityValue::RefList(handles.into_iter().map(RefValue::Handle).collect())
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            EntityValue::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&RefValue> {
        match self {
            EntityValue::Ref(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_ref_list(&self) -> Option<&[RefValue]> {
        match self {
            EntityValue::RefList(rs) => Some(rs),
            _ => None,
        }
    }
}

impl From<Value> for EntityValue {
    fn from(v: Value) -> Self {
        EntityValue::Scalar(v)
    }
}

impl From<Vec<Value>> for EntityValue {
    fn from(vs: Vec<Value>) -> Self {
        EntityValue::List(vs)
    }
}

impl From<RefValue> for EntityValue {
    fn from(r: RefValue) -> Self {
        EntityValue::Ref(r)
    }
}

impl From<Vec<RefValue>> for EntityValue {
    fn from(rs: Vec<RefValue>) -> Self {
        EntityValue::RefList(rs)
    }
}

impl From<EntityHandle> for EntityValue {
    fn from(h: EntityHandle) -> Self {
        EntityValue::Ref(RefValue::Handle(h))
    }
}

impl From<Eid> for EntityValue {
    fn from(eid: Eid) -> Self {
        EntityValue::Ref(RefValue::Eid(eid))
    }
}

/// The target of a reference.
#[derive(Clone, Debug)]
pub enum RefValue {
    /// An entity in an [`EntityGraph`](crate::EntityGraph), possibly not yet
    /// identified.
    Handle(EntityHandle),
    /// A stored entity, not yet pulled.
    Eid(Eid),
    /// A stored entity, pulled from a database snapshot.
    Entity(Box<AttachedEntity>),
}

impl RefValue {
    /// The target's eid, if the target is identified.
    pub fn eid(&self) -> Option<Eid> {
        match self {
            RefValue::Handle(_) => None,
            RefValue::Eid(eid) => Some(*eid),
            RefValue::Entity(entity) => Some(entity.eid),
        }
    }
}

/// References are equal when they target the same eid, or the same graph
/// entity when either side is unidentified.
impl PartialEq for RefValue {
    fn eq(&self, other: &Self) -> bool {
        match (self.eid(), other.eid()) {
            (Some(a), Some(b)) => a == b,
            _ => matches!((self, other), (RefValue::Handle(a), RefValue::Handle(b)) if a == b),
        }
    }
}

/// Read view shared by every kind of entity.
pub trait Entity {
    fn eid(&self) -> Option<Eid>;

    /// Attributes present on the entity.
    fn keys(&self) -> Vec<Attr>;

    /// The value of `attr`, or `None` if absent.
    fn try_get(&self, attr: &Attr) -> Option<EntityValue>;

    /// The value of `attr`, failing with [`ModelError::MissingAttribute`] if
    /// absent.
    fn get(&self, attr: &Attr) -> ModelResult<EntityValue> {
        self.try_get(attr)
            .ok_or_else(|| ModelError::MissingAttribute(attr.name().to_string()))
    }

    /// Every attribute with its value, as seen through `try_get`.
    fn entries(&self) -> Vec<(Attr, EntityValue)> {
        self.keys()
            .into_iter()
            .filter_map(|attr| self.try_get(&attr).map(|value| (attr, value)))
            .collect()
    }

    /// Every attribute with its value as held, references left unresolved.
    fn stored_entries(&self) -> Vec<(Attr, EntityValue)> {
        self.entries()
    }
}

/// An entity not bound to any database.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetachedEntity {
    eid: Option<Eid>,
    attrs: Arc<AttrMap>,
}

impl DetachedEntity {
    /// An empty, unidentified entity.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty entity with a known eid.
    pub fn identified(eid: Eid) -> Self {
        Self {
            eid: Some(eid),
            attrs: Arc::default(),
        }
    }

    /// Copy the visible state of any entity.
    pub fn from_entity<E: Entity + ?Sized>(entity: &E) -> Self {
        Self {
            eid: entity.eid(),
            attrs: Arc::new(entity.entries().into_iter().collect()),
        }
    }

    pub(crate) fn from_parts(eid: Option<Eid>, attrs: Arc<AttrMap>) -> Self {
        Self { eid, attrs }
    }

    /// This entity's attributes under `eid`.
    pub fn to_identified(&self, eid: Eid) -> Self {
        Self {
            eid: Some(eid),
            attrs: Arc::clone(&self.attrs),
        }
    }

    /// A copy with `value` set.
    pub fn with(&self, value: AttrValue) -> Self {
        let (attr, value) = value.into_parts();
        let mut attrs = Arc::clone(&self.attrs);
        Arc::make_mut(&mut attrs).insert(attr, value);
        Self { eid: self.eid, attrs }
    }

    /// A copy with every value in `values` set, later values winning.
    pub fn with_values(&self, values: impl IntoIterator<Item = AttrValue>) -> Self {
        let mut attrs = Arc::clone(&self.attrs);
        let map = Arc::make_mut(&mut attrs);
        for value in values {
            let (attr, value) = value.into_parts();
            map.insert(attr, value);
        }
        Self { eid: self.eid, attrs }
    }

    /// A copy without `attr`.
    pub fn remove(&self, attr: &Attr) -> Self {
        if !self.attrs.contains_key(attr) {
            return self.clone();
        }
        let mut attrs = Arc::clone(&self.attrs);
        Arc::make_mut(&mut attrs).remove(attr);
        Self { eid: self.eid, attrs }
    }

    /// Raw attribute map, references unresolved.
    pub fn attrs(&self) -> &AttrMap {
        &self.attrs
    }
}

impl Entity for DetachedEntity {
    fn eid(&self) -> Option<Eid> {
        self.eid
    }

    fn keys(&self) -> Vec<Attr> {
        self.attrs.keys().cloned().collect()
    }

    fn try_get(&self, attr: &Attr) -> Option<EntityValue> {
        self.attrs.get(attr).cloned()
    }
}

/// An entity bound to a database snapshot.
///
/// References stored as eids are pulled from the snapshot each time they are
/// read. A reference whose target cannot be pulled reads as absent; inside a
/// reference list, such targets are skipped.
#[derive(Clone)]
pub struct AttachedEntity {
    eid: Eid,
    attrs: Arc<AttrMap>,
    db: Arc<dyn Db>,
    dirty: bool,
}

impl AttachedEntity {
    /// A clean entity as pulled from `db`.
    pub fn new(eid: Eid, attrs: AttrMap, db: Arc<dyn Db>) -> Self {
        Self {
            eid,
            attrs: Arc::new(attrs),
            db,
            dirty: false,
        }
    }

    pub fn eid(&self) -> Eid {
        self.eid
    }

    /// Whether this entity has local changes not present in its snapshot.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether `other` is the very same entity state as `self`.
    pub fn shares_state_with(&self, other: &AttachedEntity) -> bool {
        self.eid == other.eid && self.dirty == other.dirty && Arc::ptr_eq(&self.attrs, &other.attrs)
    }

    /// A copy with `value` set.
    ///
    /// If the visible value already equals `value`, returns an entity sharing
    /// this one's state, and the dirty flag is left as is.
    pub fn with(&self, value: AttrValue) -> Self {
        if self.try_get(value.attr()).as_ref() == Some(value.value()) {
            return self.clone();
        }
        let (attr, value) = value.into_parts();
        let mut attrs = Arc::clone(&self.attrs);
        Arc::make_mut(&mut attrs).insert(attr, value);
        self.modified(attrs)
    }

    /// A copy without `attr`.
    pub fn remove(&self, attr: &Attr) -> Self {
        if !self.attrs.contains_key(attr) {
            return self.clone();
        }
        let mut attrs = Arc::clone(&self.attrs);
        Arc::make_mut(&mut attrs).remove(attr);
        self.modified(attrs)
    }

    /// The same state as an identified detached entity, references left
    /// unresolved.
    pub fn detach(&self) -> DetachedEntity {
        DetachedEntity::from_parts(Some(self.eid), Arc::clone(&self.attrs))
    }

    fn modified(&self, attrs: Arc<AttrMap>) -> Self {
        Self {
            eid: self.eid,
            attrs,
            db: Arc::clone(&self.db),
            dirty: true,
        }
    }

    fn resolve(&self, target: &RefValue) -> Option<RefValue> {
        match target {
            RefValue::Eid(eid) => pull(&self.db, *eid).map(|e| RefValue::Entity(Box::new(e))),
            other => Some(other.clone()),
        }
    }
}

impl Entity for AttachedEntity {
    fn eid(&self) -> Option<Eid> {
        Some(self.eid)
    }

    fn keys(&self) -> Vec<Attr> {
        self.attrs.keys().cloned().collect()
    }

    fn try_get(&self, attr: &Attr) -> Option<EntityValue> {
        match self.attrs.get(attr)? {
            EntityValue::Ref(target) => self.resolve(target).map(EntityValue::Ref),
            EntityValue::RefList(targets) => Some(EntityValue::RefList(
                targets.iter().filter_map(|t| self.resolve(t)).collect(),
            )),
            other => Some(other.clone()),
        }
    }

    fn stored_entries(&self) -> Vec<(Attr, EntityValue)> {
        self.attrs
            .iter()
            .map(|(attr, value)| (attr.clone(), value.clone()))
            .collect()
    }
}

impl fmt::Debug for AttachedEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachedEntity")
            .field("eid", &self.eid)
            .field("attrs", &self.attrs.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}

/// Marker for a deleted entity.
///
/// Answers only the tombstone attribute, as `true`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tombstone {
    eid: Eid,
}

impl Tombstone {
    pub fn new(eid: Eid) -> Self {
        Self { eid }
    }
}

impl Entity for Tombstone {
    fn eid(&self) -> Option<Eid> {
        Some(self.eid)
    }

    fn keys(&self) -> Vec<Attr> {
        vec![meta::tombstone()]
    }

    fn try_get(&self, attr: &Attr) -> Option<EntityValue> {
        (*attr == meta::tombstone()).then(|| EntityValue::Scalar(Value::Bool(true)))
    }
}
