//! Entity/attribute data model for factdag.
//!
//! - [`Key`]: namespaced attribute names, rendered `ns.path/name`
//! - [`Attr`]: attribute definitions in four shapes (scalar, list, reference,
//!   reference list), self-describing through the [`meta`] attributes
//! - [`DetachedEntity`] / [`AttachedEntity`] / [`Tombstone`]: persistent
//!   entity values behind the [`Entity`] read view
//! - [`Db`]: the snapshot attached entities resolve references against
//! - [`EntityGraph`] and [`compile_facts`]: turning a possibly cyclic graph
//!   of new entities into the flat fact list stored in a node

pub mod attr;
pub mod db;
pub mod entity;
pub mod error;
pub mod graph;
pub mod key;
pub mod meta;

pub use attr::{Attr, AttrValue, Shape};
pub use db::{pull, Db, FactsDb};
pub use entity::{AttachedEntity, AttrMap, DetachedEntity, Entity, EntityValue, RefValue, Tombstone};
pub use error::{ModelError, ModelResult};
pub use graph::{
    compile_facts, set_refs, to_facts, unfold_entities_graph, Compiled, EntityGraph,
    EntityHandle, Unfolded,
};
pub use key::{Key, Namespace};
