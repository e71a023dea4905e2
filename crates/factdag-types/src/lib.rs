//! Foundation types for factdag.
//!
//! This crate provides the identity, temporal, and value types shared by
//! every other factdag crate.
//!
//! # Key Types
//!
//! - [`Hash`]: Content-addressed node identifier (BLAKE3 digest)
//! - [`Eid`]: Database-scoped entity identifier
//! - [`Eids`]: Lazy supply of fresh entity identifiers
//! - [`DbUuid`]: Identity of a database instance, recorded as a node's source
//! - [`Timestamp`]: Wall-clock milliseconds stamped on every node
//! - [`Value`] / [`DataType`]: The scalar value domain with stable type codes
//! - [`Fact`]: The atomic entity/attribute/value triple

pub mod eid;
pub mod error;
pub mod fact;
pub mod hash;
pub mod instance;
pub mod temporal;
pub mod value;

pub use eid::{Eid, Eids};
pub use error::TypeError;
pub use fact::Fact;
pub use hash::Hash;
pub use instance::DbUuid;
pub use temporal::Timestamp;
pub use value::{DataType, Value};
