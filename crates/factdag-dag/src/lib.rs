//! Content-addressed DAG node storage for factdag.
//!
//! Every database state is a [`Node`] in a directed acyclic graph: a single
//! [`NodeKind::Root`] created at bootstrap, [`NodeKind::Leaf`] nodes extending
//! one parent, and [`NodeKind::Merge`] nodes joining two histories. A node is
//! identified by the domain-separated hash of its serialized body.
//!
//! [`NodesStorage`] persists nodes through a raw [`Storage`] backend:
//!
//! - writes are serialized through one dedicated writer thread, so the
//!   check-then-insert that deduplicates nodes never races
//! - reads recompute the hash of the stored bytes and reject anything that
//!   does not match its key
//!
//! [`Storage`]: factdag_store::Storage

pub mod codec;
pub mod error;
pub mod node;
pub mod storage;

pub use error::{DagError, DagResult, IntegrityCause};
pub use node::{Node, NodeData, NodeKind};
pub use storage::{node_key, NodesStorage, NODES_NAMESPACE};
