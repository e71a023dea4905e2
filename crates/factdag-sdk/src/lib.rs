//! High-level factdag API.
//!
//! Ties the lower crates together: open a backend from [`DbConfig`],
//! bootstrap a database with [`init`], append nodes with [`commit`],
//! [`merge`] and [`commit_graph`], and rebuild a queryable [`snapshot`] of
//! any node.

pub mod bootstrap;
pub mod commit;
pub mod config;
pub mod error;
pub mod head;
pub mod snapshot;

pub use bootstrap::{bootstrap, init, instance_eid, user_eids, Initialized};
pub use commit::{commit, commit_graph, merge};
pub use config::{open_storage, DbConfig, StorageConfig};
pub use error::{SdkError, SdkResult};
pub use head::{read_head, write_head};
pub use snapshot::{history_facts, snapshot};
