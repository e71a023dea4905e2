//! Raw key/value storage for factdag.
//!
//! The [`Storage`] trait is the contract node storage and the head pointer are
//! written through. Backends never interpret the bytes they hold.
//!
//! - [`MemoryStorage`]: `RwLock<HashMap>` backend for tests and embedding
//! - [`FileStorage`]: one file per key under `<root>/<namespace>/<name>`

pub mod error;
pub mod file;
pub mod key;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::FileStorage;
pub use key::StoreKey;
pub use memory::MemoryStorage;
pub use traits::Storage;
