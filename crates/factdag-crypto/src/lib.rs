//! Content hashing for factdag.
//!
//! Node identity is the domain-separated BLAKE3 digest of a node's
//! serialized body. No custom cryptography: this crate only wraps `blake3`.

pub mod hasher;

pub use hasher::{ContentHasher, StreamingHasher};
