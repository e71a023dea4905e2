//! Deterministic node serialization.
//!
//! The encoded form covers kind (with parent links), source, timestamp and
//! data, in that order. The hash field is excluded: it is derived from these
//! bytes.

use serde::{Deserialize, Serialize};

use factdag_crypto::ContentHasher;
use factdag_types::{DbUuid, Hash, Timestamp};

use crate::error::{DagError, DagResult};
use crate::node::{Node, NodeData, NodeKind};

#[derive(Serialize)]
struct BodyRef<'a> {
    kind: &'a NodeKind,
    source: &'a DbUuid,
    timestamp: &'a Timestamp,
    data: &'a NodeData,
}

#[derive(Deserialize)]
struct Body {
    kind: NodeKind,
    source: DbUuid,
    timestamp: Timestamp,
    data: NodeData,
}

fn body(node: &Node) -> BodyRef<'_> {
    BodyRef {
        kind: &node.kind,
        source: &node.source,
        timestamp: &node.timestamp,
        data: &node.data,
    }
}

/// Serialize the hashed body of `node`.
pub fn encode(node: &Node) -> DagResult<Vec<u8>> {
    bincode::serialize(&body(node)).map_err(DagError::Serialization)
}

/// Rebuild a node from its encoded body, stamping it with `hash`.
///
/// The hash is taken on trust; callers verify it before decoding.
pub fn decode(bytes: &[u8], hash: Hash) -> Result<Node, bincode::Error> {
    let body: Body = bincode::deserialize(bytes)?;
    Ok(Node {
        hash: Some(hash),
        kind: body.kind,
        source: body.source,
        timestamp: body.timestamp,
        data: body.data,
    })
}

/// The content hash of an encoded body.
pub fn hash_bytes(bytes: &[u8]) -> Hash {
    ContentHasher::NODE.hash(bytes)
}

/// The content hash `node` will be stored under.
///
/// The body is serialized straight into the hasher without buffering.
pub fn hash(node: &Node) -> DagResult<Hash> {
    let mut hasher = ContentHasher::NODE.streaming();
    bincode::serialize_into(&mut hasher, &body(node)).map_err(DagError::Serialization)?;
    Ok(hasher.finalize())
}
