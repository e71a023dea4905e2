//! DAG node types.
//!
//! A [`Node`] is one immutable database state: the facts it adds plus links
//! to the states it was derived from. The hash is assigned by storage and is
//! never part of the hashed content.

use serde::{Deserialize, Serialize};

use factdag_types::{DbUuid, Fact, Hash, Timestamp};

/// A node in the database history DAG.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    /// Content hash, `None` until the node has been stored or loaded.
    pub hash: Option<Hash>,
    /// Root, Leaf, or Merge, with parent links.
    pub kind: NodeKind,
    /// The database instance that produced this node.
    pub source: DbUuid,
    /// Creation time.
    pub timestamp: Timestamp,
    /// The facts this node contributes.
    pub data: NodeData,
}

/// Structural variant of a node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// The bootstrap state. Has no parents.
    Root,
    /// A state derived from exactly one parent.
    Leaf { parent: Hash },
    /// A state joining two histories.
    Merge { parent1: Hash, parent2: Hash },
}

/// The payload of a node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeData {
    pub facts: Vec<Fact>,
}

impl NodeData {
    pub fn new(facts: Vec<Fact>) -> Self {
        Self { facts }
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

impl Node {
    pub fn root(source: DbUuid, timestamp: Timestamp, data: NodeData) -> Self {
        Self::unhashed(NodeKind::Root, source, timestamp, data)
    }

    pub fn leaf(parent: Hash, source: DbUuid, timestamp: Timestamp, data: NodeData) -> Self {
        Self::unhashed(NodeKind::Leaf { parent }, source, timestamp, data)
    }

    pub fn merge(
        parent1: Hash,
        parent2: Hash,
        source: DbUuid,
        timestamp: Timestamp,
        data: NodeData,
    ) -> Self {
        Self::unhashed(NodeKind::Merge { parent1, parent2 }, source, timestamp, data)
    }

    fn unhashed(kind: NodeKind, source: DbUuid, timestamp: Timestamp, data: NodeData) -> Self {
        Self {
            hash: None,
            kind,
            source,
            timestamp,
            data,
        }
    }

    /// This node stamped with `hash`.
    pub fn with_hash(mut self, hash: Hash) -> Self {
        self.hash = Some(hash);
        self
    }

    /// Parent hashes, in declaration order.
    pub fn parents(&self) -> Vec<Hash> {
        match &self.kind {
            NodeKind::Root => Vec::new(),
            NodeKind::Leaf { parent } => vec![*parent],
            NodeKind::Merge { parent1, parent2 } => vec![*parent1, *parent2],
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self.kind, NodeKind::Root)
    }

    /// Human-readable one-line summary.
    pub fn summary(&self) -> String {
        let kind = match self.kind {
            NodeKind::Root => "root",
            NodeKind::Leaf { .. } => "leaf",
            NodeKind::Merge { .. } => "merge",
        };
        let hash = self
            .hash
            .map(|h| h.short_hex())
            .unwrap_or_else(|| "unhashed".to_string());
        format!(
            "{kind} {hash} from {} ({} facts)",
            self.source.short_id(),
            self.data.len()
        )
    }
}
