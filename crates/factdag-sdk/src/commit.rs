//! Appending nodes to the DAG.

use tracing::debug;

use factdag_dag::{Node, NodeData, NodesStorage};
use factdag_model::{compile_facts, meta, EntityGraph, EntityHandle, Unfolded};
use factdag_types::{DbUuid, Eids, Fact, Hash, Timestamp};

use crate::bootstrap::instance_eid;
use crate::error::{SdkError, SdkResult};

/// The hash of `parent`, checked to be present in `nodes`.
fn stored_hash(nodes: &NodesStorage, parent: &Node) -> SdkResult<Hash> {
    let Some(hash) = parent.hash else {
        return Err(SdkError::UnstoredParent(parent.summary()));
    };
    if nodes.contains(&hash)? {
        Ok(hash)
    } else {
        Err(SdkError::UnstoredParent(hash.to_hex()))
    }
}

/// Store a Leaf node on top of `parent` carrying `facts`.
pub async fn commit(
    nodes: &NodesStorage,
    parent: &Node,
    source: DbUuid,
    facts: Vec<Fact>,
) -> SdkResult<Node> {
    let parent_hash = stored_hash(nodes, parent)?;
    let leaf = Node::leaf(parent_hash, source, Timestamp::now(), NodeData::new(facts));
    let leaf = nodes.store(leaf).await?;
    debug!(parent = %parent_hash.short_hex(), node = ?leaf.hash, "committed leaf");
    Ok(leaf)
}

/// Store a Merge node joining `left` and `right`, carrying `facts`.
pub async fn merge(
    nodes: &NodesStorage,
    left: &Node,
    right: &Node,
    source: DbUuid,
    facts: Vec<Fact>,
) -> SdkResult<Node> {
    let left_hash = stored_hash(nodes, left)?;
    let right_hash = stored_hash(nodes, right)?;
    let node = Node::merge(left_hash, right_hash, source, Timestamp::now(), NodeData::new(facts));
    let node = nodes.store(node).await?;
    debug!(
        left = %left_hash.short_hex(),
        right = %right_hash.short_hex(),
        node = ?node.hash,
        "committed merge"
    );
    Ok(node)
}

/// Compile the entities reachable from `roots` and commit their facts.
///
/// When fresh eids were drawn from `eids`, the node also records the new
/// `next-eid` on the instance entity, so a supply rebuilt from the new node
/// continues where this one stopped. Returns the new node together with the
/// eids assigned to each entity.
pub async fn commit_graph(
    nodes: &NodesStorage,
    parent: &Node,
    source: DbUuid,
    graph: &EntityGraph,
    roots: &[EntityHandle],
    eids: &mut Eids,
) -> SdkResult<(Node, Unfolded)> {
    let before = eids.peek_local();
    let compiled = compile_facts(graph, roots, eids)?;
    let mut facts = compiled.facts;
    if eids.peek_local() != before {
        let next = eids
            .peek_local()
            .map_or(u64::from(u32::MAX) + 1, u64::from);
        facts.push(Fact::new(
            instance_eid(eids.iid()),
            meta::next_eid().name().to_string(),
            next as i64,
        ));
    }
    let node = commit(nodes, parent, source, facts).await?;
    Ok((node, compiled.unfolded))
}
