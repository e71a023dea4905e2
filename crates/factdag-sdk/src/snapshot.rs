//! Materializing a database state from stored nodes.

use std::collections::HashSet;

use factdag_dag::NodesStorage;
use factdag_model::FactsDb;
use factdag_types::{Fact, Hash};

use crate::error::{SdkError, SdkResult};

/// Every fact visible at `head`, ancestors first.
///
/// Nodes are visited in post-order, first parent before second, and each node
/// contributes its facts once even when reachable through several paths.
pub fn history_facts(nodes: &NodesStorage, head: &Hash) -> SdkResult<Vec<Fact>> {
    enum Visit {
        Enter(Hash),
        Exit(Vec<Fact>),
    }

    let mut stack = vec![Visit::Enter(*head)];
    let mut seen = HashSet::new();
    let mut facts = Vec::new();

    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(hash) => {
                if !seen.insert(hash) {
                    continue;
                }
                let node = nodes.load(&hash)?.ok_or(SdkError::NodeNotFound(hash))?;
                let parents = node.parents();
                stack.push(Visit::Exit(node.data.facts));
                stack.extend(parents.into_iter().rev().map(Visit::Enter));
            }
            Visit::Exit(node_facts) => facts.extend(node_facts),
        }
    }
    Ok(facts)
}

/// An in-memory snapshot of the database state at `head`.
pub fn snapshot(nodes: &NodesStorage, head: &Hash) -> SdkResult<FactsDb> {
    Ok(FactsDb::from_facts(history_facts(nodes, head)?)?)
}
