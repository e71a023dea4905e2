//! Entity graphs and their compilation to facts.
//!
//! Entities reference each other by [`EntityHandle`], an index into an
//! [`EntityGraph`] arena. Handles stand in for object identity: two entities
//! with equal content are still distinct graph nodes.
//!
//! Compilation runs in three steps:
//!
//! 1. [`unfold_entities_graph`] walks every entity reachable from the roots
//!    and gives each one an eid, reusing existing eids.
//! 2. [`set_refs`] rewrites handle references to the eids assigned in step 1.
//! 3. [`to_facts`] flattens each identified entity to facts.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use factdag_types::{Eid, Fact, Value};

use crate::attr::Attr;
use crate::entity::{AttrMap, DetachedEntity, Entity, EntityValue, RefValue};
use crate::error::{ModelError, ModelResult};

/// Index of an entity in an [`EntityGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle(usize);

impl EntityHandle {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Arena of detached entities.
#[derive(Clone, Debug, Default)]
pub struct EntityGraph {
    entities: Vec<DetachedEntity>,
}

impl EntityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `entity` and return its handle.
    pub fn insert(&mut self, entity: DetachedEntity) -> EntityHandle {
        self.entities.push(entity);
        EntityHandle(self.entities.len() - 1)
    }

    /// Put `entity` in the slot of `handle`. Used to close reference cycles.
    pub fn replace(&mut self, handle: EntityHandle, entity: DetachedEntity) -> ModelResult<()> {
        let slot = self
            .entities
            .get_mut(handle.0)
            .ok_or(ModelError::UnknownHandle(handle))?;
        *slot = entity;
        Ok(())
    }

    pub fn get(&self, handle: EntityHandle) -> Option<&DetachedEntity> {
        self.entities.get(handle.0)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Graph entities mapped to their identified counterparts, in discovery
/// order.
#[derive(Clone, Debug, Default)]
pub struct Unfolded {
    order: Vec<EntityHandle>,
    identified: HashMap<EntityHandle, DetachedEntity>,
}

impl Unfolded {
    pub fn get(&self, handle: EntityHandle) -> Option<&DetachedEntity> {
        self.identified.get(&handle)
    }

    /// The eid assigned to `handle`.
    pub fn eid_of(&self, handle: EntityHandle) -> Option<Eid> {
        self.get(handle).and_then(|e| e.eid())
    }

    pub fn contains(&self, handle: EntityHandle) -> bool {
        self.identified.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entries in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityHandle, &DetachedEntity)> + '_ {
        self.order
            .iter()
            .filter_map(|h| self.identified.get(h).map(|e| (*h, e)))
    }
}

/// Identify every entity reachable from `roots`.
///
/// Traversal is depth-first. An entity is recorded before its references are
/// followed, so cycles terminate. Entities that already have an eid keep it;
/// the rest draw the next eid from `eids`.
pub fn unfold_entities_graph(
    graph: &EntityGraph,
    roots: &[EntityHandle],
    eids: &mut impl Iterator<Item = Eid>,
) -> ModelResult<Unfolded> {
    let mut unfolded = Unfolded::default();
    let mut stack: Vec<EntityHandle> = roots.iter().rev().copied().collect();

    while let Some(handle) = stack.pop() {
        if unfolded.contains(handle) {
            continue;
        }
        let entity = graph.get(handle).ok_or(ModelError::UnknownHandle(handle))?;
        let eid = match entity.eid() {
            Some(eid) => eid,
            None => eids.next().ok_or(ModelError::EidsExhausted)?,
        };
        unfolded.order.push(handle);
        unfolded.identified.insert(handle, entity.to_identified(eid));

        let children = referenced_handles(entity.attrs());
        stack.extend(children.into_iter().rev());
    }

    debug!(roots = roots.len(), entities = unfolded.len(), "unfolded entity graph");
    Ok(unfolded)
}

fn referenced_handles(attrs: &AttrMap) -> Vec<EntityHandle> {
    let mut handles = Vec::new();
    for value in attrs.values() {
        match value {
            EntityValue::Ref(RefValue::Handle(h)) => handles.push(*h),
            EntityValue::RefList(targets) => handles.extend(targets.iter().filter_map(|t| match t {
                RefValue::Handle(h) => Some(*h),
                _ => None,
            })),
            _ => {}
        }
    }
    handles
}

/// Rewrite handle references in `entity` to the eids assigned in `unfolded`.
pub fn set_refs(entity: &DetachedEntity, unfolded: &Unfolded) -> ModelResult<DetachedEntity> {
    let resolve = |target: &RefValue| -> ModelResult<RefValue> {
        match target {
            RefValue::Handle(h) => unfolded
                .eid_of(*h)
                .map(RefValue::Eid)
                .ok_or(ModelError::UnresolvedReference(*h)),
            other => Ok(other.clone()),
        }
    };

    let mut attrs = AttrMap::new();
    for (attr, value) in entity.attrs() {
        let value = match value {
            EntityValue::Ref(target) => EntityValue::Ref(resolve(target)?),
            EntityValue::RefList(targets) => EntityValue::RefList(
                targets.iter().map(&resolve).collect::<ModelResult<_>>()?,
            ),
            other => other.clone(),
        };
        attrs.insert(attr.clone(), value);
    }
    Ok(DetachedEntity::from_parts(entity.eid(), Arc::new(attrs)))
}

/// Flatten an identified entity to facts.
///
/// One fact per scalar, one per list element, one per reference and one per
/// reference-list element, all under the entity's eid. References are
/// taken as stored and never pulled.
pub fn to_facts<E: Entity + ?Sized>(entity: &E) -> ModelResult<Vec<Fact>> {
    let eid = entity.eid().ok_or(ModelError::Unidentified)?;
    let mut facts = Vec::new();
    for (attr, value) in entity.stored_entries() {
        let key = attr.name().to_string();
        match (&attr, value) {
            (Attr::Scalar(_), EntityValue::Scalar(v)) => facts.push(Fact::new(eid, key, v)),
            (Attr::List(_), EntityValue::List(vs)) => {
                facts.extend(vs.into_iter().map(|v| Fact::new(eid, key.clone(), v)));
            }
            (Attr::Ref(_), EntityValue::Ref(target)) => {
                facts.push(Fact::new(eid, key, ref_value(&target)?));
            }
            (Attr::RefList(_), EntityValue::RefList(targets)) => {
                for target in &targets {
                    facts.push(Fact::new(eid, key.clone(), ref_value(target)?));
                }
            }
            (_, value) => {
                return Err(ModelError::ShapeMismatch {
                    attr: key,
                    expected: attr.shape(),
                    actual: value.shape(),
                })
            }
        }
    }
    Ok(facts)
}

fn ref_value(target: &RefValue) -> ModelResult<Value> {
    match target {
        RefValue::Handle(h) => Err(ModelError::UnresolvedReference(*h)),
        RefValue::Eid(eid) => Ok(Value::Ref(*eid)),
        RefValue::Entity(entity) => Ok(Value::Ref(entity.eid())),
    }
}

/// The facts of an entity graph, ready to embed in a node.
#[derive(Clone, Debug)]
pub struct Compiled {
    pub facts: Vec<Fact>,
    pub unfolded: Unfolded,
}

/// Unfold `roots`, resolve references and flatten every reachable entity.
///
/// Facts are grouped by entity in discovery order.
pub fn compile_facts(
    graph: &EntityGraph,
    roots: &[EntityHandle],
    eids: &mut impl Iterator<Item = Eid>,
) -> ModelResult<Compiled> {
    let unfolded = unfold_entities_graph(graph, roots, eids)?;
    let mut facts = Vec::new();
    for (_, entity) in unfolded.iter() {
        facts.extend(to_facts(&set_refs(entity, &unfolded)?)?);
    }
    debug!(entities = unfolded.len(), facts = facts.len(), "compiled entity graph");
    Ok(Compiled { facts, unfolded })
}

#[cfg(test)]
mod tests {
    use super::*;
    use factdag_types::{DataType, Eids};
    use std::collections::HashSet;

    fn name() -> Attr {
        Attr::scalar("user/name", DataType::Str).unwrap()
    }

    fn friend() -> Attr {
        Attr::reference("user/friend").unwrap()
    }

    fn friends() -> Attr {
        Attr::ref_list("user/friends").unwrap()
    }

    fn tags() -> Attr {
        Attr::list("user/tags", DataType::Str).unwrap()
    }

    fn named(n: &str) -> DetachedEntity {
        DetachedEntity::new().with(name().eq_to(Value::from(n)).unwrap())
    }

    /// A references B, B references A.
    fn cycle() -> (EntityGraph, EntityHandle, EntityHandle) {
        let mut graph = EntityGraph::new();
        let a = graph.insert(named("a"));
        let b = graph.insert(named("b").with(friend().eq_to(a).unwrap()));
        let a_closed = graph.get(a).unwrap().with(friend().eq_to(b).unwrap());
        graph.replace(a, a_closed).unwrap();
        (graph, a, b)
    }

    // ----- unfolding -----

    #[test]
    fn cycles_terminate_with_one_eid_each() {
        let (graph, a, b) = cycle();
        let unfolded = unfold_entities_graph(&graph, &[a], &mut Eids::new(1, 0)).unwrap();
        assert_eq!(unfolded.len(), 2);
        assert_eq!(unfolded.eid_of(a), Some(Eid::new(1, 0)));
        assert_eq!(unfolded.eid_of(b), Some(Eid::new(1, 1)));
    }

    #[test]
    fn identified_entities_keep_their_eid() {
        let mut graph = EntityGraph::new();
        let known = graph.insert(DetachedEntity::identified(Eid::new(0, 42)));
        let fresh = graph.insert(named("new").with(friend().eq_to(known).unwrap()));
        let unfolded = unfold_entities_graph(&graph, &[fresh], &mut Eids::new(0, 100)).unwrap();
        assert_eq!(unfolded.eid_of(known), Some(Eid::new(0, 42)));
        assert_eq!(unfolded.eid_of(fresh), Some(Eid::new(0, 100)));
    }

    #[test]
    fn structurally_equal_entities_stay_distinct() {
        let mut graph = EntityGraph::new();
        let x = graph.insert(named("same"));
        let y = graph.insert(named("same"));
        let root = graph.insert(DetachedEntity::new().with(friends().eq_to(EntityValue::handles([x, y])).unwrap()));
        let unfolded = unfold_entities_graph(&graph, &[root], &mut Eids::new(0, 0)).unwrap();
        assert_eq!(unfolded.len(), 3);
        let eids: HashSet<Eid> = unfolded.iter().filter_map(|(_, e)| e.eid()).collect();
        assert_eq!(eids.len(), 3);
    }

    #[test]
    fn discovery_order_is_depth_first() {
        let mut graph = EntityGraph::new();
        let leaf = graph.insert(named("leaf"));
        let mid = graph.insert(named("mid").with(friend().eq_to(leaf).unwrap()));
        let other = graph.insert(named("other"));
        let root = graph.insert(
            named("root").with(friends().eq_to(EntityValue::handles([mid, other])).unwrap()),
        );
        let unfolded = unfold_entities_graph(&graph, &[root], &mut Eids::new(0, 0)).unwrap();
        let order: Vec<EntityHandle> = unfolded.iter().map(|(h, _)| h).collect();
        assert_eq!(order, vec![root, mid, leaf, other]);
    }

    #[test]
    fn unknown_handle_rejected() {
        let graph = EntityGraph::new();
        let bogus = EntityHandle::from_index(3);
        assert_eq!(
            unfold_entities_graph(&graph, &[bogus], &mut Eids::new(0, 0)).unwrap_err(),
            ModelError::UnknownHandle(bogus)
        );
    }

    #[test]
    fn exhausted_eids_rejected() {
        let (graph, a, _) = cycle();
        let err = unfold_entities_graph(&graph, &[a], &mut Eids::new(0, u32::MAX)).unwrap_err();
        assert_eq!(err, ModelError::EidsExhausted);
    }

    // ----- set_refs / to_facts -----

    #[test]
    fn set_refs_points_at_identified_eids() {
        let (graph, a, b) = cycle();
        let unfolded = unfold_entities_graph(&graph, &[a], &mut Eids::new(0, 0)).unwrap();
        let resolved = set_refs(unfolded.get(a).unwrap(), &unfolded).unwrap();
        assert_eq!(
            resolved.get(&friend()).unwrap(),
            EntityValue::Ref(RefValue::Eid(unfolded.eid_of(b).unwrap()))
        );
    }

    #[test]
    fn set_refs_fails_on_missing_target() {
        let mut graph = EntityGraph::new();
        let orphan = graph.insert(named("orphan"));
        let e = DetachedEntity::identified(Eid::new(0, 1)).with(friend().eq_to(orphan).unwrap());
        let err = set_refs(&e, &Unfolded::default()).unwrap_err();
        assert_eq!(err, ModelError::UnresolvedReference(orphan));
    }

    #[test]
    fn list_attribute_yields_one_fact_per_element() {
        let values: Vec<Value> = ["a", "b", "c"].into_iter().map(Value::from).collect();
        let e = DetachedEntity::identified(Eid::new(0, 1)).with(tags().eq_to(values).unwrap());
        let facts = to_facts(&e).unwrap();
        assert_eq!(facts.len(), 3);
        assert_eq!(
            facts.iter().map(|f| f.value.clone()).collect::<Vec<_>>(),
            vec![Value::from("a"), Value::from("b"), Value::from("c")]
        );
        assert!(facts.iter().all(|f| f.attr == "user/tags"));
    }

    #[test]
    fn ref_list_yields_one_fact_per_target() {
        let targets = vec![
            RefValue::Eid(Eid::new(0, 10)),
            RefValue::Eid(Eid::new(0, 11)),
            RefValue::Eid(Eid::new(0, 12)),
            RefValue::Eid(Eid::new(0, 13)),
        ];
        let e = DetachedEntity::identified(Eid::new(0, 1)).with(friends().eq_to(targets).unwrap());
        let facts = to_facts(&e).unwrap();
        assert_eq!(facts.len(), 4);
        assert_eq!(facts[2].value, Value::Ref(Eid::new(0, 12)));
    }

    #[test]
    fn to_facts_requires_eid() {
        assert_eq!(to_facts(&named("x")).unwrap_err(), ModelError::Unidentified);
    }

    #[test]
    fn to_facts_rejects_unresolved_handles() {
        let mut graph = EntityGraph::new();
        let target = graph.insert(named("t"));
        let e = DetachedEntity::identified(Eid::new(0, 1)).with(friend().eq_to(target).unwrap());
        assert_eq!(to_facts(&e).unwrap_err(), ModelError::UnresolvedReference(target));
    }

    #[test]
    fn attached_references_compile_without_pulling() {
        use crate::db::{pull, Db, FactsDb};
        use std::sync::Arc;

        let alice = Eid::new(0, 1);
        let mut facts = friends().to_facts(Eid::new(0, 100));
        facts.extend([
            Fact::new(alice, "user/friends", Eid::new(0, 50)),
            Fact::new(alice, "user/friends", Eid::new(0, 51)),
        ]);
        let db: Arc<dyn Db> = Arc::new(FactsDb::from_facts(facts).unwrap());
        let attached = pull(&db, alice).unwrap();
        assert!(attached.get(&friends()).unwrap().as_ref_list().unwrap().is_empty());

        let compiled = to_facts(&attached).unwrap();
        assert_eq!(
            compiled,
            vec![
                Fact::new(alice, "user/friends", Eid::new(0, 50)),
                Fact::new(alice, "user/friends", Eid::new(0, 51)),
            ]
        );
    }

    // ----- compile -----

    #[test]
    fn compile_cycle() {
        let (graph, a, b) = cycle();
        let compiled = compile_facts(&graph, &[a], &mut Eids::new(2, 0)).unwrap();
        let ea = compiled.unfolded.eid_of(a).unwrap();
        let eb = compiled.unfolded.eid_of(b).unwrap();
        assert_eq!(
            compiled.facts,
            vec![
                Fact::new(ea, "user/friend", eb),
                Fact::new(ea, "user/name", "a"),
                Fact::new(eb, "user/friend", ea),
                Fact::new(eb, "user/name", "b"),
            ]
        );
    }

    #[test]
    fn compile_is_repeatable() {
        let (graph, a, _) = cycle();
        let first = compile_facts(&graph, &[a], &mut Eids::new(0, 0)).unwrap();
        let second = compile_facts(&graph, &[a], &mut Eids::new(0, 0)).unwrap();
        assert_eq!(first.facts, second.facts);
    }
}
