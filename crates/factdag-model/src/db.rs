//! Database snapshots as seen by attached entities.

use std::collections::HashMap;
use std::sync::Arc;

use factdag_types::{Eid, Fact, Value};

use crate::attr::Attr;
use crate::entity::{AttachedEntity, AttrMap, EntityValue, RefValue};
use crate::error::{ModelError, ModelResult};
use crate::meta;

/// A read-only database snapshot.
///
/// Implementations must return the same answer for the same eid for their
/// whole lifetime.
pub trait Db: Send + Sync {
    /// The raw attribute map of `eid`, or `None` if the entity does not exist
    /// or has been deleted. References are returned as eids.
    fn pull_attrs(&self, eid: Eid) -> Option<AttrMap>;

    /// The schema attribute named `name`.
    fn attr(&self, name: &str) -> Option<Attr>;
}

/// Pull `eid` from `db` as a clean attached entity.
pub fn pull(db: &Arc<dyn Db>, eid: Eid) -> Option<AttachedEntity> {
    db.pull_attrs(eid)
        .map(|attrs| AttachedEntity::new(eid, attrs, Arc::clone(db)))
}

/// In-memory snapshot built from a fact sequence.
///
/// The schema is read from the facts themselves: every eid carrying all four
/// schema attributes defines an attribute. When several eids define the same
/// name, the eid whose first schema fact comes earliest wins; built-in
/// attributes cannot be redefined. For scalar attributes the last
/// fact wins; list attributes accumulate in fact order. Entities with a true
/// tombstone pull as absent.
#[derive(Debug, Default)]
pub struct FactsDb {
    schema: HashMap<String, Attr>,
    entities: HashMap<Eid, AttrMap>,
}

#[derive(Default)]
struct SchemaParts {
    name: Option<String>,
    type_code: Option<u8>,
    unique: Option<bool>,
    list: Option<bool>,
}

impl FactsDb {
    pub fn from_facts(facts: impl IntoIterator<Item = Fact>) -> ModelResult<Self> {
        let facts: Vec<Fact> = facts.into_iter().collect();
        let schema = read_schema(&facts)?;

        let mut entities: HashMap<Eid, AttrMap> = HashMap::new();
        for fact in facts {
            let attr = schema
                .get(&fact.attr)
                .ok_or_else(|| ModelError::UnknownAttribute(fact.attr.clone()))?;
            let actual = fact.value.data_type();
            if actual != attr.data_type() {
                return Err(ModelError::TypeMismatch {
                    attr: fact.attr,
                    expected: attr.data_type(),
                    actual,
                });
            }

            let map = entities.entry(fact.eid).or_default();
            match attr {
                Attr::Scalar(_) => {
                    map.insert(attr.clone(), EntityValue::Scalar(fact.value));
                }
                Attr::List(_) => {
                    let slot = map
                        .entry(attr.clone())
                        .or_insert_with(|| EntityValue::List(Vec::new()));
                    if let EntityValue::List(values) = slot {
                        values.push(fact.value);
                    }
                }
                Attr::Ref(_) => {
                    if let Value::Ref(target) = fact.value {
                        map.insert(attr.clone(), EntityValue::Ref(RefValue::Eid(target)));
                    }
                }
                Attr::RefList(_) => {
                    if let Value::Ref(target) = fact.value {
                        let slot = map
                            .entry(attr.clone())
                            .or_insert_with(|| EntityValue::RefList(Vec::new()));
                        if let EntityValue::RefList(targets) = slot {
                            targets.push(RefValue::Eid(target));
                        }
                    }
                }
            }
        }

        Ok(Self { schema, entities })
    }

    /// Number of entities, including deleted ones.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

fn read_schema(facts: &[Fact]) -> ModelResult<HashMap<String, Attr>> {
    let name_key = meta::name().name().to_string();
    let type_key = meta::data_type().name().to_string();
    let unique_key = meta::unique().name().to_string();
    let list_key = meta::list().name().to_string();

    let mut order: Vec<Eid> = Vec::new();
    let mut parts: HashMap<Eid, SchemaParts> = HashMap::new();
    for fact in facts {
        let field = &fact.attr;
        if *field != name_key && *field != type_key && *field != unique_key && *field != list_key {
            continue;
        }
        let entry = parts.entry(fact.eid).or_insert_with(|| {
            order.push(fact.eid);
            SchemaParts::default()
        });
        if *field == name_key {
            entry.name = fact.value.as_str().map(str::to_string);
        } else if *field == type_key {
            entry.type_code = fact.value.as_byte();
        } else if *field == unique_key {
            entry.unique = fact.value.as_bool();
        } else {
            entry.list = fact.value.as_bool();
        }
    }

    let mut schema: HashMap<String, Attr> = meta::builtin_attrs()
        .into_iter()
        .map(|attr| (attr.name().to_string(), attr))
        .collect();
    for eid in order {
        let Some(part) = parts.remove(&eid) else {
            continue;
        };
        if let (Some(name), Some(code), Some(unique), Some(list)) =
            (part.name, part.type_code, part.unique, part.list)
        {
            if schema.contains_key(&name) {
                continue;
            }
            let attr = Attr::from_meta(&name, code, unique, list)?;
            schema.insert(name, attr);
        }
    }
    Ok(schema)
}

impl Db for FactsDb {
    fn pull_attrs(&self, eid: Eid) -> Option<AttrMap> {
        let attrs = self.entities.get(&eid)?;
        let deleted = attrs
            .get(&meta::tombstone())
            .and_then(EntityValue::as_scalar)
            .and_then(Value::as_bool)
            .unwrap_or(false);
        (!deleted).then(|| attrs.clone())
    }

    fn attr(&self, name: &str) -> Option<Attr> {
        self.schema.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use factdag_types::DataType;

    fn tags() -> Attr {
        Attr::list("post/tags", DataType::Str).unwrap()
    }

    fn title() -> Attr {
        Attr::scalar("post/title", DataType::Str).unwrap()
    }

    fn schema() -> Vec<Fact> {
        let mut facts = tags().to_facts(Eid::new(0, 100));
        facts.extend(title().to_facts(Eid::new(0, 101)));
        facts
    }

    #[test]
    fn schema_is_read_from_facts() {
        let db = FactsDb::from_facts(schema()).unwrap();
        assert_eq!(db.attr("post/tags"), Some(tags()));
        assert_eq!(db.attr("factdag.attr/name"), Some(meta::name()));
        assert_eq!(db.attr("post/missing"), None);
    }

    #[test]
    fn earliest_definition_of_a_name_wins() {
        let mut facts = Attr::scalar("post/x", DataType::Str)
            .unwrap()
            .to_facts(Eid::new(0, 100));
        facts.extend(Attr::scalar("post/x", DataType::Long).unwrap().to_facts(Eid::new(0, 101)));
        facts.push(Fact::new(Eid::new(0, 1), "post/x", "text"));

        for _ in 0..32 {
            let db = FactsDb::from_facts(facts.clone()).unwrap();
            assert_eq!(db.attr("post/x").map(|a| a.data_type()), Some(DataType::Str));
        }
    }

    #[test]
    fn builtin_attributes_cannot_be_redefined() {
        let facts = Attr::scalar("factdag.attr/name", DataType::Long)
            .unwrap()
            .to_facts(Eid::new(0, 100));
        let db = FactsDb::from_facts(facts).unwrap();
        assert_eq!(db.attr("factdag.attr/name"), Some(meta::name()));
    }

    #[test]
    fn attribute_entities_are_pullable() {
        let db: Arc<dyn Db> = Arc::new(FactsDb::from_facts(schema()).unwrap());
        let attr_entity = pull(&db, Eid::new(0, 100)).unwrap();
        assert_eq!(
            attr_entity.get(&meta::name()).unwrap(),
            EntityValue::Scalar(Value::from("post/tags"))
        );
    }

    #[test]
    fn scalars_last_wins_lists_accumulate() {
        let post = Eid::new(0, 1);
        let mut facts = schema();
        facts.extend([
            Fact::new(post, "post/title", "draft"),
            Fact::new(post, "post/tags", "rust"),
            Fact::new(post, "post/title", "final"),
            Fact::new(post, "post/tags", "db"),
        ]);
        let db = FactsDb::from_facts(facts).unwrap();
        let attrs = db.pull_attrs(post).unwrap();
        assert_eq!(attrs[&title()], EntityValue::Scalar(Value::from("final")));
        assert_eq!(
            attrs[&tags()],
            EntityValue::List(vec![Value::from("rust"), Value::from("db")])
        );
    }

    #[test]
    fn unknown_attribute_rejected() {
        let facts = vec![Fact::new(Eid::new(0, 1), "post/body", "x")];
        assert_eq!(
            FactsDb::from_facts(facts).unwrap_err(),
            ModelError::UnknownAttribute("post/body".into())
        );
    }

    #[test]
    fn mistyped_fact_rejected() {
        let mut facts = schema();
        facts.push(Fact::new(Eid::new(0, 1), "post/title", 5i64));
        assert!(matches!(
            FactsDb::from_facts(facts),
            Err(ModelError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn tombstoned_entities_are_absent() {
        let post = Eid::new(0, 1);
        let mut facts = schema();
        facts.push(Fact::new(post, "post/title", "gone"));
        facts.push(Fact::new(post, "factdag.api/tombstone", true));
        let db: Arc<dyn Db> = Arc::new(FactsDb::from_facts(facts).unwrap());
        assert!(pull(&db, post).is_none());
        assert!(pull(&db, Eid::new(0, 2)).is_none());
    }
}
