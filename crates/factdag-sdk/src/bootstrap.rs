//! Creating a fresh database.

use std::sync::Arc;

use tracing::info;

use factdag_dag::{Node, NodeData, NodesStorage};
use factdag_model::{meta, Db, EntityValue, ModelError};
use factdag_store::Storage;
use factdag_types::{DbUuid, Eid, Eids, Fact, Hash, Timestamp, Value};

use crate::config::DbConfig;
use crate::error::{SdkError, SdkResult};
use crate::head::write_head;

/// Local sequence numbers taken by the built-in attributes and the instance
/// entity.
pub fn reserved_locals() -> u32 {
    meta::builtin_attrs().len() as u32 + 1
}

/// The eid of the entity describing instance `iid`.
pub fn instance_eid(iid: u32) -> Eid {
    Eid::new(iid, reserved_locals() - 1)
}

/// Fresh eids for application entities of instance `iid`, starting at the
/// `next-eid` recorded on the instance entity in `db`.
pub fn user_eids(db: &dyn Db, iid: u32) -> SdkResult<Eids> {
    let next = db
        .pull_attrs(instance_eid(iid))
        .and_then(|attrs| {
            attrs
                .get(&meta::next_eid())
                .and_then(EntityValue::as_scalar)
                .and_then(Value::as_long)
        })
        .ok_or(SdkError::MissingNextEid(iid))?;
    let next = u64::try_from(next).map_err(|_| SdkError::MissingNextEid(iid))?;
    eids_from(iid, next)
}

fn eids_from(iid: u32, next: u64) -> SdkResult<Eids> {
    let local = u32::try_from(next).map_err(|_| ModelError::EidsExhausted)?;
    Ok(Eids::new(iid, local.max(reserved_locals())))
}

/// The first local sequence number past every one `facts` uses under `iid`.
fn next_local(facts: &[Fact], iid: u32) -> u64 {
    facts
        .iter()
        .filter(|f| f.eid.iid() == iid)
        .map(|f| u64::from(f.eid.local()) + 1)
        .fold(u64::from(reserved_locals()), u64::max)
}

/// Build and store the root node of a new database.
///
/// The root carries the schema facts of every built-in attribute, the
/// instance descriptor (`iid`, `forks = 0`, `next-eid`) and `initial`.
/// `next-eid` is past every local sequence number `initial` uses under
/// `config.iid`. Initial facts about the reserved eids of `config.iid` are
/// rejected.
pub async fn bootstrap(
    nodes: &NodesStorage,
    config: &DbConfig,
    source: DbUuid,
    initial: Vec<Fact>,
) -> SdkResult<Node> {
    let iid = config.iid;
    if let Some(fact) = initial
        .iter()
        .find(|f| f.eid.iid() == iid && f.eid.local() < reserved_locals())
    {
        return Err(SdkError::ReservedEid(fact.eid));
    }

    let mut facts: Vec<Fact> = meta::builtin_attrs()
        .iter()
        .zip(Eids::new(iid, 0))
        .flat_map(|(attr, eid)| attr.to_facts(eid))
        .collect();

    let next_eid = next_local(&initial, iid);
    let instance = instance_eid(iid);
    facts.push(Fact::new(instance, meta::iid().name().to_string(), i64::from(iid)));
    facts.push(Fact::new(instance, meta::forks().name().to_string(), Value::Int(0)));
    facts.push(Fact::new(instance, meta::next_eid().name().to_string(), next_eid as i64));
    let initial_count = initial.len();
    facts.extend(initial);

    let root = Node::root(source, Timestamp::now(), NodeData::new(facts));
    let root = nodes.store(root).await?;
    info!(
        iid,
        source = %source,
        initial_facts = initial_count,
        root = ?root.hash,
        "bootstrapped database"
    );
    Ok(root)
}

fn head_hash(root: &Node) -> SdkResult<Hash> {
    root.hash.ok_or_else(|| SdkError::Unhashed(root.summary()))
}

/// A freshly initialized database.
#[derive(Debug)]
pub struct Initialized {
    pub nodes: NodesStorage,
    pub source: DbUuid,
    pub root: Node,
    /// Fresh eids past everything the root uses.
    pub eids: Eids,
}

/// Bootstrap a database in `storage` and point the head at its root.
pub async fn init(
    storage: Arc<dyn Storage>,
    config: &DbConfig,
    initial: Vec<Fact>,
) -> SdkResult<Initialized> {
    let nodes = NodesStorage::new(Arc::clone(&storage))?;
    let source = DbUuid::new();
    let eids = eids_from(config.iid, next_local(&initial, config.iid))?;
    let root = bootstrap(&nodes, config, source, initial).await?;
    write_head(storage.as_ref(), &head_hash(&root)?)?;
    Ok(Initialized {
        nodes,
        source,
        root,
        eids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{open_storage, StorageConfig};
    use crate::head::read_head;
    use factdag_model::{Attr, FactsDb};
    use factdag_store::MemoryStorage;
    use factdag_types::DataType;

    fn has_fact(node: &Node, attr: &str, value: Value) -> bool {
        node.data.facts.iter().any(|f| f.attr == attr && f.value == value)
    }

    #[tokio::test]
    async fn bootstrap_scenario() {
        let nodes = NodesStorage::new(Arc::new(MemoryStorage::new())).unwrap();
        let root = bootstrap(&nodes, &DbConfig::default(), DbUuid::new(), Vec::new())
            .await
            .unwrap();

        assert!(root.is_root());
        assert!(root.parents().is_empty());
        for attr in ["name", "type", "unique", "list"] {
            let key = format!("factdag.attr/{attr}");
            assert!(has_fact(&root, "factdag.attr/name", Value::from(key.as_str())), "{key}");
        }
        assert!(has_fact(&root, "factdag.instance/iid", Value::Long(0)));
        assert!(has_fact(&root, "factdag.instance/forks", Value::Int(0)));
        assert!(has_fact(&root, "factdag.instance/next-eid", Value::Long(9)));

        let hash = root.hash.unwrap();
        let reloaded = nodes.load(&hash).unwrap().unwrap();
        assert_eq!(reloaded, root);
        assert_eq!(factdag_dag::codec::hash(&reloaded).unwrap(), hash);
    }

    #[tokio::test]
    async fn schema_facts_come_four_per_attribute() {
        let nodes = NodesStorage::new(Arc::new(MemoryStorage::new())).unwrap();
        let root = bootstrap(&nodes, &DbConfig::default(), DbUuid::new(), Vec::new())
            .await
            .unwrap();
        let schema_facts = root
            .data
            .facts
            .iter()
            .filter(|f| f.attr.starts_with("factdag.attr/"))
            .count();
        assert_eq!(schema_facts, 4 * meta::builtin_attrs().len());
        assert_eq!(root.data.len(), schema_facts + 3);
    }

    #[tokio::test]
    async fn initial_facts_advance_next_eid() {
        let config = DbConfig {
            iid: 2,
            ..DbConfig::default()
        };
        let nodes = NodesStorage::new(Arc::new(MemoryStorage::new())).unwrap();
        let initial = vec![Fact::new(Eid::new(2, 40), "factdag.api/tombstone", false)];
        let root = bootstrap(&nodes, &config, DbUuid::new(), initial.clone())
            .await
            .unwrap();
        assert!(has_fact(&root, "factdag.instance/next-eid", Value::Long(41)));
        assert!(has_fact(&root, "factdag.instance/iid", Value::Long(2)));
        assert_eq!(root.data.facts.last(), initial.last());
    }

    #[tokio::test]
    async fn init_writes_head() {
        let storage = open_storage(&StorageConfig::Memory).unwrap();
        let db = init(Arc::clone(&storage), &DbConfig::default(), Vec::new())
            .await
            .unwrap();
        assert_eq!(read_head(storage.as_ref()).unwrap(), db.root.hash);
        assert_eq!(db.root.source, db.source);
    }

    #[tokio::test]
    async fn init_on_file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig {
            iid: 1,
            storage: StorageConfig::File {
                root: dir.path().to_path_buf(),
            },
        };
        let root = {
            let storage = open_storage(&config.storage).unwrap();
            init(storage, &config, Vec::new()).await.unwrap().root
        };

        let storage = open_storage(&config.storage).unwrap();
        let head = read_head(storage.as_ref()).unwrap().unwrap();
        let nodes = NodesStorage::new(storage).unwrap();
        assert_eq!(nodes.load(&head).unwrap(), Some(root));
        assert_eq!(nodes.verify_all().unwrap(), 1);
    }

    #[tokio::test]
    async fn reserved_eids() {
        assert_eq!(instance_eid(5), Eid::new(5, 8));

        let config = DbConfig {
            iid: 5,
            ..DbConfig::default()
        };
        let mut db = init(Arc::new(MemoryStorage::new()), &config, Vec::new())
            .await
            .unwrap();
        assert_eq!(db.eids.next(), Some(Eid::new(5, 9)));
        let snap = FactsDb::from_facts(db.root.data.facts.clone()).unwrap();
        assert_eq!(user_eids(&snap, 5).unwrap().next(), Some(Eid::new(5, 9)));
    }

    #[tokio::test]
    async fn fresh_eids_skip_initial_entities() {
        let name = Attr::scalar("user/name", DataType::Str).unwrap();
        let initial = name.to_facts(Eid::new(0, 9));
        let mut db = init(Arc::new(MemoryStorage::new()), &DbConfig::default(), initial)
            .await
            .unwrap();

        assert_eq!(db.eids.next(), Some(Eid::new(0, 10)));
        let snap = FactsDb::from_facts(db.root.data.facts.clone()).unwrap();
        assert_eq!(user_eids(&snap, 0).unwrap().next(), Some(Eid::new(0, 10)));
    }

    #[tokio::test]
    async fn initial_facts_on_reserved_eids_rejected() {
        let nodes = NodesStorage::new(Arc::new(MemoryStorage::new())).unwrap();
        let clash = vec![Fact::new(instance_eid(0), "factdag.api/tombstone", true)];
        assert!(matches!(
            bootstrap(&nodes, &DbConfig::default(), DbUuid::new(), clash).await,
            Err(SdkError::ReservedEid(eid)) if eid == instance_eid(0)
        ));

        let other_instance = vec![Fact::new(Eid::new(3, 0), "factdag.api/tombstone", true)];
        assert!(bootstrap(&nodes, &DbConfig::default(), DbUuid::new(), other_instance)
            .await
            .is_ok());
    }

    #[test]
    fn missing_instance_has_no_eids() {
        let snap = FactsDb::from_facts(Vec::<Fact>::new()).unwrap();
        assert!(matches!(user_eids(&snap, 0), Err(SdkError::MissingNextEid(0))));
    }

    #[test]
    fn unhashed_root_cannot_become_head() {
        let root = Node::root(DbUuid::new(), Timestamp::from_millis(1), NodeData::default());
        assert!(matches!(head_hash(&root), Err(SdkError::Unhashed(_))));
        let hash = Hash::from_digest([3; 32]);
        assert_eq!(head_hash(&root.with_hash(hash)).unwrap(), hash);
    }
}
