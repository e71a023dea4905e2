//! Verified, deduplicating node storage over a raw [`Storage`] backend.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use factdag_store::{Storage, StoreKey};
use factdag_types::Hash;

use crate::codec;
use crate::error::{DagError, DagResult, IntegrityCause};
use crate::node::Node;

/// Namespace all nodes are stored under.
pub const NODES_NAMESPACE: &str = "nodes";

const WRITER_THREAD: &str = "factdag-nodes-writer";

/// The storage key of the node with `hash`: `nodes/<hex>`.
pub fn node_key(hash: &Hash) -> DagResult<StoreKey> {
    Ok(StoreKey::new(NODES_NAMESPACE, hash.to_hex())?)
}

struct WriteRequest {
    key: StoreKey,
    bytes: Vec<u8>,
    reply: oneshot::Sender<DagResult<bool>>,
}

/// Content-addressed node storage.
///
/// Writes are funnelled through one dedicated thread that processes requests
/// in arrival order. The existence check and the insert for a key therefore
/// never interleave with another write, which keeps storage free of
/// duplicate-key conflicts. Reads and existence checks run on the caller's
/// thread.
///
/// The writer thread exits once every clone of the storage has been dropped.
#[derive(Clone)]
pub struct NodesStorage {
    storage: Arc<dyn Storage>,
    writer: mpsc::UnboundedSender<WriteRequest>,
}

impl NodesStorage {
    /// Wrap `storage` and start the writer thread.
    pub fn new(storage: Arc<dyn Storage>) -> DagResult<Self> {
        let (writer, mut requests) = mpsc::unbounded_channel::<WriteRequest>();
        let backend = Arc::clone(&storage);
        thread::Builder::new()
            .name(WRITER_THREAD.to_string())
            .spawn(move || {
                debug!("node writer started");
                while let Some(request) = requests.blocking_recv() {
                    let result = write_if_absent(backend.as_ref(), &request.key, &request.bytes);
                    // The caller may have given up waiting; nothing to report to.
                    let _ = request.reply.send(result);
                }
                debug!("node writer stopped");
            })?;
        Ok(Self { storage, writer })
    }

    /// The raw backend nodes are stored in.
    pub fn backend(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Store `node` and return it stamped with its content hash.
    ///
    /// Storing a node whose content is already present is a no-op that still
    /// returns the stamped node. A node that arrives with a hash disagreeing
    /// with its content is rejected with [`DagError::HashInconsistency`].
    pub async fn store(&self, node: Node) -> DagResult<Node> {
        let bytes = codec::encode(&node)?;
        let computed = codec::hash_bytes(&bytes);
        if let Some(claimed) = node.hash {
            if claimed != computed {
                return Err(DagError::HashInconsistency { claimed, computed });
            }
        }

        let (reply, response) = oneshot::channel();
        let request = WriteRequest {
            key: node_key(&computed)?,
            bytes,
            reply,
        };
        self.writer
            .send(request)
            .map_err(|_| DagError::WriterStopped)?;
        let written = response.await.map_err(|_| DagError::WriterStopped)??;

        let node = node.with_hash(computed);
        if written {
            debug!(node = %computed.short_hex(), facts = node.data.len(), "stored node");
        } else {
            debug!(node = %computed.short_hex(), "node already stored");
        }
        Ok(node)
    }

    /// Load and verify the node stored under `hash`.
    ///
    /// Returns `Ok(None)` when nothing is stored under that hash. Bytes that
    /// do not hash back to `hash`, or that do not decode, are reported as
    /// [`DagError::Integrity`].
    pub fn load(&self, hash: &Hash) -> DagResult<Option<Node>> {
        let Some(bytes) = self.storage.load(&node_key(hash)?)? else {
            return Ok(None);
        };

        let computed = codec::hash_bytes(&bytes);
        if computed != *hash {
            warn!(node = %hash, computed = %computed, "stored node hash mismatch");
            return Err(DagError::Integrity {
                hash: *hash,
                cause: IntegrityCause::HashMismatch { computed },
            });
        }

        match codec::decode(&bytes, *hash) {
            Ok(node) => Ok(Some(node)),
            Err(e) => {
                warn!(node = %hash, error = %e, "stored node does not decode");
                Err(DagError::Integrity {
                    hash: *hash,
                    cause: IntegrityCause::Decode(e),
                })
            }
        }
    }

    /// Whether a node with `hash` is stored.
    pub fn contains(&self, hash: &Hash) -> DagResult<bool> {
        Ok(self.storage.has_key(&node_key(hash)?)?)
    }

    /// Whether `node` is stored, hashing it first if it carries no hash.
    pub fn has_node(&self, node: &Node) -> DagResult<bool> {
        let hash = match node.hash {
            Some(hash) => hash,
            None => codec::hash(node)?,
        };
        self.contains(&hash)
    }

    /// Copy `head` and every ancestor missing here from `source`.
    ///
    /// Traversal stops at nodes already present locally, since their
    /// ancestry is present too. Parents are stored before their children.
    /// Returns the number of nodes copied.
    pub async fn copy_from(&self, source: &NodesStorage, head: Hash) -> DagResult<usize> {
        enum Visit {
            Enter(Hash),
            Exit(Node),
        }

        let mut stack = vec![Visit::Enter(head)];
        let mut seen = HashSet::new();
        let mut copied = 0;

        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter(hash) => {
                    if !seen.insert(hash) || self.contains(&hash)? {
                        continue;
                    }
                    let node = source.load(&hash)?.ok_or(DagError::NodeNotFound(hash))?;
                    let parents = node.parents();
                    stack.push(Visit::Exit(node));
                    stack.extend(parents.into_iter().rev().map(Visit::Enter));
                }
                Visit::Exit(node) => {
                    self.store(node).await?;
                    copied += 1;
                }
            }
        }

        info!(head = %head.short_hex(), copied, "copied node ancestry");
        Ok(copied)
    }

    /// Load and verify every stored node.
    ///
    /// Returns the number of nodes checked, or the first failure.
    pub fn verify_all(&self) -> DagResult<usize> {
        let keys = self.storage.keys(NODES_NAMESPACE)?;
        for key in &keys {
            let hash = Hash::from_hex(key.name())
                .map_err(|_| DagError::MalformedKey(key.to_string()))?;
            if self.load(&hash)?.is_none() {
                return Err(DagError::NodeNotFound(hash));
            }
        }
        debug!(nodes = keys.len(), "verified stored nodes");
        Ok(keys.len())
    }
}

impl std::fmt::Debug for NodesStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodesStorage")
            .field("writer_open", &!self.writer.is_closed())
            .finish_non_exhaustive()
    }
}

fn write_if_absent(storage: &dyn Storage, key: &StoreKey, bytes: &[u8]) -> DagResult<bool> {
    if storage.has_key(key)? {
        return Ok(false);
    }
    storage.add(key, bytes)?;
    Ok(true)
}
