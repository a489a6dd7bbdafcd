use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use crate::engine::{Engine, EngineError, EngineResult, ReadTransaction, UpdateTransaction};

type Records = BTreeMap<Vec<u8>, Vec<u8>>;

/// In-memory, lock-based key-value engine.
///
/// Intended for tests and embedding. Update transactions hold the write
/// lock for the whole closure, so a read-modify-write sequence is atomic
/// and updates are fully serialized; view transactions hold the read lock
/// and see a consistent snapshot. Writes are staged and only applied when
/// the closure returns `Ok`.
pub struct MemoryEngine {
    collections: RwLock<HashMap<String, Records>>,
}

impl MemoryEngine {
    /// Create a new empty engine.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Number of records in `collection`.
    pub fn record_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .expect("lock poisoned")
            .get(collection)
            .map_or(0, Records::len)
    }

    /// Remove all collections and records.
    pub fn clear(&self) {
        self.collections.write().expect("lock poisoned").clear();
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

struct MemoryUpdateTx<'a> {
    committed: &'a Records,
    staged: Records,
}

impl UpdateTransaction for MemoryUpdateTx<'_> {
    fn get(&self, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        Ok(self
            .staged
            .get(key)
            .or_else(|| self.committed.get(key))
            .cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> EngineResult<()> {
        self.staged.insert(key.to_vec(), value.to_vec());
        Ok(())
    }
}

struct MemoryReadTx<'a> {
    records: Option<&'a Records>,
}

impl ReadTransaction for MemoryReadTx<'_> {
    fn get(&self, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        Ok(self.records.and_then(|r| r.get(key)).cloned())
    }
}

impl Engine for MemoryEngine {
    fn update<E, F>(&self, collection: &str, f: F) -> Result<(), E>
    where
        E: From<EngineError>,
        F: FnOnce(&mut dyn UpdateTransaction) -> Result<(), E>,
    {
        let mut collections = self.collections.write().expect("lock poisoned");
        let committed = collections.entry(collection.to_string()).or_default();
        let staged = {
            let mut tx = MemoryUpdateTx {
                committed: &*committed,
                staged: Records::new(),
            };
            f(&mut tx)?;
            tx.staged
        };
        committed.extend(staged);
        Ok(())
    }

    fn view<E, F>(&self, collection: &str, f: F) -> Result<(), E>
    where
        E: From<EngineError>,
        F: FnOnce(&dyn ReadTransaction) -> Result<(), E>,
    {
        let collections = self.collections.read().expect("lock poisoned");
        let tx = MemoryReadTx {
            records: collections.get(collection),
        };
        f(&tx)
    }
}

impl std::fmt::Debug for MemoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let collections = self.collections.read().expect("lock poisoned");
        f.debug_struct("MemoryEngine")
            .field("collections", &collections.len())
            .field(
                "records",
                &collections.values().map(Records::len).sum::<usize>(),
            )
            .finish()
    }
}
