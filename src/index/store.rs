use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use log::{debug, warn};
use parking_lot::{Mutex, RwLock};

use crate::core::error::{Error, Result};
use crate::core::types::{CollectionId, DocumentId};
use crate::index::inverted::Index;
use crate::storage::atomic;
use crate::storage::layout::StorageLayout;

type IndexKey = (CollectionId, String);

/// Cache slot for one (collection, field) index.
struct Slot {
    /// Serializes read-modify-write cycles on this index. Slots for
    /// different keys never contend with each other.
    mutate: Mutex<()>,
    /// Current in-memory snapshot, always consistent with disk.
    /// None until first access; readers take it lock-free via Arc.
    loaded: RwLock<Option<Arc<Index>>>,
}

/// Loads, caches, mutates, and persists one inverted index per
/// (collection, field). Write-through: every mutation is persisted
/// before the cached snapshot is swapped, so a crash between the two
/// leaves the cache merely cold, never ahead of disk.
pub struct IndexStore {
    layout: Arc<StorageLayout>,
    cache: RwLock<HashMap<IndexKey, Arc<Slot>>>,
}

impl IndexStore {
    pub fn new(layout: Arc<StorageLayout>) -> Self {
        IndexStore {
            layout,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached snapshot if present; otherwise reads the
    /// index file, populates the cache, and returns it. Fails with
    /// NotFound if the field was never declared for indexing.
    pub fn load(&self, collection: CollectionId, field: &str) -> Result<Arc<Index>> {
        let slot = self.slot(collection, field);
        self.snapshot(&slot, collection, field)
    }

    /// Inserts `id` into the set for `canonical_value` and persists the
    /// index, all under the per-key mutation lock.
    pub fn apply_update(
        &self,
        collection: CollectionId,
        field: &str,
        id: DocumentId,
        canonical_value: &str,
    ) -> Result<()> {
        let slot = self.slot(collection, field);
        let _guard = slot.mutate.lock();

        let current = self.snapshot(&slot, collection, field)?;
        let mut updated = (*current).clone();
        updated.insert(canonical_value, id);

        self.persist(collection, field, &updated)?;
        *slot.loaded.write() = Some(Arc::new(updated));

        debug!(
            "indexed document {} under {}={} in collection {}",
            id, field, canonical_value, collection
        );
        Ok(())
    }

    /// Compensating action for a failed multi-field add: removes a
    /// just-added id from a value's set and re-persists.
    pub fn revert_update(
        &self,
        collection: CollectionId,
        field: &str,
        id: DocumentId,
        canonical_value: &str,
    ) -> Result<()> {
        let slot = self.slot(collection, field);
        let _guard = slot.mutate.lock();

        let current = self.snapshot(&slot, collection, field)?;
        let mut updated = (*current).clone();
        updated.remove(canonical_value, id);

        self.persist(collection, field, &updated)?;
        *slot.loaded.write() = Some(Arc::new(updated));

        warn!(
            "reverted index entry {}={} for document {} in collection {}",
            field, canonical_value, id, collection
        );
        Ok(())
    }

    /// Drops every cached snapshot; the next access re-reads disk.
    /// Slots stay in the map so the per-key mutation lock keeps its
    /// identity: a mutation in flight and one arriving after the reset
    /// still serialize behind the same mutex.
    pub fn clear_cache(&self) {
        for slot in self.cache.read().values() {
            *slot.loaded.write() = None;
        }
    }

    fn slot(&self, collection: CollectionId, field: &str) -> Arc<Slot> {
        // Fast path: slot already exists.
        {
            let cache = self.cache.read();
            if let Some(slot) = cache.get(&(collection, field.to_string())) {
                return slot.clone();
            }
        }

        let mut cache = self.cache.write();
        cache
            .entry((collection, field.to_string()))
            .or_insert_with(|| {
                Arc::new(Slot {
                    mutate: Mutex::new(()),
                    loaded: RwLock::new(None),
                })
            })
            .clone()
    }

    fn snapshot(&self, slot: &Slot, collection: CollectionId, field: &str) -> Result<Arc<Index>> {
        if let Some(index) = slot.loaded.read().as_ref() {
            return Ok(index.clone());
        }

        let index = Arc::new(self.read_from_disk(collection, field)?);

        // A concurrent loader may have won the race; both read the same
        // file, so either snapshot is valid.
        let mut loaded = slot.loaded.write();
        if let Some(existing) = loaded.as_ref() {
            return Ok(existing.clone());
        }
        *loaded = Some(index.clone());
        Ok(index)
    }

    fn read_from_disk(&self, collection: CollectionId, field: &str) -> Result<Index> {
        let path = self.layout.index_file(collection, field);
        if !path.exists() {
            return Err(Error::not_found(format!(
                "no index for field '{}' in collection {}",
                field, collection
            )));
        }
        let file = File::open(&path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    fn persist(&self, collection: CollectionId, field: &str, index: &Index) -> Result<()> {
        atomic::write_json(&self.layout.index_file(collection, field), index)
    }
}
