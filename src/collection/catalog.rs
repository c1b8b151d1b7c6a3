use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::BufReader;
use std::sync::Arc;

use log::{info, warn};

use crate::core::error::{Error, Result};
use crate::core::types::{Collection, CollectionId};
use crate::index::inverted::Index;
use crate::storage::atomic;
use crate::storage::layout::StorageLayout;

/// Creates and loads collection metadata; the root object every other
/// operation keys off of.
pub struct Catalog {
    layout: Arc<StorageLayout>,
}

impl Catalog {
    pub fn new(layout: Arc<StorageLayout>) -> Self {
        Catalog { layout }
    }

    /// Creates a collection with a fresh id: data and index
    /// directories, one empty index file per declared field, and the
    /// metadata file. Metadata is written last, so a collection is
    /// never resolvable in a half-created state; on failure the
    /// partial layout is removed best-effort.
    pub fn create(&self, name: &str, indexed_fields: &[String]) -> Result<Collection> {
        if indexed_fields.is_empty() {
            return Err(Error::validation(
                "a collection must declare at least one indexed field",
            ));
        }
        let distinct: BTreeSet<&String> = indexed_fields.iter().collect();
        if distinct.len() != indexed_fields.len() {
            return Err(Error::validation(format!(
                "indexed fields contain duplicates: {:?}",
                indexed_fields
            )));
        }
        // Field names become file names under the index directory.
        for field in indexed_fields {
            if field.is_empty() || field.contains(['/', '\\']) {
                return Err(Error::validation(format!(
                    "invalid indexed field name: {:?}",
                    field
                )));
            }
        }

        let collection = Collection {
            id: CollectionId::generate(),
            name: name.to_string(),
            indexed_fields: indexed_fields.to_vec(),
        };

        if let Err(err) = self.write_layout(&collection) {
            warn!(
                "creation of collection '{}' failed, removing partial layout: {}",
                name, err
            );
            let _ = fs::remove_dir_all(self.layout.collection_dir(collection.id));
            let _ = fs::remove_file(self.layout.collection_file(collection.id));
            return Err(err);
        }

        info!(
            "created collection '{}' ({}) indexing {:?}",
            collection.name, collection.id, collection.indexed_fields
        );
        Ok(collection)
    }

    pub fn get(&self, id: CollectionId) -> Result<Collection> {
        let path = self.layout.collection_file(id);
        if !path.exists() {
            return Err(Error::not_found(format!("collection {} not found", id)));
        }
        let file = File::open(&path)
            .map_err(|e| Error::not_found(format!("collection {} unreadable: {}", id, e)))?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::not_found(format!("collection {} unreadable: {}", id, e)))
    }

    fn write_layout(&self, collection: &Collection) -> Result<()> {
        fs::create_dir_all(self.layout.data_dir(collection.id))?;
        fs::create_dir_all(self.layout.index_dir(collection.id))?;

        for field in &collection.indexed_fields {
            let path = self.layout.index_file(collection.id, field);
            atomic::write_json(&path, &Index::empty(field))?;
        }

        atomic::write_json(&self.layout.collection_file(collection.id), collection)
    }
}
