use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use log::{debug, error};

use crate::collection::catalog::Catalog;
use crate::core::error::{Error, Result};
use crate::core::types::{CollectionId, Document, DocumentId};
use crate::index::inverted::canonical_value;
use crate::index::store::IndexStore;
use crate::storage::atomic;
use crate::storage::layout::StorageLayout;

/// Persists and retrieves documents; the add path drives the index
/// updates for every indexed field present on the document.
pub struct DocumentStore {
    layout: Arc<StorageLayout>,
    catalog: Arc<Catalog>,
    indexes: Arc<IndexStore>,
}

impl DocumentStore {
    pub fn new(layout: Arc<StorageLayout>, catalog: Arc<Catalog>, indexes: Arc<IndexStore>) -> Self {
        DocumentStore {
            layout,
            catalog,
            indexes,
        }
    }

    /// Indexes the document under every declared field it carries, then
    /// persists the document file. If anything fails partway, every
    /// index update already applied for this document is reverted
    /// before the error is reported: a document never ends up
    /// indexed-but-absent or present-but-under-indexed.
    pub fn add_one(&self, collection_id: CollectionId, document: &Document) -> Result<DocumentId> {
        let id = document.id()?;
        let collection = self.catalog.get(collection_id)?;

        let mut applied: Vec<(&str, String)> = Vec::new();
        for field in &collection.indexed_fields {
            let Some(raw) = document.field(field) else {
                // Not an error: the document simply stays absent from
                // this field's index.
                continue;
            };
            let value = canonical_value(raw);
            if let Err(err) = self.indexes.apply_update(collection_id, field, id, &value) {
                self.unwind(collection_id, id, &applied);
                return Err(err);
            }
            applied.push((field.as_str(), value));
        }

        if let Err(err) = self.persist(collection_id, id, document) {
            self.unwind(collection_id, id, &applied);
            return Err(err);
        }

        debug!("added document {} to collection {}", id, collection_id);
        Ok(id)
    }

    /// Adds each document independently and reports a per-document
    /// outcome; one failure neither aborts nor rolls back siblings.
    pub fn add_many(
        &self,
        collection_id: CollectionId,
        documents: &[Document],
    ) -> Vec<Result<DocumentId>> {
        documents
            .iter()
            .map(|document| self.add_one(collection_id, document))
            .collect()
    }

    pub fn get(&self, collection_id: CollectionId, id: DocumentId) -> Result<Document> {
        let path = self.layout.document_file(collection_id, id);
        if !path.exists() {
            return Err(Error::not_found(format!(
                "document {} not found in collection {}",
                id, collection_id
            )));
        }
        let file = File::open(&path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    fn persist(&self, collection_id: CollectionId, id: DocumentId, document: &Document) -> Result<()> {
        atomic::write_json(&self.layout.document_file(collection_id, id), document)
    }

    fn unwind(&self, collection_id: CollectionId, id: DocumentId, applied: &[(&str, String)]) {
        for (field, value) in applied.iter().rev() {
            if let Err(err) = self.indexes.revert_update(collection_id, field, id, value) {
                // The revert itself is best-effort; a failure here is an
                // inconsistency the caller cannot repair.
                error!(
                    "failed to revert index entry {}={} for document {}: {}",
                    field, value, id, err
                );
            }
        }
    }
}
