use std::collections::BTreeSet;
use std::sync::Arc;

use log::error;

use crate::collection::catalog::Catalog;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{CollectionId, Document, DocumentId};
use crate::document::store::DocumentStore;
use crate::index::inverted::canonical_value;
use crate::index::store::IndexStore;
use crate::query::types::SearchParam;

/// Evaluates multi-field AND queries: per-field index lookups
/// intersected left to right.
pub struct QueryEngine {
    catalog: Arc<Catalog>,
    indexes: Arc<IndexStore>,
    documents: Arc<DocumentStore>,
}

impl QueryEngine {
    pub fn new(
        catalog: Arc<Catalog>,
        indexes: Arc<IndexStore>,
        documents: Arc<DocumentStore>,
    ) -> Self {
        QueryEngine {
            catalog,
            indexes,
            documents,
        }
    }

    /// Returns the ids matching every param. Querying a field that was
    /// not declared at collection creation is a validation error,
    /// raised before any index is touched. An empty param list returns
    /// the empty set.
    pub fn find_ids(
        &self,
        collection_id: CollectionId,
        params: &[SearchParam],
    ) -> Result<BTreeSet<DocumentId>> {
        let collection = self.catalog.get(collection_id)?;
        for param in params {
            if !collection.is_indexed(&param.field) {
                return Err(Error::validation(format!(
                    "field '{}' is not indexed in collection '{}'",
                    param.field, collection.name
                )));
            }
        }

        let mut result: Option<BTreeSet<DocumentId>> = None;
        for param in params {
            let index = self.indexes.load(collection_id, &param.field)?;
            let ids = index
                .ids_for(&canonical_value(&param.value))
                .cloned()
                .unwrap_or_default();
            result = Some(match result {
                None => ids,
                Some(acc) => acc.intersection(&ids).copied().collect(),
            });
            if result.as_ref().is_some_and(BTreeSet::is_empty) {
                break;
            }
        }
        Ok(result.unwrap_or_default())
    }

    /// Fetches the matching documents. An id present in an index whose
    /// document file is missing is an internal-consistency violation
    /// and surfaces as an integrity error, never silently skipped.
    pub fn find_documents(
        &self,
        collection_id: CollectionId,
        params: &[SearchParam],
    ) -> Result<Vec<Document>> {
        self.find_ids(collection_id, params)?
            .into_iter()
            .map(|id| {
                self.documents.get(collection_id, id).map_err(|err| {
                    if err.kind == ErrorKind::NotFound {
                        error!(
                            "index in collection {} references missing document {}",
                            collection_id, id
                        );
                        Error::integrity(format!(
                            "index references document {} which cannot be loaded: {}",
                            id, err
                        ))
                    } else {
                        err
                    }
                })
            })
            .collect()
    }
}
