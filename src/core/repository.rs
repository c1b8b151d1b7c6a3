use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;

use crate::collection::catalog::Catalog;
use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::types::{Collection, CollectionId, Document, DocumentId};
use crate::document::store::DocumentStore;
use crate::index::store::IndexStore;
use crate::query::engine::QueryEngine;
use crate::query::types::SearchParam;
use crate::storage::layout::StorageLayout;

/// The document store's synchronous API surface. Owns the storage
/// layout, the catalog, both stores, and the query engine; the index
/// cache lives for as long as this instance does.
pub struct Repository {
    catalog: Arc<Catalog>,
    indexes: Arc<IndexStore>,
    documents: Arc<DocumentStore>,
    engine: QueryEngine,
}

impl Repository {
    pub fn open(config: Config) -> Result<Self> {
        let layout = Arc::new(StorageLayout::new(config.root_dir)?);
        let catalog = Arc::new(Catalog::new(layout.clone()));
        let indexes = Arc::new(IndexStore::new(layout.clone()));
        let documents = Arc::new(DocumentStore::new(
            layout,
            catalog.clone(),
            indexes.clone(),
        ));
        let engine = QueryEngine::new(catalog.clone(), indexes.clone(), documents.clone());

        Ok(Repository {
            catalog,
            indexes,
            documents,
            engine,
        })
    }

    pub fn create_collection(&self, name: &str, indexed_fields: &[String]) -> Result<CollectionId> {
        Ok(self.catalog.create(name, indexed_fields)?.id)
    }

    pub fn collection(&self, id: CollectionId) -> Result<Collection> {
        self.catalog.get(id)
    }

    pub fn add_document(&self, collection: CollectionId, document: Value) -> Result<DocumentId> {
        self.documents.add_one(collection, &Document::from_value(document)?)
    }

    /// Per-document outcomes; a failing document reports its own error
    /// without affecting siblings.
    pub fn add_documents(
        &self,
        collection: CollectionId,
        documents: Vec<Value>,
    ) -> Vec<Result<DocumentId>> {
        documents
            .into_iter()
            .map(|value| {
                let document = Document::from_value(value)?;
                self.documents.add_one(collection, &document)
            })
            .collect()
    }

    pub fn get_document(&self, collection: CollectionId, id: DocumentId) -> Result<Document> {
        self.documents.get(collection, id)
    }

    pub fn query_ids(
        &self,
        collection: CollectionId,
        params: &[SearchParam],
    ) -> Result<BTreeSet<DocumentId>> {
        self.engine.find_ids(collection, params)
    }

    pub fn query(&self, collection: CollectionId, params: &[SearchParam]) -> Result<Vec<Document>> {
        self.engine.find_documents(collection, params)
    }

    /// Forgets every cached index; subsequent reads go back to disk.
    pub fn clear_index_cache(&self) {
        self.indexes.clear_cache();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn repository() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::open(Config::new(dir.path())).unwrap();
        (dir, repo)
    }

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn round_trip_create_add_query() {
        let (_dir, repo) = repository();
        let collection = repo
            .create_collection("people", &fields(&["email", "company"]))
            .unwrap();

        let guid = Uuid::new_v4().to_string();
        let payload = json!({"guid": guid, "email": "a@x", "company": "Acme"});
        repo.add_document(collection, payload.clone()).unwrap();

        let hits = repo
            .query(collection, &[SearchParam::new("company", "Acme")])
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0], Document::from_value(payload).unwrap());
    }

    #[test]
    fn results_are_identical_after_a_cache_reset() {
        let (_dir, repo) = repository();
        let collection = repo
            .create_collection("people", &fields(&["company"]))
            .unwrap();
        for _ in 0..5 {
            repo.add_document(
                collection,
                json!({"guid": Uuid::new_v4().to_string(), "company": "Acme"}),
            )
            .unwrap();
        }

        let before = repo
            .query_ids(collection, &[SearchParam::new("company", "Acme")])
            .unwrap();
        repo.clear_index_cache();
        let after = repo
            .query_ids(collection, &[SearchParam::new("company", "Acme")])
            .unwrap();
        assert_eq!(before, after);
        assert_eq!(before.len(), 5);
    }

    #[test]
    fn concurrent_adds_sharing_a_value_all_land() {
        let (_dir, repo) = repository();
        let collection = repo
            .create_collection("people", &fields(&["company"]))
            .unwrap();
        let n = 12;

        std::thread::scope(|scope| {
            for _ in 0..n {
                scope.spawn(|| {
                    repo.add_document(
                        collection,
                        json!({"guid": Uuid::new_v4().to_string(), "company": "Acme"}),
                    )
                    .unwrap();
                });
            }
        });

        let ids = repo
            .query_ids(collection, &[SearchParam::new("company", "Acme")])
            .unwrap();
        assert_eq!(ids.len(), n);
    }

    #[test]
    fn batch_outcomes_are_per_document() {
        let (_dir, repo) = repository();
        let collection = repo
            .create_collection("people", &fields(&["company"]))
            .unwrap();

        let outcomes = repo.add_documents(
            collection,
            vec![
                json!({"guid": Uuid::new_v4().to_string(), "company": "Acme"}),
                json!("not an object"),
                json!({"guid": Uuid::new_v4().to_string(), "company": "Acme"}),
            ],
        );
        assert!(outcomes[0].is_ok());
        assert!(outcomes[1].is_err());
        assert!(outcomes[2].is_ok());

        let ids = repo
            .query_ids(collection, &[SearchParam::new("company", "Acme")])
            .unwrap();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn documents_are_retrievable_by_id_even_when_unindexed() {
        let (_dir, repo) = repository();
        let collection = repo
            .create_collection("people", &fields(&["company"]))
            .unwrap();

        let guid = Uuid::new_v4().to_string();
        let id = repo
            .add_document(collection, json!({"guid": guid, "name": "no indexed fields"}))
            .unwrap();

        assert!(repo.get_document(collection, id).is_ok());
        let hits = repo
            .query_ids(collection, &[SearchParam::new("company", "Acme")])
            .unwrap();
        assert!(hits.is_empty());
    }
}
