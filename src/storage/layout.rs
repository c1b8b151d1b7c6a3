use std::fs;
use std::path::PathBuf;

use crate::core::error::Result;
use crate::core::types::{CollectionId, DocumentId};

/// Directory structure for data files.
///
/// Layout under the root:
///   <collectionId>.bibliothek          collection metadata
///   <collectionId>/data/<documentId>   one file per document
///   <collectionId>/index/<field>.index one file per indexed field
#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub root_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(root_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root_dir)?;
        Ok(StorageLayout { root_dir })
    }

    pub fn collection_file(&self, id: CollectionId) -> PathBuf {
        self.root_dir.join(format!("{}.bibliothek", id))
    }

    pub fn collection_dir(&self, id: CollectionId) -> PathBuf {
        self.root_dir.join(id.to_string())
    }

    pub fn data_dir(&self, id: CollectionId) -> PathBuf {
        self.collection_dir(id).join("data")
    }

    pub fn index_dir(&self, id: CollectionId) -> PathBuf {
        self.collection_dir(id).join("index")
    }

    pub fn document_file(&self, collection: CollectionId, document: DocumentId) -> PathBuf {
        self.data_dir(collection).join(document.to_string())
    }

    pub fn index_file(&self, collection: CollectionId, field: &str) -> PathBuf {
        self.index_dir(collection).join(format!("{}.index", field))
    }
}
