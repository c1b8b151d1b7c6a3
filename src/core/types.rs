use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::core::error::{Error, Result};

/// Field every document must carry; holds the document's id as a
/// textual UUID.
pub const IDENTITY_FIELD: &str = "guid";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollectionId(pub Uuid);

impl CollectionId {
    pub fn generate() -> Self {
        CollectionId(Uuid::new_v4())
    }
}

impl std::fmt::Display for CollectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn generate() -> Self {
        DocumentId(Uuid::new_v4())
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Collection metadata: a named group of documents with a fixed set of
/// indexed fields. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    pub indexed_fields: Vec<String>,
}

impl Collection {
    pub fn is_indexed(&self, field: &str) -> bool {
        self.indexed_fields.iter().any(|f| f == field)
    }
}

/// An opaque JSON object with one required identity field. Fields other
/// than `guid` are never interpreted beyond canonicalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: serde_json::Map<String, Value>,
}

impl Document {
    /// Accepts any JSON object; anything else is a validation error.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Document { fields }),
            other => Err(Error::validation(format!(
                "document must be a JSON object, got: {}",
                other
            ))),
        }
    }

    /// Extracts the identity field, validating it holds a textual UUID.
    pub fn id(&self) -> Result<DocumentId> {
        let raw = self
            .fields
            .get(IDENTITY_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::validation(format!(
                    "document is missing a textual '{}' field",
                    IDENTITY_FIELD
                ))
            })?;

        let uuid = Uuid::parse_str(raw).map_err(|e| {
            Error::validation(format!("'{}' is not a valid UUID: {}", raw, e))
        })?;

        Ok(DocumentId(uuid))
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn document_rejects_non_objects() {
        assert!(Document::from_value(json!([1, 2])).is_err());
        assert!(Document::from_value(json!("text")).is_err());
        assert!(Document::from_value(json!({"a": 1})).is_ok());
    }

    #[test]
    fn identity_field_must_be_a_textual_uuid() {
        let doc = Document::from_value(json!({"guid": "not-a-uuid"})).unwrap();
        assert!(doc.id().is_err());

        let doc = Document::from_value(json!({"guid": 42})).unwrap();
        assert!(doc.id().is_err());

        let id = Uuid::new_v4();
        let doc = Document::from_value(json!({"guid": id.to_string()})).unwrap();
        assert_eq!(doc.id().unwrap(), DocumentId(id));
    }
}
