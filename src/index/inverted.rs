use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::types::DocumentId;

/// Inverted index for one (collection, field) pair: canonical value
/// string to the set of document ids carrying that value.
///
/// Invariant: a document id appears under value `v` iff the persisted
/// document has this field with canonical value `v`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Index {
    pub field: String,
    pub documents: BTreeMap<String, BTreeSet<DocumentId>>,
}

impl Index {
    pub fn empty(field: impl Into<String>) -> Self {
        Index {
            field: field.into(),
            documents: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, value: &str, id: DocumentId) {
        self.documents.entry(value.to_string()).or_default().insert(id);
    }

    /// Compensating removal; drops the value key once its set empties.
    pub fn remove(&mut self, value: &str, id: DocumentId) {
        if let Some(ids) = self.documents.get_mut(value) {
            ids.remove(&id);
            if ids.is_empty() {
                self.documents.remove(value);
            }
        }
    }

    pub fn ids_for(&self, value: &str) -> Option<&BTreeSet<DocumentId>> {
        self.documents.get(value)
    }
}

/// The single canonical textual form of a field value, used as the
/// index key at write time and at query time.
///
/// A JSON string is used verbatim; every other value keys on its
/// compact JSON serialization. Consequence: the number `42` and the
/// string `"42"` share the key `"42"`.
pub fn canonical_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_form_of_text_is_verbatim() {
        assert_eq!(canonical_value(&json!("Acme")), "Acme");
        assert_eq!(canonical_value(&json!("42")), "42");
    }

    #[test]
    fn canonical_form_of_non_text_is_compact_json() {
        assert_eq!(canonical_value(&json!(42)), "42");
        assert_eq!(canonical_value(&json!(true)), "true");
        assert_eq!(canonical_value(&json!(null)), "null");
        assert_eq!(canonical_value(&json!([1, 2])), "[1,2]");
        assert_eq!(canonical_value(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn number_and_equal_looking_text_collide() {
        // 42 serializes to the same text as "42", so both land on one key.
        assert_eq!(canonical_value(&json!(42)), canonical_value(&json!("42")));
    }

    #[test]
    fn remove_drops_empty_value_keys() {
        let id = DocumentId::generate();
        let other = DocumentId::generate();
        let mut index = Index::empty("company");

        index.insert("Acme", id);
        index.insert("Acme", other);
        index.remove("Acme", id);
        assert_eq!(index.ids_for("Acme").unwrap().len(), 1);

        index.remove("Acme", other);
        assert!(index.ids_for("Acme").is_none());
    }
}
