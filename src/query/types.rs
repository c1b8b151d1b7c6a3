use serde_json::Value;

/// One exact-match condition: documents must carry `field` with a
/// value whose canonical form equals that of `value`.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParam {
    pub field: String,
    pub value: Value,
}

impl SearchParam {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        SearchParam {
            field: field.into(),
            value: value.into(),
        }
    }
}
