//! View rows and query parameters.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::JsonMap;

/// One row returned by a view query.
///
/// Every field is optional; the shape depends on the view's map function
/// and on `include_docs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewRow {
    /// Id of the document that emitted the row
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Emitted key
    #[serde(default)]
    pub key: Value,
    /// Emitted value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Full document (only with `include_docs`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<JsonMap>,
}

/// Raw result of a view query as returned by a backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewRows {
    /// Rows emitted by the view before any filtering
    pub total_rows: u64,
    /// Index of the first returned row
    pub offset: u64,
    /// Returned rows, in backend order
    pub rows: Vec<ViewRow>,
}

/// Parameters of a view query.
///
/// The proxy never interprets these; they are handed to the backend as-is.
/// Backend-specific options go into `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewParams {
    /// Only rows with exactly this key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Value>,
    /// Only rows with one of these keys, in this order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<Value>>,
    /// First key of the range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startkey: Option<Value>,
    /// Last key of the range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endkey: Option<Value>,
    /// Include rows equal to `endkey` (defaults to true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inclusive_end: Option<bool>,
    /// Reverse the row order
    #[serde(default)]
    pub descending: bool,
    /// Number of rows to skip
    #[serde(default)]
    pub skip: usize,
    /// Maximum number of rows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Attach the full document to each row
    #[serde(default)]
    pub include_docs: bool,
    /// Backend-specific options
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl ViewParams {
    /// Create empty parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a single key
    pub fn with_key(mut self, key: Value) -> Self {
        self.key = Some(key);
        self
    }

    /// Restrict to a list of keys
    pub fn with_keys(mut self, keys: Vec<Value>) -> Self {
        self.keys = Some(keys);
        self
    }

    /// Restrict to a key range
    pub fn with_range(mut self, startkey: Value, endkey: Value) -> Self {
        self.startkey = Some(startkey);
        self.endkey = Some(endkey);
        self
    }

    /// Cap the number of rows
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip leading rows
    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Reverse the order
    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    /// Attach full documents to rows
    pub fn include_docs(mut self) -> Self {
        self.include_docs = true;
        self
    }

    /// Add a backend-specific option
    pub fn with_extra(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_deserialize_partial() {
        let row: ViewRow = serde_json::from_value(json!({"key": "a", "value": null})).unwrap();
        assert!(row.id.is_none());
        assert!(row.value.is_none());
        assert!(row.doc.is_none());
        assert_eq!(row.key, json!("a"));
    }

    #[test]
    fn test_params_builder() {
        let params = ViewParams::new()
            .with_limit(1)
            .with_skip(2)
            .descending()
            .with_extra("stale", json!("ok"));

        assert_eq!(params.limit, Some(1));
        assert_eq!(params.skip, 2);
        assert!(params.descending);
        assert!(!params.include_docs);

        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["stale"], "ok");
        assert_eq!(value["limit"], 1);
    }
}
