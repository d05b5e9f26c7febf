//! View results and row normalization.

use serde_json::Value;
use std::marker::PhantomData;

use super::{ViewRow, ViewRows};
use crate::document::{Document, WrapOptions, ID_FIELD, REV_FIELD};
use crate::error::ProxyResult;

/// Options controlling how view rows become documents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    /// Wrap the row's `doc` field when present
    pub wrap_doc: bool,
    /// Keep fields the schema does not declare
    pub allow_dynamic_fields: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            wrap_doc: true,
            allow_dynamic_fields: true,
        }
    }
}

impl ViewOptions {
    /// Options passed to [`Document::wrap`]
    pub fn wrap_options(&self) -> WrapOptions {
        WrapOptions {
            allow_dynamic_fields: self.allow_dynamic_fields,
        }
    }
}

/// A normalized view row
#[derive(Debug, Clone, PartialEq)]
pub enum ViewItem<D> {
    /// The row was document-shaped and has been wrapped
    Document(D),
    /// The row was returned unchanged
    Row(ViewRow),
}

impl<D> ViewItem<D> {
    /// Check if the row was wrapped into a document
    pub fn is_document(&self) -> bool {
        matches!(self, ViewItem::Document(_))
    }

    /// Borrow the wrapped document
    pub fn as_document(&self) -> Option<&D> {
        match self {
            ViewItem::Document(doc) => Some(doc),
            ViewItem::Row(_) => None,
        }
    }

    /// Take the wrapped document
    pub fn into_document(self) -> Option<D> {
        match self {
            ViewItem::Document(doc) => Some(doc),
            ViewItem::Row(_) => None,
        }
    }

    /// Borrow the raw row
    pub fn as_row(&self) -> Option<&ViewRow> {
        match self {
            ViewItem::Row(row) => Some(row),
            ViewItem::Document(_) => None,
        }
    }
}

/// Falsy JSON values: null, false, zero, and empty strings, arrays or objects
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Normalize one view row.
///
/// Precedence:
/// 1. a `doc` field with `wrap_doc` set is wrapped as the document
/// 2. an absent or empty `value` returns the row unchanged
/// 3. a non-object `value`, or a row without `id`, returns the row unchanged
/// 4. otherwise `value` is treated as a document body: the row id becomes
///    `_id`, a `rev` field becomes `_rev`, and the result is wrapped
pub fn normalize_row<D: Document>(row: &ViewRow, options: &ViewOptions) -> ProxyResult<ViewItem<D>> {
    if let (Some(doc), true) = (&row.doc, options.wrap_doc) {
        return D::wrap(doc.clone(), options.wrap_options()).map(ViewItem::Document);
    }

    let value = match &row.value {
        Some(value) if !is_empty_value(value) => value,
        _ => return Ok(ViewItem::Row(row.clone())),
    };

    let (Value::Object(body), Some(id)) = (value, row.id.as_deref().filter(|id| !id.is_empty()))
    else {
        return Ok(ViewItem::Row(row.clone()));
    };

    let mut data = body.clone();
    data.insert(ID_FIELD.to_string(), Value::from(id));
    if let Some(rev) = data.remove("rev") {
        data.insert(REV_FIELD.to_string(), rev);
    }
    D::wrap(data, options.wrap_options()).map(ViewItem::Document)
}

/// Result of a view query.
///
/// Holds the backend's rows and normalizes them on every iteration, so the
/// set can be walked any number of times.
#[derive(Debug, Clone)]
pub struct ResultSet<D> {
    rows: Vec<ViewRow>,
    total_rows: u64,
    offset: u64,
    options: ViewOptions,
    _marker: PhantomData<fn() -> D>,
}

impl<D: Document> ResultSet<D> {
    /// Wrap raw backend rows
    pub fn new(rows: ViewRows, options: ViewOptions) -> Self {
        Self {
            rows: rows.rows,
            total_rows: rows.total_rows,
            offset: rows.offset,
            options,
            _marker: PhantomData,
        }
    }

    /// Number of returned rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if no rows were returned
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows emitted by the view before filtering
    pub fn total_rows(&self) -> u64 {
        self.total_rows
    }

    /// Index of the first returned row
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Raw rows as returned by the backend
    pub fn rows(&self) -> &[ViewRow] {
        &self.rows
    }

    /// Iterate over normalized rows
    pub fn iter(&self) -> Iter<'_, D> {
        Iter {
            rows: self.rows.iter(),
            options: self.options,
            _marker: PhantomData,
        }
    }

    /// First normalized row
    pub fn first(&self) -> Option<ProxyResult<ViewItem<D>>> {
        self.iter().next()
    }

    /// Materialize all normalized rows, in order
    pub fn all(&self) -> ProxyResult<Vec<ViewItem<D>>> {
        self.iter().collect()
    }

    /// Materialize only the rows that normalized into documents
    pub fn documents(&self) -> ProxyResult<Vec<D>> {
        let mut docs = Vec::new();
        for item in self.iter() {
            if let ViewItem::Document(doc) = item? {
                docs.push(doc);
            }
        }
        Ok(docs)
    }
}

/// Iterator over normalized rows of a [`ResultSet`]
pub struct Iter<'a, D> {
    rows: std::slice::Iter<'a, ViewRow>,
    options: ViewOptions,
    _marker: PhantomData<fn() -> D>,
}

impl<'a, D: Document> Iterator for Iter<'a, D> {
    type Item = ProxyResult<ViewItem<D>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next().map(|row| normalize_row(row, &self.options))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl<'a, D: Document> IntoIterator for &'a ResultSet<D> {
    type Item = ProxyResult<ViewItem<D>>;
    type IntoIter = Iter<'a, D>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{RawDocument, Schema, TypedDocument};
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        field: String,
    }

    impl Schema for Item {}

    fn row(value: Value) -> ViewRow {
        serde_json::from_value(value).unwrap()
    }

    fn normalize(row: &ViewRow, options: ViewOptions) -> ViewItem<TypedDocument<Item>> {
        normalize_row(row, &options).unwrap()
    }

    #[test]
    fn test_doc_field_wins_when_wrapping() {
        let r = row(json!({
            "id": "a",
            "key": "a",
            "value": {"field": "from-value"},
            "doc": {"_id": "a", "_rev": "1-x", "field": "from-doc"}
        }));

        let item = normalize(&r, ViewOptions::default());
        let doc = item.as_document().unwrap();
        assert_eq!(doc.field, "from-doc");
        assert_eq!(doc.revision(), Some("1-x"));
    }

    #[test]
    fn test_doc_field_ignored_without_wrap_doc() {
        let r = row(json!({
            "id": "a",
            "value": {"field": "from-value"},
            "doc": {"_id": "a", "field": "from-doc"}
        }));

        let options = ViewOptions {
            wrap_doc: false,
            ..Default::default()
        };
        let item = normalize(&r, options);
        assert_eq!(item.as_document().unwrap().field, "from-value");
    }

    #[test]
    fn test_empty_values_return_raw_row() {
        for value in [json!(null), json!(0), json!(""), json!({}), json!([]), json!(false)] {
            let r = row(json!({"id": "a", "key": 1, "value": value}));
            let item = normalize(&r, ViewOptions::default());
            assert_eq!(item.as_row(), Some(&r));
        }

        let r = row(json!({"id": "a", "key": 1}));
        assert!(!normalize(&r, ViewOptions::default()).is_document());
    }

    #[test]
    fn test_non_document_values_return_raw_row() {
        let scalar = row(json!({"id": "a", "key": "k", "value": 5}));
        assert_eq!(normalize(&scalar, ViewOptions::default()).as_row(), Some(&scalar));

        let no_id = row(json!({"key": "k", "value": {"field": "x"}}));
        assert_eq!(normalize(&no_id, ViewOptions::default()).as_row(), Some(&no_id));

        let empty_id = row(json!({"id": "", "key": "k", "value": {"field": "x"}}));
        assert!(!normalize(&empty_id, ViewOptions::default()).is_document());
    }

    #[test]
    fn test_value_wrapped_with_injected_identity() {
        let r = row(json!({"id": "doc-9", "key": "x", "value": {"field": "x", "rev": "3-c"}}));

        let doc = normalize(&r, ViewOptions::default()).into_document().unwrap();
        assert_eq!(doc.id(), Some("doc-9"));
        assert_eq!(doc.revision(), Some("3-c"));
        assert_eq!(doc.field, "x");
        assert!(doc.dynamic_fields().get("rev").is_none());
    }

    #[test]
    fn test_result_set_is_restartable() {
        let rows = ViewRows {
            total_rows: 3,
            offset: 0,
            rows: vec![
                row(json!({"id": "1", "key": 1, "value": {"field": "a"}})),
                row(json!({"id": "2", "key": 2, "value": null})),
            ],
        };
        let results: ResultSet<RawDocument> = ResultSet::new(rows, ViewOptions::default());

        assert_eq!(results.len(), 2);
        assert_eq!(results.total_rows(), 3);
        assert_eq!(results.iter().count(), 2);
        assert_eq!(results.iter().count(), 2);

        let all = results.all().unwrap();
        assert!(all[0].is_document());
        assert!(!all[1].is_document());

        let docs = results.documents().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].get("field"), Some(&json!("a")));

        let mut seen = 0;
        for item in &results {
            item.unwrap();
            seen += 1;
        }
        assert_eq!(seen, 2);
    }

    #[test]
    fn test_wrap_failure_surfaces_per_row() {
        let rows = ViewRows {
            total_rows: 1,
            offset: 0,
            rows: vec![row(json!({"id": "1", "key": 1, "value": {"other": true}}))],
        };
        let results: ResultSet<TypedDocument<Item>> = ResultSet::new(rows, ViewOptions::default());

        assert_eq!(results.len(), 1);
        assert!(results.first().unwrap().is_err());
        assert!(results.all().is_err());
    }
}
