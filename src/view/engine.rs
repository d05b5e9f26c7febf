//! Map-only view engine shared by the bundled backends.
//!
//! Backends register map functions by view name; a query runs the map
//! function over every stored document, orders the emitted rows by key
//! collation and applies the range / paging parameters.

use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{ViewParams, ViewRow, ViewRows};
use crate::document::{JsonMap, ID_FIELD};
use crate::error::{ProxyError, ProxyResult};

/// A map function: receives a stored document, returns emitted `(key, value)` pairs
pub type MapFn = Arc<dyn Fn(&JsonMap) -> Vec<(Value, Value)> + Send + Sync>;

/// Map functions indexed by view name (e.g. `"test/all"`)
#[derive(Clone, Default)]
pub struct ViewDefinitions {
    views: HashMap<String, MapFn>,
}

impl ViewDefinitions {
    /// Create an empty set of views
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a view
    pub fn define<F>(&mut self, name: impl Into<String>, map: F)
    where
        F: Fn(&JsonMap) -> Vec<(Value, Value)> + Send + Sync + 'static,
    {
        self.views.insert(name.into(), Arc::new(map));
    }

    /// Look up a view's map function
    pub fn get(&self, name: &str) -> ProxyResult<MapFn> {
        self.views
            .get(name)
            .cloned()
            .ok_or_else(|| ProxyError::not_found(format!("view '{}'", name)))
    }

    /// Check whether a view is defined
    pub fn contains(&self, name: &str) -> bool {
        self.views.contains_key(name)
    }

    /// Defined view names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.views.keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for ViewDefinitions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewDefinitions")
            .field("views", &self.names())
            .finish()
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(false) => 1,
        Value::Bool(true) => 2,
        Value::Number(_) => 3,
        Value::String(_) => 4,
        Value::Array(_) => 5,
        Value::Object(_) => 6,
    }
}

/// Compare two view keys.
///
/// null < false < true < numbers < strings < arrays < objects. Arrays and
/// objects compare element by element, then by length. Strings compare by
/// code point.
pub fn collate(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (left, right) in x.iter().zip(y.iter()) {
                let ord = collate(left, right);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(x), Value::Object(y)) => {
            for ((lk, lv), (rk, rv)) in x.iter().zip(y.iter()) {
                let ord = lk.cmp(rk).then_with(|| collate(lv, rv));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

struct Emitted<'a> {
    id: String,
    key: Value,
    value: Value,
    doc: &'a JsonMap,
}

/// Run a map view over documents and apply query parameters.
///
/// Documents without a string `_id` are skipped.
pub fn run_map_view<'a, I>(map: &MapFn, docs: I, params: &ViewParams) -> ViewRows
where
    I: IntoIterator<Item = &'a JsonMap>,
{
    let mut emitted: Vec<Emitted<'a>> = Vec::new();
    for doc in docs {
        let Some(id) = doc.get(ID_FIELD).and_then(Value::as_str) else {
            continue;
        };
        for (key, value) in map(doc) {
            emitted.push(Emitted {
                id: id.to_string(),
                key,
                value,
                doc,
            });
        }
    }

    emitted.sort_by(|a, b| collate(&a.key, &b.key).then_with(|| a.id.cmp(&b.id)));
    if params.descending {
        emitted.reverse();
    }

    let total_rows = emitted.len() as u64;
    let selected: Vec<(usize, Emitted<'a>)> = match &params.keys {
        Some(keys) => {
            // Rows follow the order of the requested keys
            let mut out = Vec::new();
            for wanted in keys {
                for (idx, row) in emitted.iter().enumerate() {
                    if collate(&row.key, wanted) == Ordering::Equal {
                        out.push((
                            idx,
                            Emitted {
                                id: row.id.clone(),
                                key: row.key.clone(),
                                value: row.value.clone(),
                                doc: row.doc,
                            },
                        ));
                    }
                }
            }
            out
        }
        None => emitted
            .into_iter()
            .enumerate()
            .filter(|(_, row)| in_range(&row.key, params))
            .collect(),
    };

    let offset = selected
        .get(params.skip)
        .map(|(idx, _)| *idx as u64)
        .unwrap_or(total_rows);

    let limit = params.limit.unwrap_or(usize::MAX);
    let rows = selected
        .into_iter()
        .skip(params.skip)
        .take(limit)
        .map(|(_, row)| ViewRow {
            id: Some(row.id),
            key: row.key,
            value: Some(row.value),
            doc: params.include_docs.then(|| row.doc.clone()),
        })
        .collect();

    ViewRows {
        total_rows,
        offset,
        rows,
    }
}

fn in_range(key: &Value, params: &ViewParams) -> bool {
    if let Some(exact) = &params.key {
        return collate(key, exact) == Ordering::Equal;
    }

    // Ranges are expressed in iteration order, so descending flips them
    let forward = |ord: Ordering| if params.descending { ord.reverse() } else { ord };

    if let Some(start) = &params.startkey {
        if forward(collate(key, start)) == Ordering::Less {
            return false;
        }
    }
    if let Some(end) = &params.endkey {
        let ord = forward(collate(key, end));
        let inclusive = params.inclusive_end.unwrap_or(true);
        if ord == Ordering::Greater || (!inclusive && ord == Ordering::Equal) {
            return false;
        }
    }
    true
}
