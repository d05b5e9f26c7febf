//! Schemaless documents.

use serde_json::Value;

use super::traits::take_string;
use super::{Attachments, Document, JsonMap, WrapOptions, ATTACHMENTS_FIELD, ID_FIELD, REV_FIELD};
use crate::error::{ProxyError, ProxyResult};

/// A document whose body is an untyped JSON mapping.
///
/// Every field is kept on wrap regardless of [`WrapOptions`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDocument {
    id: Option<String>,
    revision: Option<String>,
    attachments: Attachments,
    fields: JsonMap,
}

impl RawDocument {
    /// Create an empty, unsaved document
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from a JSON object value
    pub fn from_value(value: Value) -> ProxyResult<Self> {
        match value {
            Value::Object(map) => Self::wrap(map, WrapOptions::default()),
            other => Err(ProxyError::validation(format!(
                "raw document must be a JSON object, got {}",
                other
            ))),
        }
    }

    /// Get a body field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Set a body field, returning the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(key.into(), value)
    }

    /// Remove a body field
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// All body fields (identity and attachments excluded)
    pub fn fields(&self) -> &JsonMap {
        &self.fields
    }
}

impl Document for RawDocument {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    fn set_identity(&mut self, id: String, revision: String) {
        self.id = Some(id);
        self.revision = Some(revision);
    }

    fn clear_identity(&mut self) {
        self.id = None;
        self.revision = None;
    }

    fn attachments(&self) -> &Attachments {
        &self.attachments
    }

    fn attachments_mut(&mut self) -> &mut Attachments {
        &mut self.attachments
    }

    fn to_json(&self) -> ProxyResult<JsonMap> {
        let mut repr = self.fields.clone();
        if let Some(id) = &self.id {
            repr.insert(ID_FIELD.to_string(), Value::from(id.as_str()));
        }
        if let Some(rev) = &self.revision {
            repr.insert(REV_FIELD.to_string(), Value::from(rev.as_str()));
        }
        if !self.attachments.is_empty() {
            repr.insert(
                ATTACHMENTS_FIELD.to_string(),
                serde_json::to_value(&self.attachments)?,
            );
        }
        Ok(repr)
    }

    fn wrap(mut repr: JsonMap, _options: WrapOptions) -> ProxyResult<Self> {
        let id = take_string(&mut repr, ID_FIELD)?;
        let revision = take_string(&mut repr, REV_FIELD)?;
        let attachments = match repr.remove(ATTACHMENTS_FIELD) {
            Some(stubs) => serde_json::from_value(stubs)?,
            None => Attachments::new(),
        };

        Ok(Self {
            id,
            revision,
            attachments,
            fields: repr,
        })
    }
}
