//! Serde-typed documents.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::ops::{Deref, DerefMut};

use super::traits::take_string;
use super::{
    Attachments, Document, JsonMap, WrapOptions, ATTACHMENTS_FIELD, DOC_TYPE_FIELD, ID_FIELD,
    REV_FIELD,
};
use crate::error::{ProxyError, ProxyResult};

/// A document body schema.
///
/// Any serde type that serializes to a JSON object qualifies. The body must
/// not declare `_id`, `_rev` or `_attachments`; those live on the
/// [`TypedDocument`] wrapper.
pub trait Schema: Serialize + DeserializeOwned + Send + Sync {
    /// Value written to the `doc_type` field (defaults to the type name)
    fn doc_type() -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }
}

/// A document with a typed body
///
/// Dereferences to the body, so schema fields read as `doc.field`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedDocument<T> {
    id: Option<String>,
    revision: Option<String>,
    attachments: Attachments,
    dynamic: JsonMap,
    body: T,
}

impl<T: Schema> TypedDocument<T> {
    /// Create a new, unsaved document
    pub fn new(body: T) -> Self {
        Self {
            id: None,
            revision: None,
            attachments: Attachments::new(),
            dynamic: JsonMap::new(),
            body,
        }
    }

    /// Create a new document with a caller-chosen id
    pub fn with_id(id: impl Into<String>, body: T) -> Self {
        let mut doc = Self::new(body);
        doc.id = Some(id.into());
        doc
    }

    /// Typed body
    pub fn body(&self) -> &T {
        &self.body
    }

    /// Mutable typed body
    pub fn body_mut(&mut self) -> &mut T {
        &mut self.body
    }

    /// Consume the document, returning the body
    pub fn into_body(self) -> T {
        self.body
    }

    /// Fields present in the stored document but not declared by `T`
    pub fn dynamic_fields(&self) -> &JsonMap {
        &self.dynamic
    }

    /// Set an undeclared field
    pub fn set_dynamic(&mut self, key: impl Into<String>, value: Value) {
        self.dynamic.insert(key.into(), value);
    }
}

impl<T> Deref for TypedDocument<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.body
    }
}

impl<T> DerefMut for TypedDocument<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.body
    }
}

impl<T: Schema> Document for TypedDocument<T> {
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
        let mut repr = match serde_json::to_value(&self.body)? {
            Value::Object(map) => map,
            other => {
                return Err(ProxyError::validation(format!(
                    "{} body must serialize to a JSON object, got {}",
                    T::doc_type(),
                    other
                )))
            }
        };

        // Declared fields win over dynamic ones with the same name
        for (key, value) in &self.dynamic {
            repr.entry(key.clone()).or_insert_with(|| value.clone());
        }

        repr.insert(DOC_TYPE_FIELD.to_string(), Value::from(T::doc_type()));
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

    fn wrap(mut repr: JsonMap, options: WrapOptions) -> ProxyResult<Self> {
        let id = take_string(&mut repr, ID_FIELD)?;
        let revision = take_string(&mut repr, REV_FIELD)?;
        let attachments = match repr.remove(ATTACHMENTS_FIELD) {
            Some(stubs) => serde_json::from_value(stubs)?,
            None => Attachments::new(),
        };
        repr.remove(DOC_TYPE_FIELD);

        let body: T = serde_json::from_value(Value::Object(repr.clone()))?;

        let dynamic = if options.allow_dynamic_fields {
            let declared = match serde_json::to_value(&body)? {
                Value::Object(map) => map,
                _ => JsonMap::new(),
            };
            repr.into_iter()
                .filter(|(key, _)| !declared.contains_key(key))
                .collect()
        } else {
            JsonMap::new()
        };

        Ok(Self {
            id,
            revision,
            attachments,
            dynamic,
            body,
        })
    }
}
