//! Document Traits
//!
//! Defines the capability every document type must provide to be routed
//! through the proxy.

use serde_json::Value;

use super::{Attachments, JsonMap, ATTACHMENTS_FIELD, ID_FIELD, REV_FIELD};
use crate::error::{ProxyError, ProxyResult};

/// Options applied when materializing a document from its representation.
///
/// Passed per call; nothing about wrapping is stored on the document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapOptions {
    /// Keep fields the schema does not declare
    pub allow_dynamic_fields: bool,
}

impl Default for WrapOptions {
    fn default() -> Self {
        Self {
            allow_dynamic_fields: true,
        }
    }
}

impl WrapOptions {
    /// Options that drop undeclared fields
    pub fn strict() -> Self {
        Self {
            allow_dynamic_fields: false,
        }
    }
}

/// Core trait for documents handled by the proxy
///
/// A document is *new* until a backend assigns it an id and a revision.
/// Implementations must keep the two identity fields consistent: both set
/// or both absent.
pub trait Document: Send + Sync {
    /// Document id, if assigned
    fn id(&self) -> Option<&str>;

    /// Current revision token, if assigned
    fn revision(&self) -> Option<&str>;

    /// Assign both identity fields
    fn set_identity(&mut self, id: String, revision: String);

    /// Remove both identity fields, making the document new again
    fn clear_identity(&mut self);

    /// Attachment stubs
    fn attachments(&self) -> &Attachments;

    /// Mutable attachment stubs
    fn attachments_mut(&mut self) -> &mut Attachments;

    /// Serialize to the transport representation
    fn to_json(&self) -> ProxyResult<JsonMap>;

    /// Materialize a document from its transport representation
    fn wrap(repr: JsonMap, options: WrapOptions) -> ProxyResult<Self>
    where
        Self: Sized;

    /// Whether the document has never been saved
    fn is_new(&self) -> bool {
        self.id().map_or(true, str::is_empty)
    }

    /// Merge a saved representation back into this document.
    ///
    /// Copies identity and, when present, the attachment stubs. The
    /// representation must carry both `_id` and `_rev`.
    fn merge_json(&mut self, repr: &JsonMap) -> ProxyResult<()> {
        let id = repr.get(ID_FIELD).and_then(Value::as_str);
        let rev = repr.get(REV_FIELD).and_then(Value::as_str);

        match (id, rev) {
            (Some(id), Some(rev)) if !id.is_empty() && !rev.is_empty() => {
                self.set_identity(id.to_string(), rev.to_string());
            }
            _ => {
                return Err(ProxyError::validation(
                    "representation must carry both _id and _rev",
                ))
            }
        }

        if let Some(stubs) = repr.get(ATTACHMENTS_FIELD) {
            *self.attachments_mut() = serde_json::from_value(stubs.clone())?;
        }

        Ok(())
    }
}

/// Remove a string field from a representation.
///
/// A present but non-string value is a validation error.
pub(crate) fn take_string(repr: &mut JsonMap, field: &str) -> ProxyResult<Option<String>> {
    match repr.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(ProxyError::validation(format!(
            "field '{}' must be a string, found {}",
            field, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wrap_options_default_allows_dynamic() {
        assert!(WrapOptions::default().allow_dynamic_fields);
        assert!(!WrapOptions::strict().allow_dynamic_fields);
    }

    #[test]
    fn test_take_string() {
        let mut repr = json!({"_id": "abc", "_rev": 3, "empty": null})
            .as_object()
            .cloned()
            .unwrap();

        assert_eq!(take_string(&mut repr, "_id").unwrap(), Some("abc".to_string()));
        assert!(!repr.contains_key("_id"));
        assert_eq!(take_string(&mut repr, "missing").unwrap(), None);
        assert_eq!(take_string(&mut repr, "empty").unwrap(), None);

        let err = take_string(&mut repr, "_rev").unwrap_err();
        assert!(err.is_type_validation());
    }
}
