//! Stored document records and revision bookkeeping shared by the bundled
//! backends.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::document::{
    AttachmentStub, Attachments, JsonMap, ATTACHMENTS_FIELD, ID_FIELD, REV_FIELD,
};
use crate::error::{ProxyError, ProxyResult};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Generate a fresh document id
pub fn new_doc_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Generation number of a revision (`"3-abc"` -> 3)
pub fn generation(rev: &str) -> u64 {
    rev.split_once('-')
        .and_then(|(gen, _)| gen.parse().ok())
        .unwrap_or(0)
}

/// Compute the revision following `previous` for the given body.
///
/// Format: `"{generation}-{hash}"` where the hash covers the previous
/// revision and the serialized body.
pub fn next_revision(previous: Option<&str>, body: &JsonMap) -> ProxyResult<String> {
    let next_gen = previous.map(generation).unwrap_or(0) + 1;

    let mut hasher = Sha256::new();
    hasher.update(previous.unwrap_or("").as_bytes());
    hasher.update(serde_json::to_vec(body)?);
    let digest = hasher.finalize();

    Ok(format!("{}-{}", next_gen, hex(&digest[..16])))
}

/// Digest recorded on attachment stubs
pub fn content_digest(data: &[u8]) -> String {
    format!("sha256-{}", hex(&Sha256::digest(data)))
}

/// Resolve the id a save should use, generating one for new documents
pub(crate) fn document_id(doc: &JsonMap) -> ProxyResult<String> {
    match doc.get(ID_FIELD) {
        None | Some(Value::Null) => Ok(new_doc_id()),
        Some(Value::String(id)) if id.is_empty() => Ok(new_doc_id()),
        Some(Value::String(id)) => Ok(id.clone()),
        Some(other) => Err(ProxyError::validation(format!(
            "document _id must be a string, got {}",
            other
        ))),
    }
}

/// One revision of a document as kept by a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct StoredDocument {
    pub id: String,
    pub rev: String,
    pub body: JsonMap,
    #[serde(default)]
    pub attachments: Attachments,
}

impl StoredDocument {
    /// Build the revision that saving `doc` over `existing` produces.
    ///
    /// Updates must name the current revision; creates must not name any.
    /// Attachments carry over from the existing revision.
    pub fn prepare(
        id: String,
        doc: &JsonMap,
        existing: Option<&StoredDocument>,
    ) -> ProxyResult<Self> {
        let given = doc.get(REV_FIELD).and_then(Value::as_str);
        let body: JsonMap = doc
            .iter()
            .filter(|(key, _)| {
                !matches!(key.as_str(), ID_FIELD | REV_FIELD | ATTACHMENTS_FIELD)
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        match existing {
            Some(current) => {
                if given != Some(current.rev.as_str()) {
                    return Err(ProxyError::conflict(format!(
                        "document '{}' update conflict: current revision is {}, got {}",
                        id,
                        current.rev,
                        given.unwrap_or("none")
                    )));
                }
                Ok(Self {
                    rev: next_revision(Some(&current.rev), &body)?,
                    attachments: current.attachments.clone(),
                    id,
                    body,
                })
            }
            None => {
                if let Some(rev) = given {
                    return Err(ProxyError::conflict(format!(
                        "document '{}' does not exist at revision {}",
                        id, rev
                    )));
                }
                Ok(Self {
                    rev: next_revision(None, &body)?,
                    attachments: Attachments::new(),
                    id,
                    body,
                })
            }
        }
    }

    /// Transport representation (`_id`, `_rev`, body, `_attachments` stubs)
    pub fn representation(&self) -> ProxyResult<JsonMap> {
        let mut repr = self.body.clone();
        repr.insert(ID_FIELD.to_string(), Value::from(self.id.as_str()));
        repr.insert(REV_FIELD.to_string(), Value::from(self.rev.as_str()));
        if !self.attachments.is_empty() {
            repr.insert(
                ATTACHMENTS_FIELD.to_string(),
                serde_json::to_value(&self.attachments)?,
            );
        }
        Ok(repr)
    }

    /// Fail unless `rev` (when given) is the current revision
    pub fn check_current(&self, rev: Option<&str>) -> ProxyResult<()> {
        match rev {
            Some(rev) if rev != self.rev => Err(ProxyError::not_found(format!(
                "revision '{}' of document '{}' (current is {})",
                rev, self.id, self.rev
            ))),
            _ => Ok(()),
        }
    }

    /// Record an attachment and move to a new revision
    pub fn attach(
        &mut self,
        name: &str,
        content_type: Option<&str>,
        data: &[u8],
    ) -> ProxyResult<()> {
        let mut stub = AttachmentStub::new(
            content_type.unwrap_or(DEFAULT_CONTENT_TYPE),
            data.len() as u64,
        );
        stub.digest = Some(content_digest(data));
        stub.revpos = Some(generation(&self.rev) + 1);
        self.attachments.insert(name.to_string(), stub);
        self.bump()
    }

    /// Drop an attachment and move to a new revision
    pub fn detach(&mut self, name: &str) -> ProxyResult<()> {
        if self.attachments.remove(name).is_none() {
            return Err(ProxyError::not_found(format!(
                "attachment '{}' of document '{}'",
                name, self.id
            )));
        }
        self.bump()
    }

    fn bump(&mut self) -> ProxyResult<()> {
        let mut hashed = self.body.clone();
        hashed.insert(
            ATTACHMENTS_FIELD.to_string(),
            serde_json::to_value(&self.attachments)?,
        );
        self.rev = next_revision(Some(&self.rev), &hashed)?;
        Ok(())
    }
}

/// Validate attachment options against content, returning the name
pub(crate) fn attachment_name<'a>(
    name: Option<&'a str>,
    content_length: Option<u64>,
    content: &[u8],
) -> ProxyResult<&'a str> {
    let name = name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ProxyError::validation("attachment name is required"))?;

    if let Some(expected) = content_length {
        if expected != content.len() as u64 {
            return Err(ProxyError::validation(format!(
                "attachment '{}' content length mismatch: declared {}, got {}",
                name,
                expected,
                content.len()
            )));
        }
    }

    Ok(name)
}
