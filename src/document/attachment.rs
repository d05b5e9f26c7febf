//! Attachment metadata carried inside documents.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attachment stubs indexed by attachment name
pub type Attachments = BTreeMap<String, AttachmentStub>;

/// Metadata describing one stored attachment.
///
/// Stubs never carry content; content is fetched through the proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentStub {
    /// MIME type of the content
    pub content_type: String,
    /// Content length in bytes
    pub length: u64,
    /// Content digest (`sha256-<hex>`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// Revision generation at which the attachment was last written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revpos: Option<u64>,
    /// Always true for metadata-only entries
    #[serde(default = "default_stub")]
    pub stub: bool,
}

fn default_stub() -> bool {
    true
}

impl AttachmentStub {
    /// Create a stub for content of the given type and length
    pub fn new(content_type: impl Into<String>, length: u64) -> Self {
        Self {
            content_type: content_type.into(),
            length,
            digest: None,
            revpos: None,
            stub: true,
        }
    }
}
