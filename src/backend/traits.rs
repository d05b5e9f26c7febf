//! Document Backend Traits
//!
//! Defines the capability a database handle must provide to be registered
//! with the proxy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::document::JsonMap;
use crate::error::ProxyResult;
use crate::view::{ViewParams, ViewRows};

/// Identity assigned by a successful save
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOutcome {
    /// Document id
    pub id: String,
    /// New revision
    pub rev: String,
}

/// Result of an attachment write or delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentReceipt {
    /// Whether the backend acknowledged the operation
    pub ok: bool,
    /// Id of the owning document
    pub id: String,
    /// Revision of the owning document after the change
    pub rev: String,
}

/// Metadata accompanying attachment content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentOptions {
    /// Attachment name
    pub name: Option<String>,
    /// MIME type (backends default to `application/octet-stream`)
    pub content_type: Option<String>,
    /// Expected content length in bytes
    pub content_length: Option<u64>,
}

impl AttachmentOptions {
    /// Options for a named attachment
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Set the content type
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the expected content length
    pub fn with_content_length(mut self, length: u64) -> Self {
        self.content_length = Some(length);
        self
    }
}

/// Streaming attachment reader
pub type AttachmentStream = Pin<Box<dyn AsyncRead + Send>>;

/// Attachment content, buffered or streamed
pub enum AttachmentContent {
    /// Fully buffered content
    Bytes(Vec<u8>),
    /// Content to be read incrementally
    Stream(AttachmentStream),
}

impl AttachmentContent {
    /// Check if the content is streamed
    pub fn is_stream(&self) -> bool {
        matches!(self, AttachmentContent::Stream(_))
    }

    /// Read the whole content into memory
    pub async fn into_bytes(self) -> ProxyResult<Vec<u8>> {
        match self {
            AttachmentContent::Bytes(bytes) => Ok(bytes),
            AttachmentContent::Stream(mut stream) => {
                let mut buf = Vec::new();
                stream.read_to_end(&mut buf).await?;
                Ok(buf)
            }
        }
    }
}

impl fmt::Debug for AttachmentContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentContent::Bytes(bytes) => f
                .debug_tuple("Bytes")
                .field(&format_args!("{} bytes", bytes.len()))
                .finish(),
            AttachmentContent::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Core trait for document backends
///
/// A backend is a handle to one logical database. All backends must be
/// shareable across tasks; the proxy holds them behind `Arc`.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Get the backend type name (e.g., "memory", "file")
    fn backend_type(&self) -> &'static str;

    /// Check if the backend is available/connected
    async fn is_available(&self) -> bool;

    /// Create or update a document.
    ///
    /// On success the assigned `_id` and new `_rev` are written back into
    /// `doc`. Updating requires `_rev` to match the current revision.
    async fn save_document(&self, doc: &mut JsonMap) -> ProxyResult<SaveOutcome>;

    /// Fetch a document, at `rev` if given, else at its current revision
    async fn fetch_document(&self, id: &str, rev: Option<&str>) -> ProxyResult<JsonMap>;

    /// Delete a document, at `rev` if given, else at its current revision
    async fn delete_document(&self, id: &str, rev: Option<&str>) -> ProxyResult<()>;

    /// Fetch attachment content
    async fn fetch_attachment(
        &self,
        id: &str,
        name: &str,
        stream: bool,
    ) -> ProxyResult<AttachmentContent>;

    /// Store attachment content on a document
    async fn put_attachment(
        &self,
        id: &str,
        content: Vec<u8>,
        options: &AttachmentOptions,
    ) -> ProxyResult<AttachmentReceipt>;

    /// Remove an attachment from a document
    async fn delete_attachment(&self, id: &str, name: &str) -> ProxyResult<AttachmentReceipt>;

    /// Run a view and return its raw rows
    async fn query_view(&self, view: &str, params: &ViewParams) -> ProxyResult<ViewRows>;

    /// Check if a document exists (default implementation)
    async fn document_exists(&self, id: &str) -> ProxyResult<bool> {
        match self.fetch_document(id, None).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}
