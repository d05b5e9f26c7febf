//! Multi-database proxy
//!
//! A [`Proxy`] holds a registry of named backends and routes every document
//! operation to the backend named by the caller. It keeps the caller's
//! document in step with the backend: identity after save, no identity
//! after delete, the new revision after an attachment write.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use docproxy::backend::MemoryBackend;
//! use docproxy::document::{Document, Schema, TypedDocument};
//! use docproxy::Proxy;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Note {
//!     text: String,
//! }
//!
//! impl Schema for Note {}
//!
//! async fn example() -> docproxy::ProxyResult<()> {
//!     let mut proxy = Proxy::new();
//!     proxy.add_backend("customer_1", Arc::new(MemoryBackend::new()))?;
//!
//!     let mut note = TypedDocument::new(Note { text: "hello".into() });
//!     proxy.save("customer_1", &mut note).await?;
//!
//!     let id = note.id().unwrap_or_default().to_string();
//!     let fetched: TypedDocument<Note> = proxy.get("customer_1", &id).await?;
//!     assert_eq!(fetched.text, "hello");
//!     Ok(())
//! }
//! ```

mod registry;

pub use registry::BackendRegistry;

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::backend::{
    AttachmentContent, AttachmentOptions, AttachmentReceipt, BackendBuilder, BackendSpec,
    DocumentBackend,
};
use crate::document::{Document, WrapOptions, ID_FIELD, REV_FIELD};
use crate::error::{ProxyError, ProxyResult};
use crate::view::{ResultSet, ViewOptions, ViewParams};

/// Options for fetching a single document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Revision to fetch; the current one when `None`
    pub revision: Option<String>,
    /// Keep fields the schema does not declare
    pub allow_dynamic_fields: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            revision: None,
            allow_dynamic_fields: true,
        }
    }
}

impl FetchOptions {
    /// Fetch a specific revision
    pub fn at_revision(revision: impl Into<String>) -> Self {
        Self {
            revision: Some(revision.into()),
            ..Self::default()
        }
    }

    /// Drop fields the schema does not declare
    pub fn strict(mut self) -> Self {
        self.allow_dynamic_fields = false;
        self
    }

    fn wrap_options(&self) -> WrapOptions {
        WrapOptions {
            allow_dynamic_fields: self.allow_dynamic_fields,
        }
    }
}

/// Routes document operations to named backends.
#[derive(Debug, Clone, Default)]
pub struct Proxy {
    registry: BackendRegistry,
}

impl Proxy {
    /// Create a proxy with no backends
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a proxy from `(name, backend)` pairs.
    ///
    /// Later pairs overwrite earlier ones with the same name.
    pub fn with_backends<I, S>(backends: I) -> ProxyResult<Self>
    where
        I: IntoIterator<Item = (S, Arc<dyn DocumentBackend>)>,
        S: Into<String>,
    {
        let mut proxy = Self::new();
        for (name, backend) in backends {
            proxy.add_backend(name, backend)?;
        }
        Ok(proxy)
    }

    /// Build a proxy from configuration, constructing every listed backend
    #[cfg(feature = "config")]
    pub fn from_config(config: &crate::config::ProxyConfig) -> ProxyResult<Self> {
        let mut proxy = Self::new();
        for entry in &config.backends {
            proxy.add_backend_spec(entry.name.clone(), &entry.spec)?;
        }
        info!(
            proxy = %config.proxy.name,
            backends = proxy.len(),
            "proxy configured"
        );
        Ok(proxy)
    }

    /// Register a backend under `name`, replacing any previous entry
    pub fn add_backend(
        &mut self,
        name: impl Into<String>,
        backend: Arc<dyn DocumentBackend>,
    ) -> ProxyResult<()> {
        let name = name.into();
        let backend_type = backend.backend_type();
        let replaced = self.registry.register(name.clone(), backend)?;
        info!(
            backend = %name,
            backend_type,
            replaced = replaced.is_some(),
            "backend registered"
        );
        Ok(())
    }

    /// Construct a backend from its description and register it
    pub fn add_backend_spec(&mut self, name: impl Into<String>, spec: &BackendSpec) -> ProxyResult<()> {
        let name = name.into();
        BackendRegistry::validate_name(&name)?;
        let backend = BackendBuilder::from_spec(spec).build()?;
        self.add_backend(name, backend)
    }

    /// Unregister a backend and return its handle
    pub fn remove_backend(&mut self, name: &str) -> ProxyResult<Arc<dyn DocumentBackend>> {
        let backend = self.registry.remove(name)?;
        info!(backend = %name, "backend removed");
        Ok(backend)
    }

    /// Whether a backend is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Backend registered under `name`
    pub fn get_backend(&self, name: &str) -> ProxyResult<Arc<dyn DocumentBackend>> {
        self.registry.get(name)
    }

    /// Registered names, sorted
    pub fn backend_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Number of registered backends
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether no backend is registered
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Create or update `doc` in the named backend.
    ///
    /// On success the document carries the id and revision the backend
    /// assigned. On failure the document is left as it was.
    pub async fn save<D: Document>(&self, name: &str, doc: &mut D) -> ProxyResult<()> {
        let backend = self.registry.get(name)?;
        let mut repr = doc.to_json()?;
        debug!(backend = %name, doc_id = ?doc.id(), "saving document");

        // The returned identity wins over whatever the backend left in `repr`.
        let outcome = backend.save_document(&mut repr).await?;
        if !outcome.id.is_empty() {
            repr.insert(ID_FIELD.to_string(), Value::String(outcome.id.clone()));
        }
        if !outcome.rev.is_empty() {
            repr.insert(REV_FIELD.to_string(), Value::String(outcome.rev.clone()));
        }

        let has = |field: &str| {
            repr.get(field)
                .and_then(Value::as_str)
                .is_some_and(|value| !value.is_empty())
        };
        match (has(ID_FIELD), has(REV_FIELD)) {
            (true, true) => doc.merge_json(&repr),
            (true, false) => Err(ProxyError::backend(format!(
                "backend '{}' returned no revision for document '{}'",
                name, outcome.id
            ))),
            _ => Err(ProxyError::backend(format!(
                "backend '{}' returned no document id",
                name
            ))),
        }
    }

    /// Fetch the current revision of a document
    pub async fn get<D: Document>(&self, name: &str, doc_id: &str) -> ProxyResult<D> {
        self.get_with(name, doc_id, &FetchOptions::default()).await
    }

    /// Fetch a document with explicit options
    pub async fn get_with<D: Document>(
        &self,
        name: &str,
        doc_id: &str,
        options: &FetchOptions,
    ) -> ProxyResult<D> {
        let backend = self.registry.get(name)?;
        debug!(backend = %name, doc_id, revision = ?options.revision, "fetching document");
        let repr = backend
            .fetch_document(doc_id, options.revision.as_deref())
            .await?;
        D::wrap(repr, options.wrap_options())
    }

    /// Delete a persisted document.
    ///
    /// The document keeps its body and loses its identity, so it can be
    /// saved again as a new document.
    pub async fn delete<D: Document>(&self, name: &str, doc: &mut D) -> ProxyResult<()> {
        let backend = self.registry.get(name)?;
        let id = persisted_id(doc)?;
        debug!(backend = %name, doc_id = %id, "deleting document");

        backend.delete_document(&id, None).await?;
        doc.clear_identity();
        Ok(())
    }

    /// Store an attachment on a persisted document.
    ///
    /// The document moves to the revision the backend reports. Its
    /// attachment stubs are not refreshed; fetch it again to see the new stub.
    pub async fn put_attachment<D: Document>(
        &self,
        name: &str,
        doc: &mut D,
        content: impl Into<Vec<u8>>,
        options: &AttachmentOptions,
    ) -> ProxyResult<AttachmentReceipt> {
        let backend = self.registry.get(name)?;
        let id = persisted_id(doc)?;
        debug!(
            backend = %name,
            doc_id = %id,
            attachment = ?options.name,
            "putting attachment"
        );
        let receipt = backend.put_attachment(&id, content.into(), options).await?;
        refresh_revision(doc, &receipt);
        Ok(receipt)
    }

    /// Fetch attachment content into memory
    pub async fn fetch_attachment<D: Document>(
        &self,
        name: &str,
        doc: &D,
        attachment: &str,
    ) -> ProxyResult<Vec<u8>> {
        self.attachment_content(name, doc, attachment, false)
            .await?
            .into_bytes()
            .await
    }

    /// Fetch attachment content as a byte stream
    pub async fn fetch_attachment_stream<D: Document>(
        &self,
        name: &str,
        doc: &D,
        attachment: &str,
    ) -> ProxyResult<AttachmentContent> {
        self.attachment_content(name, doc, attachment, true).await
    }

    async fn attachment_content<D: Document>(
        &self,
        name: &str,
        doc: &D,
        attachment: &str,
        stream: bool,
    ) -> ProxyResult<AttachmentContent> {
        let backend = self.registry.get(name)?;
        let id = persisted_id(doc)?;
        debug!(backend = %name, doc_id = %id, attachment, stream, "fetching attachment");
        backend.fetch_attachment(&id, attachment, stream).await
    }

    /// Remove an attachment from a persisted document, drop its stub and
    /// move the document to the revision the backend reports
    pub async fn delete_attachment<D: Document>(
        &self,
        name: &str,
        doc: &mut D,
        attachment: &str,
    ) -> ProxyResult<AttachmentReceipt> {
        let backend = self.registry.get(name)?;
        let id = persisted_id(doc)?;
        debug!(backend = %name, doc_id = %id, attachment, "deleting attachment");

        let receipt = backend.delete_attachment(&id, attachment).await?;
        refresh_revision(doc, &receipt);
        if doc.attachments_mut().remove(attachment).is_none() {
            debug!(doc_id = %id, attachment, "document carried no stub for attachment");
        }
        Ok(receipt)
    }

    /// Run a view and return its rows as a lazily normalized result set
    pub async fn view<D: Document>(
        &self,
        name: &str,
        view_name: &str,
        options: ViewOptions,
        params: ViewParams,
    ) -> ProxyResult<ResultSet<D>> {
        let backend = self.registry.get(name)?;
        debug!(backend = %name, view = view_name, "querying view");
        let rows = backend.query_view(view_name, &params).await?;
        Ok(ResultSet::new(rows, options))
    }
}

/// Adopt the revision an attachment write left the document at
fn refresh_revision<D: Document>(doc: &mut D, receipt: &AttachmentReceipt) {
    if !receipt.id.is_empty() && !receipt.rev.is_empty() {
        doc.set_identity(receipt.id.clone(), receipt.rev.clone());
    }
}

fn persisted_id<D: Document>(doc: &D) -> ProxyResult<String> {
    match doc.id() {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(ProxyError::validation("document is not saved")),
    }
}
