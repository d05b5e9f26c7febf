//! In-Memory Document Backend
//!
//! Keeps documents, previous revisions and attachment content in process
//! memory. Useful for tests and for tenants that do not need persistence.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;

use super::stored::{attachment_name, document_id, StoredDocument};
use super::traits::{
    AttachmentContent, AttachmentOptions, AttachmentReceipt, DocumentBackend, SaveOutcome,
};
use crate::document::{JsonMap, REV_FIELD, ID_FIELD};
use crate::error::{ProxyError, ProxyResult};
use crate::view::engine::run_map_view;
use crate::view::{ViewDefinitions, ViewParams, ViewRows};

#[derive(Debug)]
struct MemoryEntry {
    current: StoredDocument,
    /// Earlier revisions by revision token
    history: HashMap<String, JsonMap>,
    /// Attachment content by name
    content: HashMap<String, Vec<u8>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    docs: BTreeMap<String, MemoryEntry>,
    views: ViewDefinitions,
}

/// In-memory document backend
///
/// Previous revisions stay fetchable until the document is deleted.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: RwLock<MemoryState>,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a view while building the backend
    pub fn with_view<F>(mut self, name: impl Into<String>, map: F) -> Self
    where
        F: Fn(&JsonMap) -> Vec<(Value, Value)> + Send + Sync + 'static,
    {
        self.state.get_mut().views.define(name, map);
        self
    }

    /// Register or replace a view
    pub async fn define_view<F>(&self, name: impl Into<String>, map: F)
    where
        F: Fn(&JsonMap) -> Vec<(Value, Value)> + Send + Sync + 'static,
    {
        let name = name.into();
        let mut state = self.state.write().await;
        let views = &mut state.views;
        let replaced = views.contains(&name);
        debug!(view = %name, replaced, "defining view");
        views.define(name, map);
    }

    /// Number of stored documents
    pub async fn document_count(&self) -> usize {
        self.state.read().await.docs.len()
    }

    fn missing(id: &str) -> ProxyError {
        ProxyError::not_found(format!("document '{}'", id))
    }
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    fn backend_type(&self) -> &'static str {
        "memory"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn save_document(&self, doc: &mut JsonMap) -> ProxyResult<SaveOutcome> {
        let id = document_id(doc)?;
        let mut state = self.state.write().await;

        match state.docs.get_mut(&id) {
            Some(entry) => {
                let next = StoredDocument::prepare(id.clone(), doc, Some(&entry.current))?;
                let previous = std::mem::replace(&mut entry.current, next);
                entry
                    .history
                    .insert(previous.rev.clone(), previous.representation()?);
            }
            None => {
                let stored = StoredDocument::prepare(id.clone(), doc, None)?;
                state.docs.insert(
                    id.clone(),
                    MemoryEntry {
                        current: stored,
                        history: HashMap::new(),
                        content: HashMap::new(),
                    },
                );
            }
        }

        let rev = state
            .docs
            .get(&id)
            .map(|entry| entry.current.rev.clone())
            .ok_or_else(|| Self::missing(&id))?;

        doc.insert(ID_FIELD.to_string(), Value::from(id.as_str()));
        doc.insert(REV_FIELD.to_string(), Value::from(rev.as_str()));
        debug!(doc_id = %id, rev = %rev, "memory backend saved document");

        Ok(SaveOutcome { id, rev })
    }

    async fn fetch_document(&self, id: &str, rev: Option<&str>) -> ProxyResult<JsonMap> {
        let state = self.state.read().await;
        let entry = state.docs.get(id).ok_or_else(|| Self::missing(id))?;

        match rev {
            None => entry.current.representation(),
            Some(rev) if rev == entry.current.rev => entry.current.representation(),
            Some(rev) => entry.history.get(rev).cloned().ok_or_else(|| {
                ProxyError::not_found(format!("revision '{}' of document '{}'", rev, id))
            }),
        }
    }

    async fn delete_document(&self, id: &str, rev: Option<&str>) -> ProxyResult<()> {
        let mut state = self.state.write().await;
        let entry = state.docs.get(id).ok_or_else(|| Self::missing(id))?;
        entry.current.check_current(rev)?;

        state.docs.remove(id);
        debug!(doc_id = %id, "memory backend deleted document");
        Ok(())
    }

    async fn fetch_attachment(
        &self,
        id: &str,
        name: &str,
        stream: bool,
    ) -> ProxyResult<AttachmentContent> {
        let state = self.state.read().await;
        let entry = state.docs.get(id).ok_or_else(|| Self::missing(id))?;
        let data = entry.content.get(name).cloned().ok_or_else(|| {
            ProxyError::not_found(format!("attachment '{}' of document '{}'", name, id))
        })?;

        if stream {
            Ok(AttachmentContent::Stream(Box::pin(std::io::Cursor::new(data))))
        } else {
            Ok(AttachmentContent::Bytes(data))
        }
    }

    async fn put_attachment(
        &self,
        id: &str,
        content: Vec<u8>,
        options: &AttachmentOptions,
    ) -> ProxyResult<AttachmentReceipt> {
        let name = attachment_name(options.name.as_deref(), options.content_length, &content)?;

        let mut state = self.state.write().await;
        let entry = state.docs.get_mut(id).ok_or_else(|| Self::missing(id))?;

        let previous = entry.current.clone();
        entry
            .current
            .attach(name, options.content_type.as_deref(), &content)?;
        entry
            .history
            .insert(previous.rev.clone(), previous.representation()?);
        entry.content.insert(name.to_string(), content);

        Ok(AttachmentReceipt {
            ok: true,
            id: id.to_string(),
            rev: entry.current.rev.clone(),
        })
    }

    async fn delete_attachment(&self, id: &str, name: &str) -> ProxyResult<AttachmentReceipt> {
        let mut state = self.state.write().await;
        let entry = state.docs.get_mut(id).ok_or_else(|| Self::missing(id))?;

        let previous = entry.current.clone();
        entry.current.detach(name)?;
        entry
            .history
            .insert(previous.rev.clone(), previous.representation()?);
        entry.content.remove(name);

        Ok(AttachmentReceipt {
            ok: true,
            id: id.to_string(),
            rev: entry.current.rev.clone(),
        })
    }

    async fn query_view(&self, view: &str, params: &ViewParams) -> ProxyResult<ViewRows> {
        let state = self.state.read().await;
        let map = state.views.get(view)?;

        let docs = state
            .docs
            .values()
            .map(|entry| entry.current.representation())
            .collect::<ProxyResult<Vec<JsonMap>>>()?;

        Ok(run_map_view(&map, &docs, params))
    }
}
