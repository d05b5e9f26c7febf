//! File System Document Backend
//!
//! Persists each document in its own directory under a base path:
//!
//! ```text
//! <base>/doc-<escaped id>/doc.json
//! <base>/doc-<escaped id>/attachments/att-<escaped name>
//! ```
//!
//! Only the current revision is kept.

use async_trait::async_trait;
use serde_json::Value;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::stored::{attachment_name, document_id, StoredDocument};
use super::traits::{
    AttachmentContent, AttachmentOptions, AttachmentReceipt, DocumentBackend, SaveOutcome,
};
use crate::document::{JsonMap, ID_FIELD, REV_FIELD};
use crate::error::{ProxyError, ProxyResult};
use crate::view::engine::run_map_view;
use crate::view::{ViewDefinitions, ViewParams, ViewRows};

const RECORD_FILE: &str = "doc.json";
const ATTACHMENTS_DIR: &str = "attachments";

/// File system document backend
///
/// Writes go through a temp file + rename so readers never observe a
/// partially written record. Mutations are serialized by an internal lock.
#[derive(Debug)]
pub struct FileBackend {
    base_path: PathBuf,
    write_lock: Mutex<()>,
    views: RwLock<ViewDefinitions>,
}

impl FileBackend {
    /// Create a new file backend
    ///
    /// # Arguments
    /// * `base_path` - Base directory for all documents
    pub fn new<P: AsRef<Path>>(base_path: P) -> ProxyResult<Self> {
        let base_path = base_path.as_ref().to_path_buf();

        // Create base directory if it doesn't exist (synchronously for constructor)
        std::fs::create_dir_all(&base_path)?;

        Ok(Self {
            base_path,
            write_lock: Mutex::new(()),
            views: RwLock::new(ViewDefinitions::new()),
        })
    }

    /// Get the base path
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Register a view while building the backend
    pub fn with_view<F>(mut self, name: impl Into<String>, map: F) -> Self
    where
        F: Fn(&JsonMap) -> Vec<(Value, Value)> + Send + Sync + 'static,
    {
        self.views.get_mut().define(name, map);
        self
    }

    /// Register or replace a view
    pub async fn define_view<F>(&self, name: impl Into<String>, map: F)
    where
        F: Fn(&JsonMap) -> Vec<(Value, Value)> + Send + Sync + 'static,
    {
        let name = name.into();
        let mut views = self.views.write().await;
        let replaced = views.contains(&name);
        debug!(view = %name, replaced, "defining view");
        views.define(name, map);
    }

    /// Directory holding one document. The prefix keeps escaped ids from
    /// ever being `.` or `..`.
    fn doc_dir(&self, id: &str) -> PathBuf {
        self.base_path.join(format!("doc-{}", urlencoding::encode(id)))
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.doc_dir(id).join(RECORD_FILE)
    }

    fn attachment_path(&self, id: &str, name: &str) -> PathBuf {
        self.doc_dir(id)
            .join(ATTACHMENTS_DIR)
            .join(format!("att-{}", urlencoding::encode(name)))
    }

    fn missing(id: &str) -> ProxyError {
        ProxyError::not_found(format!("document '{}'", id))
    }

    async fn read_record(&self, id: &str) -> ProxyResult<Option<StoredDocument>> {
        let path = self.record_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read(&path).await?;
        Ok(Some(serde_json::from_slice(&data)?))
    }

    async fn require_record(&self, id: &str) -> ProxyResult<StoredDocument> {
        self.read_record(id).await?.ok_or_else(|| Self::missing(id))
    }

    async fn write_record(&self, record: &StoredDocument) -> ProxyResult<()> {
        let data = serde_json::to_vec_pretty(record)?;
        write_atomic(&self.record_path(&record.id), &data).await
    }
}

/// Write atomically using temp file + rename pattern
async fn write_atomic(path: &Path, data: &[u8]) -> ProxyResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut temp_name = OsString::from(path.as_os_str());
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    let mut file = fs::File::create(&temp_path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;

    fs::rename(&temp_path, path).await?;
    Ok(())
}

#[async_trait]
impl DocumentBackend for FileBackend {
    fn backend_type(&self) -> &'static str {
        "file"
    }

    async fn is_available(&self) -> bool {
        fs::metadata(&self.base_path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    async fn save_document(&self, doc: &mut JsonMap) -> ProxyResult<SaveOutcome> {
        let id = document_id(doc)?;
        let _guard = self.write_lock.lock().await;

        let existing = self.read_record(&id).await?;
        let next = StoredDocument::prepare(id.clone(), doc, existing.as_ref())?;
        self.write_record(&next).await?;

        doc.insert(ID_FIELD.to_string(), Value::from(next.id.as_str()));
        doc.insert(REV_FIELD.to_string(), Value::from(next.rev.as_str()));
        debug!(doc_id = %next.id, rev = %next.rev, path = %self.base_path.display(), "file backend saved document");

        Ok(SaveOutcome {
            id: next.id,
            rev: next.rev,
        })
    }

    async fn fetch_document(&self, id: &str, rev: Option<&str>) -> ProxyResult<JsonMap> {
        let record = self.require_record(id).await?;
        record.check_current(rev)?;
        record.representation()
    }

    async fn delete_document(&self, id: &str, rev: Option<&str>) -> ProxyResult<()> {
        let _guard = self.write_lock.lock().await;

        let record = self.require_record(id).await?;
        record.check_current(rev)?;
        fs::remove_dir_all(self.doc_dir(id)).await?;

        debug!(doc_id = %id, "file backend deleted document");
        Ok(())
    }

    async fn fetch_attachment(
        &self,
        id: &str,
        name: &str,
        stream: bool,
    ) -> ProxyResult<AttachmentContent> {
        let record = self.require_record(id).await?;
        if !record.attachments.contains_key(name) {
            return Err(ProxyError::not_found(format!(
                "attachment '{}' of document '{}'",
                name, id
            )));
        }

        let path = self.attachment_path(id, name);
        if stream {
            let file = fs::File::open(&path).await?;
            Ok(AttachmentContent::Stream(Box::pin(file)))
        } else {
            Ok(AttachmentContent::Bytes(fs::read(&path).await?))
        }
    }

    async fn put_attachment(
        &self,
        id: &str,
        content: Vec<u8>,
        options: &AttachmentOptions,
    ) -> ProxyResult<AttachmentReceipt> {
        let name = attachment_name(options.name.as_deref(), options.content_length, &content)?;
        let _guard = self.write_lock.lock().await;

        let mut record = self.require_record(id).await?;
        record.attach(name, options.content_type.as_deref(), &content)?;

        write_atomic(&self.attachment_path(id, name), &content).await?;
        self.write_record(&record).await?;

        Ok(AttachmentReceipt {
            ok: true,
            id: record.id,
            rev: record.rev,
        })
    }

    async fn delete_attachment(&self, id: &str, name: &str) -> ProxyResult<AttachmentReceipt> {
        let _guard = self.write_lock.lock().await;

        let mut record = self.require_record(id).await?;
        record.detach(name)?;
        self.write_record(&record).await?;

        let path = self.attachment_path(id, name);
        if path.exists() {
            fs::remove_file(&path).await?;
        }

        Ok(AttachmentReceipt {
            ok: true,
            id: record.id,
            rev: record.rev,
        })
    }

    async fn query_view(&self, view: &str, params: &ViewParams) -> ProxyResult<ViewRows> {
        let map = self.views.read().await.get(view)?;

        let mut docs = Vec::new();
        let mut entries = fs::read_dir(&self.base_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let record_path = entry.path().join(RECORD_FILE);
            if !record_path.exists() {
                continue;
            }
            let data = fs::read(&record_path).await?;
            let record: StoredDocument = serde_json::from_slice(&data)?;
            docs.push(record.representation()?);
        }

        Ok(run_map_view(&map, &docs, params))
    }
}
