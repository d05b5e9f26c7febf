//! Document Backend Abstraction
//!
//! This module provides a trait-based abstraction for the database handles
//! the proxy routes to. Two in-process backends are bundled; other stores
//! (a CouchDB client, a document database driver, ...) plug in by
//! implementing [`DocumentBackend`].
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │        Proxy        │
//! │  (name → backend)   │
//! └──────────┬──────────┘
//!            │
//! ┌──────────▼──────────┐
//! │   DocumentBackend   │  <-- Trait
//! │      (async)        │
//! └──────────┬──────────┘
//!            │
//!     ┌──────┴──────┐
//!     │             │
//! ┌───▼────┐   ┌────▼───┐
//! │ Memory │   │  File  │
//! │Backend │   │Backend │
//! └────────┘   └────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use docproxy::backend::{DocumentBackend, MemoryBackend};
//! use serde_json::json;
//!
//! async fn example() -> docproxy::ProxyResult<()> {
//!     let backend = MemoryBackend::new();
//!
//!     let mut doc = json!({"s": "amazing test"}).as_object().cloned().unwrap();
//!     let saved = backend.save_document(&mut doc).await?;
//!
//!     let fetched = backend.fetch_document(&saved.id, None).await?;
//!     assert_eq!(fetched["s"], "amazing test");
//!     Ok(())
//! }
//! ```

mod builder;
mod memory_backend;
mod stored;
mod traits;

pub use builder::{BackendBuilder, BackendSpec};
pub use memory_backend::MemoryBackend;
pub use stored::{content_digest, generation, new_doc_id, next_revision};
pub use traits::*;

#[cfg(feature = "file")]
mod file_backend;

#[cfg(feature = "file")]
pub use file_backend::FileBackend;
