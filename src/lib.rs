//! docproxy - Route document operations across named databases
//!
//! docproxy keeps a registry of named document-database handles and exposes
//! one uniform set of document operations (save, fetch, delete, attachments,
//! views) that callers direct at a backend by name. Typical use is
//! multi-tenant storage with one database per customer.
//!
//! - **`document`** - The document capability, typed and raw documents
//! - **`backend`** - The backend capability, memory and file backends
//! - **`view`** - View parameters, rows and lazily normalized result sets
//! - **`proxy`** - The [`Proxy`] facade
//! - **`config`** - TOML configuration and `.env` loading
//!
//! # Features
//!
//! ```toml
//! [dependencies]
//! docproxy = { version = "0.1", default-features = false }
//! # File backend and configuration loading:
//! docproxy = { version = "0.1", features = ["file", "config"] }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use docproxy::prelude::*;
//! use std::sync::Arc;
//!
//! async fn example() -> ProxyResult<()> {
//!     let mut proxy = Proxy::new();
//!     proxy.add_backend("customer_1", Arc::new(MemoryBackend::new()))?;
//!
//!     let mut doc = RawDocument::new();
//!     doc.insert("s", "amazing test".into());
//!     proxy.save("customer_1", &mut doc).await?;
//!
//!     let mut fetched: RawDocument = proxy.get("customer_1", doc.id().unwrap()).await?;
//!     proxy.put_attachment("customer_1", &mut fetched, "hello", &AttachmentOptions::named("note.txt")).await?;
//!     Ok(())
//! }
//! ```
//!
//! The library emits `tracing` events and installs no subscriber.

#![warn(missing_docs)]

/// Error types
pub mod error;

/// Document capability and document types
pub mod document;

/// Backend capability and bundled backends
pub mod backend;

/// View execution and row normalization
pub mod view;

/// Proxy facade
pub mod proxy;

/// Configuration management (enabled with the `config` feature)
#[cfg(feature = "config")]
pub mod config;

pub use error::{ProxyError, ProxyResult};
pub use proxy::{FetchOptions, Proxy};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::backend::{
        AttachmentContent, AttachmentOptions, AttachmentReceipt, BackendBuilder, BackendSpec,
        DocumentBackend, MemoryBackend,
    };
    pub use crate::document::{Document, RawDocument, Schema, TypedDocument, WrapOptions};
    pub use crate::error::{ProxyError, ProxyResult};
    pub use crate::proxy::{FetchOptions, Proxy};
    pub use crate::view::{ResultSet, ViewItem, ViewOptions, ViewParams};

    #[cfg(feature = "file")]
    pub use crate::backend::FileBackend;

    #[cfg(feature = "config")]
    pub use crate::config::{ConfigurationLoader, EnvironmentLoader, ProxyConfig};
}
