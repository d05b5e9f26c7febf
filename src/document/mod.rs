//! Document Capability
//!
//! The proxy never inspects document bodies. It only needs a document to
//! expose its identity (`_id` / `_rev`), its attachment stubs, and a way to
//! convert to and from the mapping-based transport representation that
//! backends store.
//!
//! Two implementations are provided:
//!
//! - [`TypedDocument<T>`] wraps a serde-typed body (any [`Schema`])
//! - [`RawDocument`] is a schemaless JSON mapping
//!
//! ## Usage
//!
//! ```rust
//! use docproxy::document::{Document, Schema, TypedDocument};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Note {
//!     s: String,
//! }
//!
//! impl Schema for Note {}
//!
//! let note = TypedDocument::new(Note { s: "amazing test".into() });
//! assert!(note.is_new());
//! assert_eq!(note.s, "amazing test");
//! ```

mod attachment;
mod raw;
mod traits;
mod typed;

pub use attachment::{AttachmentStub, Attachments};
pub use raw::RawDocument;
pub use traits::{Document, WrapOptions};
pub use typed::{Schema, TypedDocument};

/// Transport representation of a document
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Identity field holding the document id
pub const ID_FIELD: &str = "_id";

/// Identity field holding the revision token
pub const REV_FIELD: &str = "_rev";

/// Field holding attachment stubs
pub const ATTACHMENTS_FIELD: &str = "_attachments";

/// Discriminator written by typed documents
pub const DOC_TYPE_FIELD: &str = "doc_type";
