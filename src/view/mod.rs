//! View Queries
//!
//! Backends return raw rows ([`ViewRows`]); the proxy wraps them in a
//! [`ResultSet`] that turns document-shaped rows into typed documents.
//!
//! ```text
//! backend.query_view(name, params)
//!            │
//!       ViewRows (raw)
//!            │
//!  ResultSet<D>::iter() ──► normalize_row ──► ViewItem::Document(D)
//!                                        └──► ViewItem::Row(ViewRow)
//! ```
//!
//! The [`engine`] submodule holds the map-only view engine used by the
//! bundled backends.

pub mod engine;
mod result;
mod row;

pub use engine::{collate, MapFn, ViewDefinitions};
pub use result::{normalize_row, Iter, ResultSet, ViewItem, ViewOptions};
pub use row::{ViewParams, ViewRow, ViewRows};
