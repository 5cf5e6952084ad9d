//! Foundation types for Docket.
//!
//! This crate provides the document model and the identifier types shared by
//! the store, the request pipeline, and the HTTP server.
//!
//! # Key Types
//!
//! - [`Document`] / [`Value`]: insertion-ordered documents with an extended JSON codec
//! - [`ObjectId`]: 12-byte time-ordered identifier
//! - [`EntityTag`]: opaque version token used for optimistic concurrency
//! - [`DocId`] / [`IdType`]: typed document identifiers and their URL form

pub mod document;
pub mod error;
pub mod etag;
pub mod identifier;
pub mod object_id;

pub use document::{Document, Value};
pub use error::TypeError;
pub use etag::EntityTag;
pub use identifier::{DocId, IdType, RenderedId, ID_TYPE_QUERY_PARAM};
pub use object_id::ObjectId;
