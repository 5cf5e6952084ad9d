//! Document storage for Docket.
//!
//! The pipeline talks to storage only through the [`DocumentStore`] trait,
//! injected at construction time, so backends can be swapped without
//! touching request handling.
//!
//! # Design Rules
//!
//! 1. The conditional write is the only synchronisation primitive between
//!    concurrent writers: precondition, constraints, uniqueness and write are
//!    evaluated atomically.
//! 2. Uniqueness violations surface as [`StoreError::DuplicateKey`], never as
//!    a failed precondition.
//! 3. Every stored document carries `_id` and `_etag`.
//! 4. Backends never retry.

pub mod error;
pub mod memory;
pub mod traits;
pub mod write;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryDocumentStore;
pub use traits::DocumentStore;
pub use write::{
    etag_of, CollectionRef, ConditionalWrite, Precondition, UniqueIndex, WriteMode, WriteOutcome,
    ETAG_FIELD, ID_FIELD,
};
