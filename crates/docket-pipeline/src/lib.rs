//! Document mutation pipeline for Docket.
//!
//! A write request travels through an ordered chain of stages that share
//! one [`RequestContext`]: the conditional header is read, the identifier
//! resolved, the payload normalized, the write executed under optimistic
//! concurrency, and the outcome mapped to a status code. Every stage runs on
//! every request; a stage that finds the context in error does nothing, so
//! the result and audit stages still see every request.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use docket_pipeline::{Exchange, ExecutorConfig, Pipeline, RequestContext, RequestMethod, UpdateExecutor};
//! use docket_store::{CollectionRef, InMemoryDocumentStore};
//! use docket_types::Value;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let store = Arc::new(InMemoryDocumentStore::new());
//! let executor = Arc::new(UpdateExecutor::new(store, ExecutorConfig::default()));
//! let pipeline = Pipeline::document_write(executor);
//!
//! let content = Value::from_json(serde_json::json!({"filename": "a.txt"})).unwrap();
//! let mut context = RequestContext::for_document(
//!     CollectionRef::new("db", "files"),
//!     RequestMethod::Put,
//!     "report",
//!     None,
//! )
//! .with_content(Some(content));
//! let mut exchange = Exchange::default();
//!
//! pipeline.run(&mut exchange, &mut context).await;
//! assert_eq!(context.response_status().map(|s| s.as_u16()), Some(201));
//! # });
//! ```

pub mod chain;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod stage;
pub mod stages;

// Re-exports for convenience.
pub use chain::{Pipeline, PipelineReport};
pub use config::{EtagPolicy, ExecutorConfig};
pub use context::{Exchange, RequestContext, RequestMethod};
pub use error::PipelineError;
pub use executor::{ExecutorError, OperationResult, Outcome, UpdateExecutor, UpdateRequest};
pub use stage::{Stage, StageRecord};
pub use stages::normalize_content;
