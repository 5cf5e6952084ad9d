//! Optimistic-concurrency create-or-update against a [`DocumentStore`].
//!
//! The executor turns an [`UpdateRequest`] into a single conditional write.
//! The store's compare-and-swap on the entity tag is the only thing
//! serialising concurrent writers; the executor holds no locks and never
//! retries.

use std::sync::Arc;
use std::time::Duration;

use hyper::StatusCode;
use tracing::{debug, warn};

use docket_store::{
    CollectionRef, ConditionalWrite, DocumentStore, Precondition, StoreError, WriteMode,
    WriteOutcome,
};
use docket_types::{DocId, Document, EntityTag};

use crate::config::ExecutorConfig;

// ---------------------------------------------------------------------------
// Outcome / OperationResult
// ---------------------------------------------------------------------------

/// The closed set of outcomes a mutation attempt can have.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// An existing document was updated.
    Updated,
    /// No document existed; one was created.
    Created,
    /// The entity tag was missing when required, or stale.
    Conflict,
    /// The write would violate a unique index.
    DuplicateKey,
    /// The filter or shard key did not match the stored document.
    NotFound,
}

impl Outcome {
    /// Status code as produced by the executor. `DuplicateKey` uses an
    /// internal code that the result mapper never lets through.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Updated => StatusCode::OK,
            Self::Created => StatusCode::CREATED,
            Self::Conflict => StatusCode::CONFLICT,
            Self::DuplicateKey => StatusCode::EXPECTATION_FAILED,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

/// Result of one mutation attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationResult {
    pub outcome: Outcome,
    /// Tag of the new state on success; the stored tag on conflict, if any.
    pub etag: Option<EntityTag>,
    pub matched: u64,
    pub modified: u64,
}

impl OperationResult {
    fn without_write(outcome: Outcome, etag: Option<EntityTag>) -> Self {
        Self {
            outcome,
            etag,
            matched: 0,
            modified: 0,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.outcome.status()
    }
}

/// Failures that are not part of the outcome set. They surface to callers
/// as a generic store failure.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
}

// ---------------------------------------------------------------------------
// UpdateRequest
// ---------------------------------------------------------------------------

/// Everything the executor needs for one conditional create-or-update.
#[derive(Clone, Debug)]
pub struct UpdateRequest {
    pub collection: CollectionRef,
    pub id: DocId,
    pub filter: Option<Document>,
    pub shard_key: Option<Document>,
    pub content: Document,
    /// Tag supplied by the caller.
    pub etag: Option<EntityTag>,
    pub mode: WriteMode,
    pub etag_check_required: bool,
}

// ---------------------------------------------------------------------------
// UpdateExecutor
// ---------------------------------------------------------------------------

/// Issues conditional writes against an injected store.
pub struct UpdateExecutor {
    store: Arc<dyn DocumentStore>,
    config: ExecutorConfig,
}

impl UpdateExecutor {
    pub fn new(store: Arc<dyn DocumentStore>, config: ExecutorConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Perform the write.
    ///
    /// Precondition rules:
    /// - verification mandatory and no tag supplied: `Conflict`, nothing written;
    /// - a supplied tag must equal the stored tag; against an absent document
    ///   it can never match and yields `Conflict`;
    /// - otherwise the write is unconditional.
    pub async fn update(&self, request: UpdateRequest) -> Result<OperationResult, ExecutorError> {
        let coll = &request.collection;

        let precondition = match request.etag {
            Some(tag) => Precondition::Matches(tag),
            None if request.etag_check_required => {
                let current = self
                    .bounded(self.store.current_etag(coll, &request.id))
                    .await?;
                debug!(collection = %coll, id = %request.id, "entity tag required but not supplied");
                return Ok(OperationResult::without_write(Outcome::Conflict, current));
            }
            None => Precondition::None,
        };

        let write = ConditionalWrite {
            id: request.id.clone(),
            filter: request.filter,
            shard_key: request.shard_key,
            content: request.content,
            mode: request.mode,
            precondition,
            new_etag: EntityTag::generate(),
        };
        let new_etag = write.new_etag;

        let outcome = match self.bounded(self.store.conditional_write(coll, write)).await {
            Ok(outcome) => outcome,
            Err(ExecutorError::Store(StoreError::DuplicateKey { index })) => {
                debug!(collection = %coll, id = %request.id, %index, "unique index violated");
                return Ok(OperationResult::without_write(Outcome::DuplicateKey, None));
            }
            Err(e) => return Err(e),
        };

        Ok(match outcome {
            WriteOutcome::Applied {
                created,
                matched,
                modified,
            } => OperationResult {
                outcome: if created {
                    Outcome::Created
                } else {
                    Outcome::Updated
                },
                etag: Some(new_etag),
                matched,
                modified,
            },
            WriteOutcome::PreconditionFailed { current } => {
                debug!(collection = %coll, id = %request.id, "entity tag mismatch");
                OperationResult::without_write(Outcome::Conflict, current)
            }
            WriteOutcome::NoMatch => OperationResult::without_write(Outcome::NotFound, None),
        })
    }

    /// Run a store call under the configured timeout. When the timeout
    /// elapses the call's future is dropped before it can complete.
    async fn bounded<T>(
        &self,
        call: impl std::future::Future<Output = Result<T, StoreError>>,
    ) -> Result<T, ExecutorError> {
        match tokio::time::timeout(self.config.store_timeout, call).await {
            Ok(result) => result.map_err(ExecutorError::from),
            Err(_) => {
                warn!(timeout = ?self.config.store_timeout, "store call timed out");
                Err(ExecutorError::Timeout(self.config.store_timeout))
            }
        }
    }
}
