use async_trait::async_trait;

use docket_types::{DocId, Document, EntityTag};

use crate::error::StoreResult;
use crate::write::{etag_of, CollectionRef, ConditionalWrite, UniqueIndex, WriteOutcome};

/// Document store backend.
///
/// All implementations must satisfy these invariants:
/// - `conditional_write` evaluates the precondition, the filter and shard
///   key, the unique indexes, and the write itself as one atomic step. Two
///   writers holding the same stale tag can never both succeed.
/// - A write that violates a unique index fails with
///   [`StoreError::DuplicateKey`](crate::StoreError::DuplicateKey) and leaves
///   the stored state untouched.
/// - Every stored document carries its `_id` and current `_etag` fields.
/// - Backends never retry on their own.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document by id. Returns `Ok(None)` if it does not exist.
    async fn find(&self, coll: &CollectionRef, id: &DocId) -> StoreResult<Option<Document>>;

    /// Create or update a document if its conditions hold.
    async fn conditional_write(
        &self,
        coll: &CollectionRef,
        write: ConditionalWrite,
    ) -> StoreResult<WriteOutcome>;

    /// Declare a unique index. Declaring the same index twice is a no-op.
    async fn ensure_unique_index(&self, coll: &CollectionRef, index: UniqueIndex)
        -> StoreResult<()>;

    /// The entity tag of the stored document, if it exists.
    async fn current_etag(&self, coll: &CollectionRef, id: &DocId) -> StoreResult<Option<EntityTag>> {
        Ok(self.find(coll, id).await?.as_ref().and_then(etag_of))
    }
}
