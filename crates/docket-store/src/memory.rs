//! In-memory document store for tests and ephemeral use.
//!
//! [`InMemoryDocumentStore`] keeps every collection in a `HashMap` behind a
//! single `RwLock`. A conditional write holds the write lock for its whole
//! check-then-write sequence, which makes it atomic with respect to every
//! other writer.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use docket_types::{DocId, Document, EntityTag, IdType, Value};

use crate::error::{StoreError, StoreResult};
use crate::traits::DocumentStore;
use crate::write::{
    matches_constraint, CollectionRef, ConditionalWrite, Precondition, UniqueIndex, WriteMode,
    WriteOutcome, ETAG_FIELD, ID_FIELD,
};

/// Map key for a document id. Rendering is injective, so the rendered
/// segment plus the type tag identifies exactly one id.
type IdKey = (IdType, String);

fn id_key(id: &DocId) -> IdKey {
    (id.id_type(), id.render().segment)
}

#[derive(Debug, Clone)]
struct Record {
    doc: Document,
    etag: EntityTag,
}

#[derive(Debug, Default)]
struct CollectionState {
    records: HashMap<IdKey, Record>,
    unique_indexes: Vec<UniqueIndex>,
}

impl CollectionState {
    /// Find the first unique index the candidate would violate.
    fn violated_index(&self, key: &IdKey, candidate: &Document) -> Option<&UniqueIndex> {
        self.unique_indexes.iter().find(|index| {
            let wanted = index.key_of(candidate);
            self.records
                .iter()
                .any(|(k, r)| k != key && index.key_of(&r.doc) == wanted)
        })
    }
}

/// An in-memory implementation of [`DocumentStore`].
///
/// Collections are created on first write. Data is lost when the store is
/// dropped.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<CollectionRef, CollectionState>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub fn count(&self, coll: &CollectionRef) -> StoreResult<usize> {
        let collections = self.collections.read().map_err(poisoned)?;
        Ok(collections.get(coll).map_or(0, |c| c.records.len()))
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Unavailable(format!("lock poisoned: {e}"))
}

fn build_document(
    existing: Option<&Record>,
    write: &ConditionalWrite,
) -> Document {
    let mut doc = match (write.mode, existing) {
        (WriteMode::Merge, Some(record)) => {
            let mut merged = record.doc.clone();
            for (k, v) in write.content.iter() {
                merged.insert(k, v.clone());
            }
            merged
        }
        _ => write.content.clone(),
    };
    doc.insert(ID_FIELD, write.id.to_value());
    doc.insert(ETAG_FIELD, Value::ObjectId(write.new_etag.object_id()));
    doc
}

fn without_etag(doc: &Document) -> Document {
    let mut d = doc.clone();
    d.remove(ETAG_FIELD);
    d
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find(&self, coll: &CollectionRef, id: &DocId) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().map_err(poisoned)?;
        Ok(collections
            .get(coll)
            .and_then(|c| c.records.get(&id_key(id)))
            .map(|r| r.doc.clone()))
    }

    async fn conditional_write(
        &self,
        coll: &CollectionRef,
        write: ConditionalWrite,
    ) -> StoreResult<WriteOutcome> {
        let mut collections = self.collections.write().map_err(poisoned)?;
        let state = collections.entry(coll.clone()).or_default();
        let key = id_key(&write.id);
        let existing = state.records.get(&key);

        let constraints_hold = match existing {
            Some(record) => [&write.filter, &write.shard_key]
                .into_iter()
                .flatten()
                .all(|c| matches_constraint(&record.doc, c)),
            None => write.filter.is_none(),
        };
        if !constraints_hold {
            debug!(collection = %coll, id = %write.id, "filter or shard key did not match");
            return Ok(WriteOutcome::NoMatch);
        }

        if let Precondition::Matches(expected) = write.precondition {
            let current = existing.map(|r| r.etag);
            if current != Some(expected) {
                debug!(collection = %coll, id = %write.id, "entity tag precondition failed");
                return Ok(WriteOutcome::PreconditionFailed { current });
            }
        }

        let doc = build_document(existing, &write);
        if let Some(index) = state.violated_index(&key, &doc) {
            return Err(StoreError::DuplicateKey {
                index: index.name.clone(),
            });
        }

        let created = existing.is_none();
        let modified = existing.map_or(true, |r| without_etag(&r.doc) != without_etag(&doc));
        state.records.insert(
            key,
            Record {
                doc,
                etag: write.new_etag,
            },
        );
        Ok(WriteOutcome::Applied {
            created,
            matched: u64::from(!created),
            modified: u64::from(modified),
        })
    }

    async fn ensure_unique_index(
        &self,
        coll: &CollectionRef,
        index: UniqueIndex,
    ) -> StoreResult<()> {
        if index.fields.is_empty() {
            return Err(StoreError::InvalidIndex {
                name: index.name,
                reason: "an index needs at least one field".into(),
            });
        }
        let mut collections = self.collections.write().map_err(poisoned)?;
        let state = collections.entry(coll.clone()).or_default();
        if state.unique_indexes.iter().any(|i| i == &index) {
            return Ok(());
        }
        let mut seen: Vec<Vec<Value>> = Vec::with_capacity(state.records.len());
        for record in state.records.values() {
            let k = index.key_of(&record.doc);
            if seen.contains(&k) {
                return Err(StoreError::DuplicateKey { index: index.name });
            }
            seen.push(k);
        }
        state.unique_indexes.push(index);
        Ok(())
    }
}
