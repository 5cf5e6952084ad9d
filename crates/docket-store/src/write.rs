use std::fmt;

use serde::{Deserialize, Serialize};

use docket_types::{DocId, Document, EntityTag, Value};

/// Field holding the document identifier.
pub const ID_FIELD: &str = "_id";
/// Field holding the entity tag of the stored state.
pub const ETAG_FIELD: &str = "_etag";

/// Coordinates of a collection: database name plus collection name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CollectionRef {
    pub db: String,
    pub collection: String,
}

impl CollectionRef {
    pub fn new(db: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            db: db.into(),
            collection: collection.into(),
        }
    }

    /// URL path of the collection, e.g. `/mydb/mycoll`.
    pub fn path(&self) -> String {
        format!("/{}/{}", self.db, self.collection)
    }
}

impl fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.db, self.collection)
    }
}

/// How the content of a write combines with the stored document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteMode {
    /// The content supersedes the stored document.
    Replace,
    /// Top-level fields of the content overlay the stored document.
    Merge,
}

/// Condition that must hold against the stored state for a write to apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Precondition {
    /// Apply regardless of the stored state.
    None,
    /// Apply only if a record exists and its tag equals this one.
    Matches(EntityTag),
}

/// A create-or-update request evaluated atomically by the store.
#[derive(Clone, Debug)]
pub struct ConditionalWrite {
    pub id: DocId,
    /// Every path/value pair must match the existing record.
    pub filter: Option<Document>,
    /// Partition constraint; every path/value pair must match the existing record.
    pub shard_key: Option<Document>,
    pub content: Document,
    pub mode: WriteMode,
    pub precondition: Precondition,
    /// Tag assigned to the new state when the write applies.
    pub new_etag: EntityTag,
}

/// What a conditional write did.
#[derive(Clone, Debug, PartialEq)]
pub enum WriteOutcome {
    /// The write was applied.
    Applied {
        /// No record existed for the id before the write.
        created: bool,
        matched: u64,
        modified: u64,
    },
    /// The precondition did not hold; nothing was written.
    PreconditionFailed {
        /// Tag of the stored state, if a record exists.
        current: Option<EntityTag>,
    },
    /// The filter or shard key did not match; nothing was written.
    NoMatch,
}

/// A uniqueness constraint over one or more (dotted) field paths.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueIndex {
    pub name: String,
    pub fields: Vec<String>,
}

impl UniqueIndex {
    pub fn new(name: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// The index key of a document. Missing fields count as null.
    pub fn key_of(&self, doc: &Document) -> Vec<Value> {
        self.fields
            .iter()
            .map(|f| doc.get_path(f).cloned().unwrap_or(Value::Null))
            .collect()
    }
}

/// Returns `true` when every path in `constraint` holds an equal value in `doc`.
pub fn matches_constraint(doc: &Document, constraint: &Document) -> bool {
    constraint
        .iter()
        .all(|(path, expected)| doc.get_path(path).is_some_and(|v| v == expected))
}

/// Read the entity tag recorded in a stored document.
pub fn etag_of(doc: &Document) -> Option<EntityTag> {
    match doc.get(ETAG_FIELD)? {
        Value::ObjectId(oid) => Some(EntityTag::from_object_id(*oid)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_matching_uses_paths() {
        let doc = Document::from_json_str(r#"{"a": 1, "meta": {"owner": "ann"}}"#).unwrap();
        let ok = Document::from_json_str(r#"{"meta.owner": "ann"}"#).unwrap();
        let bad = Document::from_json_str(r#"{"meta.owner": "bob"}"#).unwrap();
        let missing = Document::from_json_str(r#"{"b": 1}"#).unwrap();
        assert!(matches_constraint(&doc, &ok));
        assert!(!matches_constraint(&doc, &bad));
        assert!(!matches_constraint(&doc, &missing));
        assert!(matches_constraint(&doc, &Document::new()));
    }

    #[test]
    fn index_key_treats_missing_as_null() {
        let idx = UniqueIndex::new("by_name", vec!["name".into(), "kind".into()]);
        let doc = Document::from_json_str(r#"{"name": "x"}"#).unwrap();
        assert_eq!(idx.key_of(&doc), vec![Value::from("x"), Value::Null]);
    }

    #[test]
    fn collection_path() {
        let c = CollectionRef::new("db", "coll");
        assert_eq!(c.path(), "/db/coll");
        assert_eq!(c.to_string(), "db.coll");
    }
}
