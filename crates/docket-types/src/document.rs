//! The generic document model.
//!
//! A [`Document`] is an insertion-ordered mapping from string keys to
//! [`Value`]s. Besides the JSON kinds, values can carry the scalar kinds that
//! are allowed as document identifiers (object ids, dates, min/max keys), so
//! a typed `_id` survives a trip through the store unchanged.
//!
//! Documents travel over the wire as extended JSON:
//!
//! | Kind       | JSON form                         |
//! |------------|-----------------------------------|
//! | `ObjectId` | `{"$oid": "54c965cb..."}`         |
//! | `Date`     | `{"$date": 1420070400000}`        |
//! | `MinKey`   | `{"$minKey": 1}`                  |
//! | `MaxKey`   | `{"$maxKey": 1}`                  |
//! | `Int`      | `42` or `{"$numberLong": "42"}`   |

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number};

use crate::error::TypeError;
use crate::object_id::ObjectId;

/// A single value inside a [`Document`].
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Document(Document),
    Array(Vec<Value>),
    ObjectId(ObjectId),
    Date(DateTime<Utc>),
    MinKey,
    MaxKey,
}

impl Value {
    /// Short name of the value kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "int",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::Document(_) => "document",
            Self::Array(_) => "array",
            Self::ObjectId(_) => "objectId",
            Self::Date(_) => "date",
            Self::MinKey => "minKey",
            Self::MaxKey => "maxKey",
        }
    }

    pub fn is_document(&self) -> bool {
        matches!(self, Self::Document(_))
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Self::Document(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_document_mut(&mut self) -> Option<&mut Document> {
        match self {
            Self::Document(d) => Some(d),
            _ => None,
        }
    }

    pub fn into_document(self) -> Option<Document> {
        match self {
            Self::Document(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert from extended JSON.
    pub fn from_json(json: serde_json::Value) -> Result<Self, TypeError> {
        Ok(match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => number_to_value(&n)?,
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => Self::Array(
                items
                    .into_iter()
                    .map(Self::from_json)
                    .collect::<Result<_, _>>()?,
            ),
            serde_json::Value::Object(map) => {
                if let Some(special) = extended_scalar(&map)? {
                    special
                } else {
                    Self::Document(Document::from_json_map(map)?)
                }
            }
        })
    }

    /// Convert to extended JSON.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::Number((*i).into()),
            Self::Double(d) => Number::from_f64(*d)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Document(d) => d.to_json(),
            Self::Array(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_json).collect())
            }
            Self::ObjectId(oid) => json!({ "$oid": oid.to_hex() }),
            Self::Date(dt) => json!({ "$date": dt.timestamp_millis() }),
            Self::MinKey => json!({ "$minKey": 1 }),
            Self::MaxKey => json!({ "$maxKey": 1 }),
        }
    }
}

fn number_to_value(n: &Number) -> Result<Value, TypeError> {
    if let Some(i) = n.as_i64() {
        return Ok(Value::Int(i));
    }
    n.as_f64()
        .map(Value::Double)
        .ok_or_else(|| TypeError::ExtendedJson(format!("unrepresentable number {n}")))
}

/// Recognise the single-key extended JSON wrappers.
fn extended_scalar(map: &Map<String, serde_json::Value>) -> Result<Option<Value>, TypeError> {
    if map.len() != 1 {
        return Ok(None);
    }
    let Some((key, value)) = map.iter().next() else {
        return Ok(None);
    };
    let parsed = match key.as_str() {
        "$oid" => {
            let hex = value
                .as_str()
                .ok_or_else(|| TypeError::ExtendedJson("$oid must be a string".into()))?;
            Value::ObjectId(ObjectId::from_hex(hex)?)
        }
        "$date" => Value::Date(parse_extended_date(value)?),
        "$minKey" => Value::MinKey,
        "$maxKey" => Value::MaxKey,
        "$numberLong" => {
            let text = value
                .as_str()
                .ok_or_else(|| TypeError::ExtendedJson("$numberLong must be a string".into()))?;
            let i = text
                .parse::<i64>()
                .map_err(|e| TypeError::ExtendedJson(format!("$numberLong: {e}")))?;
            Value::Int(i)
        }
        _ => return Ok(None),
    };
    Ok(Some(parsed))
}

fn parse_extended_date(value: &serde_json::Value) -> Result<DateTime<Utc>, TypeError> {
    let millis = match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::Object(inner) => inner
            .get("$numberLong")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<i64>().ok()),
        // Dates are kept at millisecond precision, like the `$date` output.
        serde_json::Value::String(s) => Some(
            DateTime::parse_from_rfc3339(s)
                .map_err(|e| TypeError::ExtendedJson(format!("$date: {e}")))?
                .timestamp_millis(),
        ),
        _ => None,
    };
    millis
        .and_then(DateTime::from_timestamp_millis)
        .ok_or_else(|| TypeError::ExtendedJson("$date must be epoch milliseconds".into()))
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// An insertion-ordered mapping from keys to values.
///
/// Equality is structural and ignores key order, matching the behaviour of
/// a map: two documents are equal when they hold the same keys with equal
/// values.
#[derive(Clone, Default)]
pub struct Document {
    entries: Vec<(String, Value)>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// A document holding a single entry.
    pub fn with(key: impl Into<String>, value: Value) -> Self {
        let mut doc = Self::new();
        doc.insert(key, value);
        doc
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Look up a dotted path such as `metadata.filename`.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.get(parts.next()?)?;
        for part in parts {
            current = current.as_document()?.get(part)?;
        }
        Some(current)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert a value. An existing key keeps its position and the previous
    /// value is returned; a new key is appended.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        match self.get_mut(&key) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Build from a JSON object, interpreting extended JSON wrappers.
    pub fn from_json_map(map: Map<String, serde_json::Value>) -> Result<Self, TypeError> {
        map.into_iter()
            .map(|(k, v)| Value::from_json(v).map(|v| (k, v)))
            .collect()
    }

    /// Parse a JSON text that must hold a single object.
    pub fn from_json_str(text: &str) -> Result<Self, TypeError> {
        let json: serde_json::Value =
            serde_json::from_str(text).map_err(|e| TypeError::ExtendedJson(e.to_string()))?;
        match Value::from_json(json)? {
            Value::Document(doc) => Ok(doc),
            other => Err(TypeError::ExtendedJson(format!(
                "expected an object, found {}",
                other.kind()
            ))),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let map: Map<String, serde_json::Value> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| o == v))
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut doc = Self::new();
        for (k, v) in iter {
            doc.insert(k, v);
        }
        doc
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Self::Document(doc)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<ObjectId> for Value {
    fn from(oid: ObjectId) -> Self {
        Self::ObjectId(oid)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Value::from_json(json).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Document(doc) => Ok(doc),
            other => Err(serde::de::Error::custom(format!(
                "expected a document, found {}",
                other.kind()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insertion_order_is_kept() {
        let doc = Document::from_json_str(r#"{"z": 1, "a": 2, "m": 3}"#).unwrap();
        let keys: Vec<&str> = doc.keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut doc = Document::new();
        doc.insert("a", Value::Int(1));
        doc.insert("b", Value::Int(2));
        let old = doc.insert("a", Value::Int(3));
        assert_eq!(old, Some(Value::Int(1)));
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(doc.get("a"), Some(&Value::Int(3)));
    }

    #[test]
    fn equality_ignores_key_order() {
        let a = Document::from_json_str(r#"{"x": 1, "y": "two"}"#).unwrap();
        let b = Document::from_json_str(r#"{"y": "two", "x": 1}"#).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn equality_is_type_sensitive() {
        assert_ne!(Value::Int(1), Value::Double(1.0));
        assert_ne!(Value::String("1".into()), Value::Int(1));
    }

    #[test]
    fn get_path_walks_nested_documents() {
        let doc = Document::from_json_str(r#"{"metadata": {"filename": "a.txt"}}"#).unwrap();
        assert_eq!(doc.get_path("metadata.filename"), Some(&Value::from("a.txt")));
        assert_eq!(doc.get_path("metadata.missing"), None);
        assert_eq!(doc.get_path("metadata.filename.deeper"), None);
    }

    #[test]
    fn extended_json_scalars() {
        let doc = Document::from_json_str(
            r#"{
                "oid": {"$oid": "54c965cbc2e64568e235b711"},
                "date": {"$date": 1420070400000},
                "min": {"$minKey": 1},
                "max": {"$maxKey": 1},
                "long": {"$numberLong": "9007199254740993"}
            }"#,
        )
        .unwrap();
        assert!(matches!(doc.get("oid"), Some(Value::ObjectId(_))));
        assert_eq!(
            doc.get("date"),
            Some(&Value::Date(DateTime::from_timestamp_millis(1_420_070_400_000).unwrap()))
        );
        assert_eq!(doc.get("min"), Some(&Value::MinKey));
        assert_eq!(doc.get("max"), Some(&Value::MaxKey));
        assert_eq!(doc.get("long"), Some(&Value::Int(9_007_199_254_740_993)));
    }

    #[test]
    fn rfc3339_date_is_kept_to_the_millisecond() {
        let doc = Document::from_json_str(r#"{"d": {"$date": "2015-01-01T00:00:00.0005Z"}}"#)
            .unwrap();
        let expected = Value::Date(DateTime::from_timestamp_millis(1_420_070_400_000).unwrap());
        assert_eq!(doc.get("d"), Some(&expected));
        let back = Value::from_json(doc.get("d").unwrap().to_json()).unwrap();
        assert_eq!(back, expected);
    }

    #[test]
    fn to_json_uses_extended_forms() {
        let oid = ObjectId::from_hex("54c965cbc2e64568e235b711").unwrap();
        let mut doc = Document::new();
        doc.insert("_id", Value::ObjectId(oid));
        doc.insert("n", Value::Int(7));
        assert_eq!(
            doc.to_json(),
            json!({"_id": {"$oid": "54c965cbc2e64568e235b711"}, "n": 7})
        );
    }

    #[test]
    fn multi_key_dollar_object_is_a_plain_document() {
        let doc = Document::from_json_str(r#"{"v": {"$oid": "x", "other": 1}}"#).unwrap();
        assert!(doc.get("v").unwrap().is_document());
    }

    #[test]
    fn bad_oid_is_rejected() {
        assert!(Document::from_json_str(r#"{"v": {"$oid": "nope"}}"#).is_err());
    }

    #[test]
    fn from_json_str_requires_object() {
        let err = Document::from_json_str("[1, 2]").unwrap_err();
        assert!(matches!(err, TypeError::ExtendedJson(_)));
    }

    #[test]
    fn serde_roundtrip_through_json() {
        let doc = Document::from_json_str(r#"{"a": [1, 2.5, null], "b": {"c": true}}"#).unwrap();
        let text = serde_json::to_string(&doc).unwrap();
        let back: Document = serde_json::from_str(&text).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn remove_returns_value() {
        let mut doc = Document::with("k", Value::Bool(true));
        assert_eq!(doc.remove("k"), Some(Value::Bool(true)));
        assert!(doc.is_empty());
        assert_eq!(doc.remove("k"), None);
    }
}
