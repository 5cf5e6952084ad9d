use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::object_id::ObjectId;

/// Opaque version token identifying one stored state of a document.
///
/// A fresh tag is generated for every successful write. Tags are compared
/// for exact equality only; they carry no ordering meaning.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityTag(ObjectId);

impl EntityTag {
    /// Generate a new, unique tag.
    pub fn generate() -> Self {
        Self(ObjectId::new())
    }

    /// Wrap an existing object id.
    pub fn from_object_id(oid: ObjectId) -> Self {
        Self(oid)
    }

    /// The underlying object id.
    pub fn object_id(&self) -> ObjectId {
        self.0
    }

    /// Parse the value of a conditional header such as `If-Match`.
    ///
    /// Accepts the bare token, a quoted token, and the weak form `W/"..."`.
    pub fn parse_header(value: &str) -> Result<Self, TypeError> {
        let v = value.trim();
        let v = v.strip_prefix("W/").unwrap_or(v);
        let v = v
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(v);
        ObjectId::from_hex(v).map(Self)
    }

    /// Value written to the `ETag` response header.
    pub fn header_value(&self) -> String {
        self.0.to_hex()
    }
}

impl fmt::Debug for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityTag({})", self.0.to_hex())
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tags_differ() {
        assert_ne!(EntityTag::generate(), EntityTag::generate());
    }

    #[test]
    fn parse_header_forms() {
        let tag = EntityTag::generate();
        let hex = tag.header_value();
        assert_eq!(EntityTag::parse_header(&hex).unwrap(), tag);
        assert_eq!(EntityTag::parse_header(&format!("\"{hex}\"")).unwrap(), tag);
        assert_eq!(EntityTag::parse_header(&format!("W/\"{hex}\"")).unwrap(), tag);
        assert_eq!(EntityTag::parse_header(&format!("  {hex} ")).unwrap(), tag);
    }

    #[test]
    fn parse_header_rejects_garbage() {
        assert!(EntityTag::parse_header("not-a-tag").is_err());
        assert!(EntityTag::parse_header("").is_err());
    }
}
