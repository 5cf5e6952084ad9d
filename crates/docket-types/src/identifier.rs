//! Typed document identifiers and their URL representation.
//!
//! A document id travels in a URL as a path segment plus an optional
//! `id_type` query parameter. [`DocId::parse`] turns the pair into a typed
//! value and [`DocId::render`] produces the pair back, so that
//! `DocId::parse(&r.segment, r.id_type) == id` holds for every id.
//!
//! Without an explicit tag the type is inferred in a fixed order:
//!
//! 1. 24 hex digits → [`DocId::ObjectId`]
//! 2. a numeric literal → [`DocId::Int`] or [`DocId::Double`]
//! 3. anything else → [`DocId::String`]
//!
//! The inference is ambiguous on purpose-built strings such as `"100"` or a
//! 24-digit hex word meant as text. Clients that need those as strings must
//! send `id_type=STRING`; the order itself is relied upon by clients and is
//! kept as is.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};

use crate::document::Value;
use crate::error::TypeError;
use crate::object_id::ObjectId;

/// Name of the query parameter carrying the identifier type.
pub const ID_TYPE_QUERY_PARAM: &str = "id_type";

/// Reserved path segment for a null id.
pub const NULL_SEGMENT: &str = "_null";
/// Reserved path segment for the min-key id.
pub const MIN_KEY_SEGMENT: &str = "_MinKey";
/// Reserved path segment for the max-key id.
pub const MAX_KEY_SEGMENT: &str = "_MaxKey";

// ---------------------------------------------------------------------------
// IdType
// ---------------------------------------------------------------------------

/// Explicit identifier type tag, as carried by the `id_type` query parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IdType {
    Oid,
    String,
    Number,
    Date,
    Boolean,
    Null,
    MinKey,
    MaxKey,
}

impl IdType {
    /// All tags, in a stable order.
    pub const ALL: [IdType; 8] = [
        Self::Oid,
        Self::String,
        Self::Number,
        Self::Date,
        Self::Boolean,
        Self::Null,
        Self::MinKey,
        Self::MaxKey,
    ];

    /// Wire name of the tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Oid => "OID",
            Self::String => "STRING",
            Self::Number => "NUMBER",
            Self::Date => "DATE",
            Self::Boolean => "BOOLEAN",
            Self::Null => "NULL",
            Self::MinKey => "MINKEY",
            Self::MaxKey => "MAXKEY",
        }
    }
}

impl FromStr for IdType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TypeError::UnknownIdType(s.to_string()))
    }
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DocId
// ---------------------------------------------------------------------------

/// A document identifier paired with its concrete type.
#[derive(Clone, Debug, PartialEq)]
pub enum DocId {
    String(String),
    Int(i64),
    Double(f64),
    ObjectId(ObjectId),
    Boolean(bool),
    Date(DateTime<Utc>),
    Null,
    MinKey,
    MaxKey,
}

/// URL form of a [`DocId`]: the path segment and, when the type cannot be
/// inferred back from the segment, the explicit tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedId {
    pub segment: String,
    pub id_type: Option<IdType>,
}

/// Bytes escaped in a single path segment: controls, non-ASCII, and the
/// characters that would end or split the segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

impl RenderedId {
    /// Append this id to a base path, adding `?id_type=...` when needed.
    ///
    /// The segment is percent-encoded, so an id such as `"a/b"` stays a
    /// single segment and decodes back to the same text.
    pub fn location(&self, base: &str) -> String {
        let base = base.trim_end_matches('/');
        let segment = utf8_percent_encode(&self.segment, SEGMENT);
        match self.id_type {
            Some(t) => format!("{base}/{segment}?{ID_TYPE_QUERY_PARAM}={t}"),
            None => format!("{base}/{segment}"),
        }
    }
}

impl DocId {
    /// Parse a path segment with an optional explicit type tag.
    ///
    /// With a tag the segment must be valid for exactly that type; without
    /// one the default inference order applies (see the module docs).
    pub fn parse(segment: &str, id_type: Option<IdType>) -> Result<Self, TypeError> {
        let Some(id_type) = id_type else {
            return Ok(Self::infer(segment));
        };
        match id_type {
            IdType::String => Ok(Self::String(segment.to_string())),
            IdType::Oid => ObjectId::from_hex(segment)
                .map(Self::ObjectId)
                .map_err(|e| TypeError::invalid_id(segment, e.to_string())),
            IdType::Number => parse_number(segment)
                .ok_or_else(|| TypeError::invalid_id(segment, "not a number")),
            IdType::Date => parse_date(segment)
                .map(Self::Date)
                .ok_or_else(|| TypeError::invalid_id(segment, "not epoch milliseconds or RFC 3339")),
            IdType::Boolean => {
                if segment.eq_ignore_ascii_case("true") {
                    Ok(Self::Boolean(true))
                } else if segment.eq_ignore_ascii_case("false") {
                    Ok(Self::Boolean(false))
                } else {
                    Err(TypeError::invalid_id(segment, "not a boolean"))
                }
            }
            IdType::Null => reserved(segment, NULL_SEGMENT, Self::Null),
            IdType::MinKey => reserved(segment, MIN_KEY_SEGMENT, Self::MinKey),
            IdType::MaxKey => reserved(segment, MAX_KEY_SEGMENT, Self::MaxKey),
        }
    }

    /// Default type inference: ObjectId shape, then number, then string.
    pub fn infer(segment: &str) -> Self {
        if ObjectId::is_valid(segment) {
            if let Ok(oid) = ObjectId::from_hex(segment) {
                return Self::ObjectId(oid);
            }
        }
        parse_number(segment).unwrap_or_else(|| Self::String(segment.to_string()))
    }

    /// The type tag describing this id.
    pub fn id_type(&self) -> IdType {
        match self {
            Self::String(_) => IdType::String,
            Self::Int(_) | Self::Double(_) => IdType::Number,
            Self::ObjectId(_) => IdType::Oid,
            Self::Boolean(_) => IdType::Boolean,
            Self::Date(_) => IdType::Date,
            Self::Null => IdType::Null,
            Self::MinKey => IdType::MinKey,
            Self::MaxKey => IdType::MaxKey,
        }
    }

    /// Render as a path segment plus the tag needed to read it back.
    ///
    /// Strings carry no tag unless inference would read them as another
    /// type; every other kind always carries its tag.
    pub fn render(&self) -> RenderedId {
        let segment = match self {
            Self::String(s) => {
                let id_type = match Self::infer(s) {
                    Self::String(_) => None,
                    _ => Some(IdType::String),
                };
                return RenderedId {
                    segment: s.clone(),
                    id_type,
                };
            }
            Self::Int(i) => i.to_string(),
            // Debug keeps the fractional part so the segment re-parses as a
            // double. Negative zero equals zero and shares its segment.
            Self::Double(d) if *d == 0.0 => "0.0".to_string(),
            Self::Double(d) => format!("{d:?}"),
            Self::ObjectId(oid) => oid.to_hex(),
            Self::Boolean(b) => b.to_string(),
            Self::Date(dt) => dt.timestamp_millis().to_string(),
            Self::Null => NULL_SEGMENT.to_string(),
            Self::MinKey => MIN_KEY_SEGMENT.to_string(),
            Self::MaxKey => MAX_KEY_SEGMENT.to_string(),
        };
        RenderedId {
            segment,
            id_type: Some(self.id_type()),
        }
    }

    /// Convenience for `self.render().location(base)`.
    pub fn location(&self, base: &str) -> String {
        self.render().location(base)
    }

    /// The id as a document value, for the `_id` field.
    pub fn to_value(&self) -> Value {
        match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Int(i) => Value::Int(*i),
            Self::Double(d) => Value::Double(*d),
            Self::ObjectId(oid) => Value::ObjectId(*oid),
            Self::Boolean(b) => Value::Bool(*b),
            Self::Date(dt) => Value::Date(*dt),
            Self::Null => Value::Null,
            Self::MinKey => Value::MinKey,
            Self::MaxKey => Value::MaxKey,
        }
    }

    /// Read an `_id` value back into a typed id.
    pub fn from_value(value: &Value) -> Result<Self, TypeError> {
        Ok(match value {
            Value::String(s) => Self::String(s.clone()),
            Value::Int(i) => Self::Int(*i),
            Value::Double(d) => Self::Double(*d),
            Value::ObjectId(oid) => Self::ObjectId(*oid),
            Value::Bool(b) => Self::Boolean(*b),
            Value::Date(dt) => Self::Date(*dt),
            Value::Null => Self::Null,
            Value::MinKey => Self::MinKey,
            Value::MaxKey => Self::MaxKey,
            Value::Document(_) | Value::Array(_) => {
                return Err(TypeError::UnsupportedIdValue(value.kind()))
            }
        })
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.render();
        match rendered.id_type {
            Some(t) => write!(f, "{}({t})", rendered.segment),
            None => f.write_str(&rendered.segment),
        }
    }
}

impl From<ObjectId> for DocId {
    fn from(oid: ObjectId) -> Self {
        Self::ObjectId(oid)
    }
}

fn parse_number(segment: &str) -> Option<DocId> {
    if let Ok(i) = segment.parse::<i64>() {
        return Some(DocId::Int(i));
    }
    segment
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite())
        .map(DocId::Double)
}

fn parse_date(segment: &str) -> Option<DateTime<Utc>> {
    if let Ok(millis) = segment.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis);
    }
    // Truncated to milliseconds so the rendered segment reads back equal.
    DateTime::parse_from_rfc3339(segment)
        .ok()
        .and_then(|dt| DateTime::from_timestamp_millis(dt.timestamp_millis()))
}

fn reserved(segment: &str, token: &str, id: DocId) -> Result<DocId, TypeError> {
    if segment == token {
        Ok(id)
    } else {
        Err(TypeError::invalid_id(segment, format!("expected '{token}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const HEX: &str = "54c965cbc2e64568e235b711";

    #[test]
    fn number_with_explicit_tag_renders_back() {
        let id = DocId::parse("100", Some(IdType::Number)).unwrap();
        assert_eq!(id, DocId::Int(100));
        assert_eq!(id.location("/db/coll"), "/db/coll/100?id_type=NUMBER");
    }

    #[test]
    fn hex_segment_infers_object_id() {
        let id = DocId::parse(HEX, None).unwrap();
        assert_eq!(id, DocId::ObjectId(ObjectId::from_hex(HEX).unwrap()));
    }

    #[test]
    fn inference_order_is_oid_then_number_then_string() {
        assert!(matches!(DocId::infer(HEX), DocId::ObjectId(_)));
        assert_eq!(DocId::infer("42"), DocId::Int(42));
        assert_eq!(DocId::infer("-3.5"), DocId::Double(-3.5));
        assert_eq!(DocId::infer("hello"), DocId::String("hello".into()));
        // 24 digits is both hex-shaped and numeric: hex wins.
        assert!(matches!(
            DocId::infer("123456789012345678901234"),
            DocId::ObjectId(_)
        ));
    }

    #[test]
    fn non_finite_numbers_stay_strings() {
        assert_eq!(DocId::infer("NaN"), DocId::String("NaN".into()));
        assert_eq!(DocId::infer("inf"), DocId::String("inf".into()));
        assert!(DocId::parse("inf", Some(IdType::Number)).is_err());
    }

    #[test]
    fn string_tag_keeps_numeric_text() {
        let id = DocId::parse("100", Some(IdType::String)).unwrap();
        assert_eq!(id, DocId::String("100".into()));
        let r = id.render();
        assert_eq!(r.id_type, Some(IdType::String));
        assert_eq!(r.location("/db/c"), "/db/c/100?id_type=STRING");
    }

    #[test]
    fn plain_string_renders_without_tag() {
        let r = DocId::String("doc-1".into()).render();
        assert_eq!(r.segment, "doc-1");
        assert_eq!(r.id_type, None);
    }

    #[test]
    fn explicit_tag_failures_are_typed() {
        for (segment, tag) in [
            ("xyz", IdType::Oid),
            ("abc", IdType::Number),
            ("yesterday", IdType::Date),
            ("maybe", IdType::Boolean),
            ("nothing", IdType::Null),
            ("low", IdType::MinKey),
            ("high", IdType::MaxKey),
        ] {
            let err = DocId::parse(segment, Some(tag)).unwrap_err();
            assert!(
                matches!(err, TypeError::InvalidIdentifier { .. }),
                "{segment} as {tag}: {err:?}"
            );
        }
    }

    #[test]
    fn reserved_segments() {
        assert_eq!(DocId::parse("_null", Some(IdType::Null)).unwrap(), DocId::Null);
        assert_eq!(DocId::parse("_MinKey", Some(IdType::MinKey)).unwrap(), DocId::MinKey);
        assert_eq!(DocId::parse("_MaxKey", Some(IdType::MaxKey)).unwrap(), DocId::MaxKey);
        assert_eq!(DocId::Null.location("/d/c"), "/d/c/_null?id_type=NULL");
    }

    #[test]
    fn date_accepts_millis_and_rfc3339() {
        let a = DocId::parse("1420070400000", Some(IdType::Date)).unwrap();
        let b = DocId::parse("2015-01-01T00:00:00Z", Some(IdType::Date)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.render().segment, "1420070400000");
    }

    #[test]
    fn rfc3339_date_is_truncated_to_millis() {
        let id = DocId::parse("2015-01-01T00:00:00.0005Z", Some(IdType::Date)).unwrap();
        assert_eq!(id, DocId::parse("1420070400000", Some(IdType::Date)).unwrap());
        let r = id.render();
        assert_eq!(DocId::parse(&r.segment, r.id_type).unwrap(), id);
    }

    #[test]
    fn location_escapes_the_segment() {
        let cases = [
            ("a/b", "/db/coll/a%2Fb"),
            ("x?y=1", "/db/coll/x%3Fy=1"),
            ("two words", "/db/coll/two%20words"),
            ("café", "/db/coll/caf%C3%A9"),
            ("100%", "/db/coll/100%25"),
        ];
        for (raw, expected) in cases {
            assert_eq!(DocId::String(raw.into()).location("/db/coll"), expected);
        }
    }

    #[test]
    fn negative_zero_renders_as_zero() {
        assert_eq!(DocId::Double(-0.0).render(), DocId::Double(0.0).render());
        assert_eq!(DocId::Double(-0.0).render().segment, "0.0");
    }

    #[test]
    fn boolean_is_case_insensitive() {
        assert_eq!(DocId::parse("TRUE", Some(IdType::Boolean)).unwrap(), DocId::Boolean(true));
        assert_eq!(DocId::Boolean(false).render().segment, "false");
    }

    #[test]
    fn double_keeps_fraction_when_rendered() {
        let r = DocId::Double(100.0).render();
        assert_eq!(r.segment, "100.0");
        assert_eq!(DocId::parse(&r.segment, r.id_type).unwrap(), DocId::Double(100.0));
    }

    #[test]
    fn id_type_names_parse_case_insensitively() {
        assert_eq!("number".parse::<IdType>().unwrap(), IdType::Number);
        assert_eq!("OID".parse::<IdType>().unwrap(), IdType::Oid);
        assert!(matches!(
            "UUID".parse::<IdType>(),
            Err(TypeError::UnknownIdType(_))
        ));
    }

    #[test]
    fn value_conversion() {
        let id = DocId::Int(7);
        assert_eq!(DocId::from_value(&id.to_value()).unwrap(), id);
        let doc_value = Value::Document(crate::Document::new());
        assert_eq!(
            DocId::from_value(&doc_value).unwrap_err(),
            TypeError::UnsupportedIdValue("document")
        );
    }

    fn any_doc_id() -> impl Strategy<Value = DocId> {
        prop_oneof![
            "[ -~]{0,32}".prop_map(DocId::String),
            any::<i64>().prop_map(DocId::Int),
            any::<f64>()
                .prop_filter("finite", |d| d.is_finite())
                .prop_map(DocId::Double),
            any::<[u8; 12]>().prop_map(|b| DocId::ObjectId(ObjectId::from_bytes(b))),
            any::<bool>().prop_map(DocId::Boolean),
            (-8_000_000_000_000i64..8_000_000_000_000i64).prop_map(|ms| {
                DocId::Date(DateTime::from_timestamp_millis(ms).unwrap())
            }),
            Just(DocId::Null),
            Just(DocId::MinKey),
            Just(DocId::MaxKey),
        ]
    }

    proptest! {
        #[test]
        fn parse_of_render_is_identity(id in any_doc_id()) {
            let r = id.render();
            let back = DocId::parse(&r.segment, r.id_type).unwrap();
            prop_assert_eq!(back, id);
        }

        #[test]
        fn location_segment_decodes_to_the_id(text in "\\PC{1,24}") {
            let id = DocId::String(text);
            let location = id.location("/db/coll");
            let encoded = location
                .strip_prefix("/db/coll/")
                .and_then(|rest| rest.split('?').next())
                .unwrap();
            prop_assert!(!encoded.contains('/'));
            prop_assert!(location.is_ascii());
            let decoded = percent_encoding::percent_decode_str(encoded)
                .decode_utf8()
                .unwrap();
            prop_assert_eq!(DocId::parse(&decoded, id.render().id_type).unwrap(), id);
        }

        #[test]
        fn sub_millisecond_dates_round_trip(
            ms in -8_000_000_000_000i64..8_000_000_000_000i64,
            sub in 0u32..1_000_000,
        ) {
            let base = DateTime::from_timestamp_millis(ms).unwrap();
            let text = (base + chrono::Duration::nanoseconds(i64::from(sub)))
                .to_rfc3339_opts(chrono::SecondsFormat::Nanos, true);
            let id = DocId::parse(&text, Some(IdType::Date)).unwrap();
            prop_assert_eq!(&id, &DocId::Date(base));
            let r = id.render();
            prop_assert_eq!(DocId::parse(&r.segment, r.id_type).unwrap(), id);
        }

        #[test]
        fn render_of_parse_is_identity_for_tagged_ints(i in any::<i64>()) {
            let segment = i.to_string();
            let id = DocId::parse(&segment, Some(IdType::Number)).unwrap();
            prop_assert_eq!(id.render(), RenderedId { segment, id_type: Some(IdType::Number) });
        }

        #[test]
        fn parse_never_panics(segment in "\\PC{0,40}", tag in proptest::option::of(0usize..8)) {
            let _ = DocId::parse(&segment, tag.map(|i| IdType::ALL[i]));
        }
    }
}
