use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// A URL segment could not be read as the requested identifier type.
    #[error("invalid document id '{segment}': {reason}")]
    InvalidIdentifier { segment: String, reason: String },

    /// The `id_type` tag is not one of the known identifier types.
    #[error("unknown id_type: {0}")]
    UnknownIdType(String),

    /// A value cannot be used as a document identifier.
    #[error("value of kind {0} cannot be used as a document id")]
    UnsupportedIdValue(&'static str),

    #[error("malformed extended json: {0}")]
    ExtendedJson(String),
}

impl TypeError {
    pub(crate) fn invalid_id(segment: &str, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            segment: segment.to_string(),
            reason: reason.into(),
        }
    }
}
