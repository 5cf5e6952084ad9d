use hyper::StatusCode;

/// Message for an absent or empty payload.
pub const NO_DATA_MESSAGE: &str = "no data provided";
/// Message for a payload that is not a single object.
pub const NOT_AN_OBJECT_MESSAGE: &str = "data must be a json object";
/// Message for an `_id` that disagrees with the URL.
pub const ID_MISMATCH_MESSAGE: &str = "_id in json data cannot be different than id in URL";
/// Message for a missing or stale conditional header.
pub const CONFLICT_MESSAGE: &str =
    "The document's ETag must be provided using the 'If-Match' header";
/// Message for a unique index violation.
pub const DUPLICATE_KEY_MESSAGE: &str = "A duplicate key error occurred. \
     The patched document does not fulfill an unique index constraint";
/// Message returned for any store-level fault.
pub const STORE_FAILURE_MESSAGE: &str = "Error handling the request";

/// Request-level failures recorded on the
/// [`RequestContext`](crate::context::RequestContext).
///
/// None of these cross a stage boundary as a Rust error: a stage records
/// the failure on the context and the chain keeps running.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// Missing, empty, or malformed payload.
    #[error("{0}")]
    Input(String),

    /// The payload `_id` disagrees with the id in the URL.
    #[error("{0}")]
    IdentityMismatch(String),

    /// The identifier cannot be read under the requested or inferred type.
    #[error("invalid document id: {0}")]
    InvalidIdentifier(String),

    /// Entity tag missing when required, or not matching the stored one.
    #[error("{0}")]
    ConcurrencyConflict(String),

    /// The write collides with a unique index.
    #[error("{0}")]
    DuplicateKey(String),

    /// Opaque failure of the store; the detail is for logs only.
    #[error("store failure: {0}")]
    StoreFailure(String),
}

impl PipelineError {
    pub fn no_data() -> Self {
        Self::Input(NO_DATA_MESSAGE.into())
    }

    pub fn not_an_object() -> Self {
        Self::Input(NOT_AN_OBJECT_MESSAGE.into())
    }

    pub fn id_mismatch() -> Self {
        Self::IdentityMismatch(ID_MISMATCH_MESSAGE.into())
    }

    pub fn conflict() -> Self {
        Self::ConcurrencyConflict(CONFLICT_MESSAGE.into())
    }

    pub fn duplicate_key() -> Self {
        Self::DuplicateKey(DUPLICATE_KEY_MESSAGE.into())
    }

    /// HTTP status reported for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Input(_) | Self::IdentityMismatch(_) => StatusCode::NOT_ACCEPTABLE,
            Self::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
            Self::ConcurrencyConflict(_) | Self::DuplicateKey(_) => StatusCode::CONFLICT,
            Self::StoreFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the caller.
    pub fn public_message(&self) -> String {
        match self {
            Self::StoreFailure(_) => STORE_FAILURE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(PipelineError::no_data().status(), StatusCode::NOT_ACCEPTABLE);
        assert_eq!(PipelineError::id_mismatch().status(), StatusCode::NOT_ACCEPTABLE);
        assert_eq!(
            PipelineError::InvalidIdentifier("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(PipelineError::conflict().status(), StatusCode::CONFLICT);
        assert_eq!(PipelineError::duplicate_key().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn store_failure_detail_is_not_public() {
        let err = PipelineError::StoreFailure("lock poisoned: secret".into());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), STORE_FAILURE_MESSAGE);
        assert!(err.to_string().contains("secret"));
    }

    #[test]
    fn conflict_and_duplicate_messages_differ() {
        assert_ne!(
            PipelineError::conflict().public_message(),
            PipelineError::duplicate_key().public_message()
        );
        assert!(PipelineError::conflict().public_message().contains("If-Match"));
    }
}
