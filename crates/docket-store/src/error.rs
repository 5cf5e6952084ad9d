/// Errors from document store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The write would make two documents share the same unique index key.
    #[error("duplicate key on unique index '{index}'")]
    DuplicateKey { index: String },

    /// A unique index definition is malformed.
    #[error("invalid index '{name}': {reason}")]
    InvalidIndex { name: String, reason: String },

    /// The stored document cannot be addressed (bad `_id`, missing `_etag`).
    #[error("corrupt record in {collection}: {reason}")]
    CorruptRecord { collection: String, reason: String },

    /// The backend is unavailable or failed internally.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
