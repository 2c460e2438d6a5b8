use thiserror::Error;

/// Errors that can arise while interacting with the tracker storage layer.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, snapshot files, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapper around JSON errors from world snapshot files.
    #[error("snapshot parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A region with this name already exists.
    #[error("region name already in use: {0}")]
    DuplicateName(String),

    /// Region bounds or name rejected before touching storage.
    #[error("invalid region: {0}")]
    InvalidRegion(String),

    /// Trade rejected before touching storage (level 0, blank enchantment).
    #[error("invalid trade: {0}")]
    InvalidTrade(String),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// A stored index entry could not be decoded.
    #[error("corrupt index entry in {0}")]
    CorruptIndex(&'static str),
}

/// Request-level failures handed back to command handlers.
///
/// Storage faults never escape as [`TrackerError`]; they are logged and
/// collapsed into [`RequestError::Unavailable`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("a region named '{0}' already exists")]
    DuplicateName(String),

    #[error("invalid region: {0}")]
    InvalidRegion(String),

    #[error("region corners must be in the same world")]
    WorldMismatch,

    #[error("storage unavailable")]
    Unavailable,
}

impl From<TrackerError> for RequestError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::DuplicateName(name) => RequestError::DuplicateName(name),
            TrackerError::InvalidRegion(reason) => RequestError::InvalidRegion(reason),
            other => {
                log::error!("tracker storage failure: {}", other);
                RequestError::Unavailable
            }
        }
    }
}

impl From<sled::transaction::TransactionError<TrackerError>> for TrackerError {
    fn from(err: sled::transaction::TransactionError<TrackerError>) -> Self {
        match err {
            sled::transaction::TransactionError::Abort(inner) => inner,
            sled::transaction::TransactionError::Storage(inner) => TrackerError::Sled(inner),
        }
    }
}
