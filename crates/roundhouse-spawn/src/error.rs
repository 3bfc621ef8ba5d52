//! Error types for the spawn-point store.

/// Errors that can occur while loading or persisting spawn points.
///
/// A malformed individual record is *not* fatal during a store load —
/// the store logs it and skips the record. `InvalidRecord` surfaces when
/// a single record is converted explicitly (e.g. during import).
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    /// A persisted record could not be turned into a spawn point.
    #[error("invalid spawn point record: {0}")]
    InvalidRecord(String),

    /// Reading or writing the backing file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The persisted record list could not be (de)serialized.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
