//! Error types for the ingestion pipeline.

use thiserror::Error;

/// Errors raised by caller-side misuse, configuration or storage.
///
/// Provider failures are not represented here; they travel inside
/// [`crate::exchange::FetchOutcome::Failed`] and never cross the fetch boundary
/// as an `Err`.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Text timestamp could not be parsed, or names a local time that does not exist.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Timestamp input of a kind that cannot be converted.
    #[error("Unsupported type for timestamp conversion: {0}")]
    UnsupportedType(String),

    /// The requested from/to range could not be resolved.
    #[error("Invalid range: {0}")]
    Range(String),

    /// Timezone name not present in the tz database.
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    /// Invalid configuration value.
    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
