//! Error types for the underwriter pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, UnderwriterError>;

/// Main error type for the underwriter crate
#[derive(Error, Debug)]
pub enum UnderwriterError {
    /// Training table has no usable feature columns
    #[error("Schema error: {0}")]
    Schema(String),

    /// A prediction record is missing one or more required column keys
    #[error("Missing column(s) in record: {}", .columns.join(", "))]
    MissingColumn { columns: Vec<String> },

    /// A value is present but not convertible to the column's declared type
    #[error("Invalid value for column '{column}': {value}")]
    InvalidValue { column: String, value: String },

    #[error("Data error: {0}")]
    Data(String),

    #[error("Training error: {0}")]
    Training(String),

    /// Artifact file missing or unreadable
    #[error("Artifact load error: {0}")]
    ArtifactLoad(String),

    /// Artifact bytes cannot be parsed (bad magic, checksum, or payload)
    #[error("Artifact corrupt: {0}")]
    ArtifactCorrupt(String),

    /// Artifact format version not understood by the running code
    #[error("Unsupported artifact version {found} (supported: {supported})")]
    ArtifactVersion { found: u32, supported: u32 },

    #[error("Model not fitted")]
    NotFitted,

    #[error("Invalid shape: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<polars::error::PolarsError> for UnderwriterError {
    fn from(err: polars::error::PolarsError) -> Self {
        UnderwriterError::Data(err.to_string())
    }
}

impl From<serde_json::Error> for UnderwriterError {
    fn from(err: serde_json::Error) -> Self {
        UnderwriterError::Data(err.to_string())
    }
}
