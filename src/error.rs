//! Error types for the churn pipeline

use thiserror::Error;

/// Main error type for churnflow operations
#[derive(Error, Debug)]
pub enum ChurnError {
    /// Raw input table does not match the configured column mapping
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// A categorical value has no entry in the relevant recode table or vocabulary
    #[error("Unknown category `{value}` in column `{column}`")]
    UnknownCategory { column: String, value: String },

    /// A customer date is missing, unparseable, or after the evaluation date
    #[error("Invalid date in column `{column}`: {reason}")]
    InvalidDate { column: String, reason: String },

    /// Not enough rows to compute a statistic or synthesize samples
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// A requested feature, interaction base, or label column is absent
    #[error("Missing column: `{0}`")]
    MissingColumn(String),

    /// A training partition collapsed to a single class
    #[error("Insufficient class balance: {0}")]
    InsufficientClassBalance(String),

    /// Standardization is undefined for a constant column
    #[error("Zero variance in column `{0}`")]
    ZeroVariance(String),

    /// General data handling error
    #[error("Data error: {0}")]
    DataError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Array dimensions do not line up
    #[error("Invalid shape: expected {expected}, actual {actual}")]
    ShapeError { expected: String, actual: String },

    /// Estimator used before fit
    #[error("Model not fitted. Call fit() before transform() or predict()")]
    ModelNotFitted,
}

impl From<polars::error::PolarsError> for ChurnError {
    fn from(err: polars::error::PolarsError) -> Self {
        ChurnError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for ChurnError {
    fn from(err: serde_json::Error) -> Self {
        ChurnError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for ChurnError {
    fn from(err: ndarray::ShapeError) -> Self {
        ChurnError::ShapeError {
            expected: "valid array shape".to_string(),
            actual: err.to_string(),
        }
    }
}

/// Result type alias for churnflow operations
pub type Result<T> = std::result::Result<T, ChurnError>;
