//! Error types for parsing, encoding and assembling features.
//!
//! Parse failures on individual cells are never errors: they resolve to null
//! (or a zero indicator) and the rest of the row is still processed. The
//! variants below cover the hard failures that abort a run.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the feature pipeline.
#[derive(Error, Debug)]
pub enum FeatureError {
    /// An encoder was asked to transform before it was fitted.
    #[error("Encoder not fitted: call fit before transform")]
    NotFitted,

    /// Invalid configuration provided (e.g. an empty target column list).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// The input table does not have the expected shape or column set.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A post-assembly data-integrity check failed.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<FeatureError>,
    },
}

impl FeatureError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        FeatureError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code, suitable for machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFitted => "NOT_FITTED",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::SchemaMismatch(_) => "SCHEMA_MISMATCH",
            Self::InvariantViolation(_) => "INVARIANT_VIOLATION",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Configuration errors: the caller misused the API and should fix the call.
    pub fn is_configuration_error(&self) -> bool {
        match self {
            Self::NotFitted | Self::InvalidConfig(_) => true,
            Self::WithContext { source, .. } => source.is_configuration_error(),
            _ => false,
        }
    }

    /// Failures caused by the input data itself; nothing may be written.
    pub fn is_hard_failure(&self) -> bool {
        match self {
            Self::SchemaMismatch(_) | Self::InvariantViolation(_) | Self::ColumnNotFound(_) => true,
            Self::WithContext { source, .. } => source.is_hard_failure(),
            _ => false,
        }
    }

    /// Data-integrity failures that require an upstream fix.
    pub fn is_invariant_violation(&self) -> bool {
        match self {
            Self::InvariantViolation(_) => true,
            Self::WithContext { source, .. } => source.is_invariant_violation(),
            _ => false,
        }
    }
}

impl From<crate::config::ConfigValidationError> for FeatureError {
    fn from(error: crate::config::ConfigValidationError) -> Self {
        FeatureError::InvalidConfig(error.to_string())
    }
}

/// Errors are serialized as `{ "code": ..., "message": ... }` for JSON output.
impl Serialize for FeatureError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("FeatureError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for feature operations.
pub type Result<T> = std::result::Result<T, FeatureError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| FeatureError::Polars(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| FeatureError::Io(e).with_context(context))
    }
}
