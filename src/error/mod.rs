//! Error handling for the scoring pipeline.
//!
//! Every failure is a variant of [`Error`]. Callers at the HTTP boundary
//! decide status codes through [`Error::kind`] rather than by matching
//! individual variants.

pub mod util;

use std::path::PathBuf;

use arrow::error::ArrowError;
use itertools::Itertools;
use parquet::errors::ParquetError;

/// Coarse classification of [`Error`] used to pick a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing attributes or unsupported formats; user-correctable
    Validation,
    /// Values that make feature derivation undefined
    Numeric,
    /// The classifier or its configuration could not be loaded at startup
    Model,
    /// Anything else raised while the pipeline runs
    Unexpected,
}

/// Specialized error type for the scoring pipeline
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Required attributes or columns are absent
    #[error("Missing required fields: {}", .fields.iter().join(", "))]
    MissingFields { fields: Vec<String> },

    /// A batch request arrived without a file part
    #[error("No file uploaded")]
    MissingUpload,

    /// The uploaded file name has an unknown suffix
    #[error("Unsupported file format '{name}'. Upload CSV, Excel or Parquet files.")]
    UnsupportedInputFormat { name: String },

    /// The requested output format is neither `csv` nor `excel`
    #[error("Invalid output format '{format}'. Use 'csv' or 'excel'.")]
    UnsupportedOutputFormat { format: String },

    /// The single-record payload is not a JSON object
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// A present value makes feature derivation undefined
    #[error("Invalid value for '{field}' in row {row}: {value}")]
    InvalidValue {
        field: String,
        row: usize,
        value: f64,
    },

    /// A required value is null or not numeric
    #[error("Malformed value for '{column}' in row {row}: {reason}")]
    MalformedValue {
        column: String,
        row: usize,
        reason: String,
    },

    /// A startup file (classifier, scaler parameters, configuration) could
    /// not be read
    #[error("Failed to read {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The classifier artifact is inconsistent
    #[error("Model error: {0}")]
    Model(String),

    /// Service configuration or scaler parameters are unusable
    #[error("Configuration error: {0}")]
    Config(String),

    /// The classifier produced something that is not a probability
    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record conversion error: {0}")]
    SerdeArrow(#[from] serde_arrow::Error),
}

impl Error {
    /// Create a [`Error::MissingFields`] from any iterator of names
    pub fn missing_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MissingFields {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a [`Error::MalformedValue`] for a column and row
    pub fn malformed(column: &str, row: usize, reason: impl Into<String>) -> Self {
        Self::MalformedValue {
            column: column.to_string(),
            row,
            reason: reason.into(),
        }
    }

    /// Classify this error for the response boundary
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingFields { .. }
            | Self::MissingUpload
            | Self::UnsupportedInputFormat { .. }
            | Self::UnsupportedOutputFormat { .. }
            | Self::InvalidPayload(_) => ErrorKind::Validation,
            Self::InvalidValue { .. } => ErrorKind::Numeric,
            Self::Load { .. } | Self::Model(_) | Self::Config(_) => ErrorKind::Model,
            Self::MalformedValue { .. }
            | Self::Inference(_)
            | Self::Arrow(_)
            | Self::Parquet(_)
            | Self::ExcelRead(_)
            | Self::ExcelWrite(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::SerdeArrow(_) => ErrorKind::Unexpected,
        }
    }

    /// Whether the caller can fix the request and retry
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation | ErrorKind::Numeric)
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;
