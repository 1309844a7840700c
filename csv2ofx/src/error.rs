//! Error types for the csv2ofx conversion pipeline.
//!
//! - [`FieldError`] - evaluating one field rule against one row
//! - [`CatalogError`] - loading and validating the specification document
//! - [`StreamError`] - opening input/output streams
//! - [`ConvertError`] - top-level conversion errors
//!
//! Numeric and date failures ([`FieldError::NumericParse`],
//! [`FieldError::DateParse`]) are recovered by the decoder and never reach
//! [`ConvertError`]. Structural failures abort the run.

use std::path::PathBuf;

use thiserror::Error;

// =============================================================================
// Field Errors
// =============================================================================

/// Errors while evaluating a field rule against a raw row.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    /// The row has fewer tokens than the rule's column index requires.
    #[error("Row has {len} columns, column {index} requested")]
    MalformedRow { index: usize, len: usize },

    /// The token does not match the configured date pattern.
    #[error("Cannot parse '{value}' as a date with pattern '{format}'")]
    DateParse { value: String, format: String },

    /// The rule has no date pattern configured.
    #[error("No date format configured")]
    MissingDateFormat,

    /// The token is not a number.
    #[error("Cannot parse '{value}' as a number")]
    NumericParse { value: String },

    /// A sum rule was evaluated as text or date.
    #[error("Sum rules only produce numbers")]
    CompositeField,
}

impl FieldError {
    /// Whether this error aborts decoding of the row.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::MalformedRow { .. } | Self::CompositeField)
    }
}

// =============================================================================
// Catalog Errors
// =============================================================================

/// Errors while loading the specification document.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Failed to read the document.
    #[error("Cannot read specification {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON or does not match the typed model.
    #[error("Invalid specification JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The document violates the specification schema.
    #[error("Specification does not match schema: {}", errors.join("; "))]
    Schema { errors: Vec<String> },

    /// A format failed structural checks.
    #[error("Invalid format '{name}': {message}")]
    InvalidFormat { name: String, message: String },

    /// The document defines no formats.
    #[error("Specification defines no formats")]
    Empty,
}

// =============================================================================
// Stream Errors
// =============================================================================

/// Errors while opening the input or output stream.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// =============================================================================
// Conversion Errors (top-level)
// =============================================================================

/// Top-level conversion errors.
///
/// This is the error returned by [`crate::ConversionPipeline::run`] and
/// [`crate::convert`]. Every variant is fatal for the run.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Specification error.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Stream error.
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// Delimited input could not be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Writing the output failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A row could not be decoded.
    #[error("Line {line}, field '{field}': {source}")]
    MalformedRow {
        line: u64,
        field: &'static str,
        #[source]
        source: FieldError,
    },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for field evaluation.
pub type FieldResult<T> = Result<T, FieldError>;

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Result type for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;
