//! # Error Types
//!
//! Structured error types for forest_core. Each variant carries enough
//! context for a caller (human or program) to see which field or record
//! caused the failure.
//!
//! Degenerate arithmetic is not an error: zero or negative spacings, plot
//! areas, ages and emission rates yield `0.0` from the equations.
//!
//! ## Example
//!
//! ```rust
//! use forest_core::errors::{MetricsError, MetricsResult};
//!
//! fn validate_age(age_years: f64) -> MetricsResult<()> {
//!     if age_years < 0.0 {
//!         return Err(MetricsError::invalid_input(
//!             "age_years",
//!             age_years.to_string(),
//!             "Stand age cannot be negative",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for forest_core operations
pub type MetricsResult<T> = Result<T, MetricsError>;

/// Structured error type for metric calculations and record storage.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum MetricsError {
    /// An input value is invalid (empty tree list, negative measurement, or a
    /// computed figure that is not finite)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// A function was evaluated outside the domain where it is defined
    /// (e.g. the site-index inverse at age 0)
    #[error("Undefined domain: {function} is undefined for {parameter} = {value}")]
    UndefinedDomain {
        function: String,
        parameter: String,
        value: String,
    },

    /// No record with this identifier exists in the store
    #[error("Record not found: {id}")]
    RecordNotFound { id: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// File is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl MetricsError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        MetricsError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        MetricsError::MissingField {
            field: field.into(),
        }
    }

    /// Create an UndefinedDomain error
    pub fn undefined_domain(function: impl Into<String>, parameter: impl Into<String>, value: impl Into<String>) -> Self {
        MetricsError::UndefinedDomain {
            function: function.into(),
            parameter: parameter.into(),
            value: value.into(),
        }
    }

    /// Create a RecordNotFound error
    pub fn record_not_found(id: impl ToString) -> Self {
        MetricsError::RecordNotFound { id: id.to_string() }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        MetricsError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(path: impl Into<String>, locked_by: impl Into<String>, locked_at: impl Into<String>) -> Self {
        MetricsError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Create a SerializationError from anything displayable
    pub fn serialization(reason: impl ToString) -> Self {
        MetricsError::SerializationError {
            reason: reason.to_string(),
        }
    }

    /// Check if this is a recoverable error (e.g., can retry)
    ///
    /// Calculations are deterministic, so only lock contention qualifies.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, MetricsError::FileLocked { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            MetricsError::InvalidInput { .. } => "INVALID_INPUT",
            MetricsError::MissingField { .. } => "MISSING_FIELD",
            MetricsError::UndefinedDomain { .. } => "UNDEFINED_DOMAIN",
            MetricsError::RecordNotFound { .. } => "RECORD_NOT_FOUND",
            MetricsError::FileError { .. } => "FILE_ERROR",
            MetricsError::FileLocked { .. } => "FILE_LOCKED",
            MetricsError::SerializationError { .. } => "SERIALIZATION_ERROR",
            MetricsError::VersionMismatch { .. } => "VERSION_MISMATCH",
            MetricsError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}
