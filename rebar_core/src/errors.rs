//! # Error Types
//!
//! Structured error types for rebar_core. Library-level failures (bad input
//! files, invalid settings, serialization problems) are reported through
//! [`RebarError`]. Design infeasibility is *not* an error: a beam that cannot
//! be reinforced comes back as an invalid solution carrying a diagnostic
//! message, so callers always get one entry per beam.
//!
//! ## Example
//!
//! ```rust
//! use rebar_core::errors::{RebarError, RebarResult};
//!
//! fn validate_width(width_mm: f64) -> RebarResult<()> {
//!     if width_mm <= 0.0 {
//!         return Err(RebarError::invalid_input(
//!             "width_mm",
//!             width_mm.to_string(),
//!             "Width must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for rebar_core operations
pub type RebarResult<T> = Result<T, RebarError>;

/// Structured error type for design operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum RebarError {
    /// An input value is invalid (out of range, wrong type, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Analysis results are missing for a span of a beam group
    #[error("Missing analysis data for {group} span {span_number}: {reason}")]
    MissingSpanData {
        group: String,
        span_number: usize,
        reason: String,
    },

    /// Required steel could not be placed at a location
    #[error("Cannot place {required_cm2:.2} cm² at {location}: deficit {deficit_cm2:.2} cm²")]
    PlacementInfeasible {
        location: String,
        required_cm2: f64,
        deficit_cm2: f64,
    },

    /// Settings failed validation
    #[error("Invalid settings '{setting}': {reason}")]
    InvalidSettings { setting: String, reason: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
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

    /// The solve budget ran out
    #[error("Deadline exceeded after {elapsed_ms} ms while {activity}")]
    DeadlineExceeded { elapsed_ms: u64, activity: String },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl RebarError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        RebarError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        RebarError::MissingField { field: field.into() }
    }

    /// Create a MissingSpanData error
    pub fn missing_span_data(group: impl Into<String>, span_number: usize, reason: impl Into<String>) -> Self {
        RebarError::MissingSpanData {
            group: group.into(),
            span_number,
            reason: reason.into(),
        }
    }

    /// Create a PlacementInfeasible error
    pub fn placement_infeasible(location: impl Into<String>, required_cm2: f64, deficit_cm2: f64) -> Self {
        RebarError::PlacementInfeasible {
            location: location.into(),
            required_cm2,
            deficit_cm2,
        }
    }

    /// Create an InvalidSettings error
    pub fn invalid_settings(setting: impl Into<String>, reason: impl Into<String>) -> Self {
        RebarError::InvalidSettings {
            setting: setting.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        RebarError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Check if this is a recoverable error (e.g., can retry with a larger budget)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RebarError::DeadlineExceeded { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            RebarError::InvalidInput { .. } => "INVALID_INPUT",
            RebarError::MissingField { .. } => "MISSING_FIELD",
            RebarError::MissingSpanData { .. } => "MISSING_SPAN_DATA",
            RebarError::PlacementInfeasible { .. } => "PLACEMENT_INFEASIBLE",
            RebarError::InvalidSettings { .. } => "INVALID_SETTINGS",
            RebarError::FileError { .. } => "FILE_ERROR",
            RebarError::SerializationError { .. } => "SERIALIZATION_ERROR",
            RebarError::VersionMismatch { .. } => "VERSION_MISMATCH",
            RebarError::DeadlineExceeded { .. } => "DEADLINE_EXCEEDED",
            RebarError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for RebarError {
    fn from(e: serde_json::Error) -> Self {
        RebarError::SerializationError { reason: e.to_string() }
    }
}
