//! # Error Types
//!
//! Structured error types for sign_core. Solvers use these internally while
//! validating input; at the solver boundary every error is folded into an
//! [`Envelope`](crate::envelope::Envelope) so callers never see an `Err`.
//! The loaders (constants packs, section catalogs) return them directly.
//!
//! ## Example
//!
//! ```rust
//! use sign_core::errors::{CalcError, CalcResult};
//!
//! fn validate_diameter(diameter_ft: f64) -> CalcResult<()> {
//!     if diameter_ft <= 0.0 {
//!         return Err(CalcError::invalid_input(
//!             "diameter_ft",
//!             diameter_ft.to_string(),
//!             "Footing diameter must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for sign_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for calculation and loading operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value is physically impossible or out of range
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Section designation not present in the catalog
    #[error("Section not found: {designation}")]
    SectionNotFound { designation: String },

    /// A calibration identifier that no loaded pack answers to
    #[error("Unknown calibration '{requested}' (loaded: {available})")]
    UnknownCalibration { requested: String, available: String },

    /// A constants pack is malformed or missing
    #[error("Constants pack '{pack}': {reason}")]
    PackError { pack: String, reason: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON / TOML serialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CalcError::MissingField {
            field: field.into(),
        }
    }

    /// Create a SectionNotFound error
    pub fn section_not_found(designation: impl Into<String>) -> Self {
        CalcError::SectionNotFound {
            designation: designation.into(),
        }
    }

    /// Create an UnknownCalibration error
    pub fn unknown_calibration(requested: impl Into<String>, available: impl Into<String>) -> Self {
        CalcError::UnknownCalibration {
            requested: requested.into(),
            available: available.into(),
        }
    }

    /// Create a PackError
    pub fn pack_error(pack: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::PackError {
            pack: pack.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization(reason: impl Into<String>) -> Self {
        CalcError::SerializationError {
            reason: reason.into(),
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::SectionNotFound { .. } => "SECTION_NOT_FOUND",
            CalcError::UnknownCalibration { .. } => "UNKNOWN_CALIBRATION",
            CalcError::PackError { .. } => "PACK_ERROR",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(err: serde_json::Error) -> Self {
        CalcError::serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::invalid_input("soil_bearing_psf", "0", "non-positive soil bearing capacity");
        let json = serde_json::to_string(&error).unwrap();
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::missing_field("wind_speed_mph").error_code(), "MISSING_FIELD");
        assert_eq!(CalcError::section_not_found("PIPE99").error_code(), "SECTION_NOT_FOUND");
        assert_eq!(CalcError::pack_error("footing", "bad").error_code(), "PACK_ERROR");
    }
}
