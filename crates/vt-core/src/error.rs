//! Error types for the simulation core.
//!
//! Two failure classes exist:
//! - configuration errors, detected before any sampling begins
//! - lookup failures, which mean the calibration data is defective and are
//!   never worth retrying

use thiserror::Error;
use vt_config::ValidationError;

/// Result type alias for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;

/// Unified error type for the simulation core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("invalid configuration for {field}: {message}")]
    InvalidConfiguration { field: String, message: String },

    #[error("no mortality row for severity bucket {bucket}")]
    LookupFailure { bucket: u32 },

    #[error("calibration validation failed: {0}")]
    Validation(#[from] ValidationError),
}

impl SimError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        SimError::InvalidConfiguration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Stable numeric code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            SimError::InvalidConfiguration { .. } => 10,
            SimError::LookupFailure { .. } => 11,
            SimError::Validation(inner) => inner.code(),
        }
    }

    /// Offending parameter or calibration field, when one is known.
    pub fn field(&self) -> Option<&str> {
        match self {
            SimError::InvalidConfiguration { field, .. } => Some(field),
            SimError::LookupFailure { .. } => None,
            SimError::Validation(inner) => inner.field(),
        }
    }

    /// True when the error points at defective calibration data rather than
    /// a bad parameter choice.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SimError::LookupFailure { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(SimError::invalid("patients", "must be positive").code(), 10);
        assert_eq!(SimError::LookupFailure { bucket: 21 }.code(), 11);
        let wrapped: SimError = ValidationError::SemanticError("x".into()).into();
        assert_eq!(wrapped.code(), 63);
    }

    #[test]
    fn only_lookup_failure_is_fatal() {
        assert!(SimError::LookupFailure { bucket: 4 }.is_fatal());
        assert!(!SimError::invalid("k", "too big").is_fatal());
    }

    #[test]
    fn field_passes_through_validation_errors() {
        assert_eq!(SimError::invalid("trials", "zero").field(), Some("trials"));
        assert_eq!(SimError::LookupFailure { bucket: 3 }.field(), None);
        let wrapped: SimError = ValidationError::InvalidValue {
            field: "severity.std_dev".into(),
            message: "Must be positive".into(),
        }
        .into();
        assert_eq!(wrapped.field(), Some("severity.std_dev"));
        let parse: SimError = ValidationError::ParseError("eof".into()).into();
        assert_eq!(parse.field(), None);
    }

    #[test]
    fn display_names_the_field() {
        let err = SimError::invalid("ventilators", "must not exceed patients (10), got 11");
        assert_eq!(
            err.to_string(),
            "invalid configuration for ventilators: must not exceed patients (10), got 11"
        );
    }
}
