//! Exit codes for the vt-core CLI.
//!
//! Exit codes communicate the outcome without requiring output parsing.
//!
//! Exit code ranges:
//! - 0: Success
//! - 10-19: Configuration and calibration-data errors
//! - 20-29: Internal errors (bugs, should be reported)
//!
//! Argument parsing failures are reported by clap with its own code (2).

use crate::error::SimError;
use vt_config::ValidationError;

/// Exit codes for vt-core operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Run completed; payload written to stdout.
    Ok = 0,

    /// Invalid run parameters, calibration tables or constants
    ConfigError = 10,

    /// Severity bucket missing from the mortality table
    LookupError = 11,

    /// Calibration file unreadable, or output could not be written
    IoError = 12,

    /// Internal error (bug - please report)
    InternalError = 20,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Ok => "OK",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::LookupError => "ERR_LOOKUP",
            ExitCode::IoError => "ERR_IO",
            ExitCode::InternalError => "ERR_INTERNAL",
        }
    }
}

impl From<&SimError> for ExitCode {
    fn from(err: &SimError) -> Self {
        match err {
            SimError::InvalidConfiguration { .. } => ExitCode::ConfigError,
            SimError::LookupFailure { .. } => ExitCode::LookupError,
            SimError::Validation(inner) => ExitCode::from(inner),
        }
    }
}

impl From<&ValidationError> for ExitCode {
    fn from(err: &ValidationError) -> Self {
        match err {
            ValidationError::IoError(_) => ExitCode::IoError,
            _ => ExitCode::ConfigError,
        }
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Ok.as_i32(), 0);
        assert_eq!(ExitCode::ConfigError.as_i32(), 10);
        assert_eq!(ExitCode::LookupError.as_i32(), 11);
        assert_eq!(ExitCode::IoError.as_i32(), 12);
        assert_eq!(ExitCode::InternalError.as_i32(), 20);
    }

    #[test]
    fn test_from_sim_error() {
        assert_eq!(
            ExitCode::from(&SimError::invalid("patients", "zero")),
            ExitCode::ConfigError
        );
        assert_eq!(
            ExitCode::from(&SimError::LookupFailure { bucket: 20 }),
            ExitCode::LookupError
        );
        let io: SimError = ValidationError::IoError("missing".into()).into();
        assert_eq!(ExitCode::from(&io), ExitCode::IoError);
        let parse: SimError = ValidationError::ParseError("bad json".into()).into();
        assert_eq!(ExitCode::from(&parse), ExitCode::ConfigError);
    }

    #[test]
    fn test_display() {
        assert_eq!(ExitCode::LookupError.to_string(), "ERR_LOOKUP (11)");
    }
}
