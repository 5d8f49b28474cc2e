//! Calibration file resolution and loading.
//!
//! Resolution order: CLI arguments → environment variables → config directory → preset.

use crate::constants::SimulationConstants;
use crate::preset::CalibrationPreset;
use crate::tables::{AgeTable, SeverityTable};
use crate::validate::{
    validate_age_table, validate_constants, validate_open_band, validate_severity_table,
    ValidationResult,
};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Discovered calibration file paths.
#[derive(Debug, Clone, Default)]
pub struct CalibrationPaths {
    /// Path to the age table (None means the preset is used).
    pub age_table: Option<PathBuf>,

    /// Path to the severity table (None means the preset is used).
    pub severity_table: Option<PathBuf>,

    pub age_table_source: ConfigSource,

    pub severity_table_source: ConfigSource,
}

/// Where a calibration file was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable (direct path or config dir).
    Environment,

    /// Using the built-in preset.
    #[default]
    BuiltinPreset,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::BuiltinPreset => write!(f, "builtin preset"),
        }
    }
}

/// Environment variable names.
pub const ENV_AGE_TABLE_PATH: &str = "VT_AGE_TABLE";
pub const ENV_SEVERITY_TABLE_PATH: &str = "VT_SEVERITY_TABLE";
pub const ENV_CONFIG_DIR: &str = "VT_CONFIG_DIR";

/// Standard calibration file names inside a config directory.
pub const AGE_TABLE_FILENAME: &str = "age_table.json";
pub const SEVERITY_TABLE_FILENAME: &str = "severity_table.json";

/// Resolve calibration paths using the standard resolution order.
///
/// For each table:
/// 1. Explicit CLI path (returned even if missing, so loading reports the error)
/// 2. Environment variable (VT_AGE_TABLE, VT_SEVERITY_TABLE)
/// 3. VT_CONFIG_DIR environment variable + filename
/// 4. Built-in preset (None)
pub fn resolve_calibration(cli_age: Option<&Path>, cli_severity: Option<&Path>) -> CalibrationPaths {
    let mut paths = CalibrationPaths::default();

    paths.age_table = resolve_single(
        cli_age,
        ENV_AGE_TABLE_PATH,
        AGE_TABLE_FILENAME,
        &mut paths.age_table_source,
    );
    paths.severity_table = resolve_single(
        cli_severity,
        ENV_SEVERITY_TABLE_PATH,
        SEVERITY_TABLE_FILENAME,
        &mut paths.severity_table_source,
    );

    debug!(
        age_source = %paths.age_table_source,
        severity_source = %paths.severity_table_source,
        "resolved calibration paths"
    );
    paths
}

fn resolve_single(
    cli_path: Option<&Path>,
    env_var: &str,
    filename: &str,
    source: &mut ConfigSource,
) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        *source = ConfigSource::CliArgument;
        return Some(path.to_path_buf());
    }

    if let Ok(env_path) = std::env::var(env_var) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            *source = ConfigSource::Environment;
            return Some(path);
        }
        warn!(
            var = env_var,
            path = %path.display(),
            "calibration file named by environment does not exist, ignoring"
        );
    }

    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(filename);
        if path.exists() {
            *source = ConfigSource::Environment;
            return Some(path);
        }
    }

    *source = ConfigSource::BuiltinPreset;
    None
}

/// Load and validate both tables, falling back to `preset` for any table
/// without a resolved path.
pub fn load_calibration(
    paths: &CalibrationPaths,
    preset: CalibrationPreset,
    constants: &SimulationConstants,
) -> ValidationResult<(AgeTable, SeverityTable)> {
    validate_constants(constants)?;

    let age = match &paths.age_table {
        Some(path) => AgeTable::from_file(path)?,
        None => preset.age_table(),
    };
    validate_age_table(&age, constants.cohort.min_patient_age)?;
    validate_open_band(&age, constants.cohort.oldest_age)?;

    let severity = match &paths.severity_table {
        Some(path) => SeverityTable::from_file(path)?,
        None => preset.severity_table(),
    };
    validate_severity_table(&severity)?;

    Ok((age, severity))
}
