//! Calibration validation + resolution tests against real JSON fixtures.
//!
//! Covers:
//! - Age and severity table validation
//! - Constants loading with partial overrides
//! - Resolution order (CLI > env path > env config dir > preset)

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;
use vt_config::resolve::{
    ENV_AGE_TABLE_PATH, ENV_CONFIG_DIR, ENV_SEVERITY_TABLE_PATH, SEVERITY_TABLE_FILENAME,
};
use vt_config::validate::{validate_age_table, validate_severity_table, ValidationError};
use vt_config::{
    load_calibration, resolve_calibration, AgeTable, CalibrationPreset, ConfigSource,
    SeverityTable, SimulationConstants,
};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("test")
        .join("fixtures")
        .join("calibration")
}

struct EnvGuard {
    keys: Vec<String>,
    saved: Vec<Option<String>>,
}

impl EnvGuard {
    fn new(keys: &[&str]) -> Self {
        let saved = keys.iter().map(|k| env::var(k).ok()).collect();
        for key in keys {
            env::remove_var(key);
        }
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            saved,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, saved) in self.keys.iter().zip(self.saved.iter()) {
            match saved {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }
}

fn with_env_lock<T>(f: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .expect("env lock poisoned");
    let _env = EnvGuard::new(&[ENV_AGE_TABLE_PATH, ENV_SEVERITY_TABLE_PATH, ENV_CONFIG_DIR]);
    f()
}

#[test]
fn valid_age_table_fixture_ok() {
    let table = AgeTable::from_file(&fixtures_dir().join("valid_age_table.json"))
        .expect("read age fixture");
    validate_age_table(&table, 20.0).expect("valid table passes");
    assert_eq!(table.sampling_band_indices(20.0), vec![1, 2, 3]);
}

#[test]
fn zero_weight_age_table_rejected() {
    let table = AgeTable::from_file(&fixtures_dir().join("invalid_age_table_zero_weight.json"))
        .expect("read age fixture");
    let err = validate_age_table(&table, 20.0).expect_err("zero adult weight");
    assert!(matches!(err, ValidationError::SemanticError(_)));
}

#[test]
fn valid_severity_table_fixture_ok() {
    let table = SeverityTable::from_file(&fixtures_dir().join("valid_severity_table.json"))
        .expect("read severity fixture");
    validate_severity_table(&table).expect("valid table passes");
    assert_eq!(table, {
        let mut preset = CalibrationPreset::Cdc2020.severity_table();
        preset.description = table.description.clone();
        preset
    });
}

#[test]
fn severity_table_missing_bucket_rejected() {
    let table = SeverityTable::from_file(
        &fixtures_dir().join("invalid_severity_table_missing_bucket.json"),
    )
    .expect("read severity fixture");
    let err = validate_severity_table(&table).expect_err("bucket 20 missing");
    assert!(matches!(err, ValidationError::SemanticError(_)));
}

#[test]
fn constants_override_fixture_merges_with_defaults() {
    let constants = SimulationConstants::from_file(&fixtures_dir().join("constants_override.json"))
        .expect("read constants");
    let defaults = SimulationConstants::default();
    assert_eq!(constants.severity.intercept, 2.0);
    assert_eq!(constants.severity.std_dev, 2.5);
    assert_eq!(constants.severity.age_slope, defaults.severity.age_slope);
    assert_eq!(constants.life_years.max_life_span, 90.0);
    assert_eq!(constants.comorbidity, defaults.comorbidity);
}

#[test]
fn resolution_falls_back_to_preset() {
    with_env_lock(|| {
        let paths = resolve_calibration(None, None);
        assert!(paths.age_table.is_none());
        assert_eq!(paths.age_table_source, ConfigSource::BuiltinPreset);
        assert_eq!(paths.severity_table_source, ConfigSource::BuiltinPreset);
    });
}

#[test]
fn missing_env_path_is_skipped() {
    with_env_lock(|| {
        env::set_var(ENV_AGE_TABLE_PATH, "/nonexistent/age_table.json");
        let paths = resolve_calibration(None, None);
        assert!(paths.age_table.is_none());
        assert_eq!(paths.age_table_source, ConfigSource::BuiltinPreset);
    });
}

#[test]
fn resolution_prefers_env_path_then_config_dir() {
    with_env_lock(|| {
        let dir = TempDir::new().expect("tempdir");
        fs::copy(
            fixtures_dir().join("valid_severity_table.json"),
            dir.path().join(SEVERITY_TABLE_FILENAME),
        )
        .expect("copy fixture");

        env::set_var(ENV_CONFIG_DIR, dir.path());
        env::set_var(
            ENV_AGE_TABLE_PATH,
            fixtures_dir().join("valid_age_table.json"),
        );

        let paths = resolve_calibration(None, None);
        assert_eq!(paths.age_table_source, ConfigSource::Environment);
        assert_eq!(
            paths.severity_table.as_deref(),
            Some(dir.path().join(SEVERITY_TABLE_FILENAME).as_path())
        );

        let (age, severity) = load_calibration(
            &paths,
            CalibrationPreset::Flat,
            &SimulationConstants::default(),
        )
        .expect("load resolved tables");
        assert_eq!(age.bands.len(), 4);
        assert_eq!(severity.rows.len(), 21);
    });
}

#[test]
fn cli_path_beats_environment() {
    with_env_lock(|| {
        env::set_var(
            ENV_AGE_TABLE_PATH,
            fixtures_dir().join("invalid_age_table_zero_weight.json"),
        );
        let cli = fixtures_dir().join("valid_age_table.json");
        let paths = resolve_calibration(Some(&cli), None);
        assert_eq!(paths.age_table_source, ConfigSource::CliArgument);
        assert_eq!(paths.age_table.as_deref(), Some(cli.as_path()));
    });
}
