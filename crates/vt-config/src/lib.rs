//! Ventilator triage configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for the age-band and severity calibration tables
//! - The immutable simulation constants (severity, comorbidity, life-years models)
//! - Policy scheme constants for the tiered and scored allocation schemes
//! - Built-in calibration presets
//! - Calibration file resolution (CLI → env → defaults)
//! - Semantic validation

pub mod constants;
pub mod policy;
pub mod preset;
pub mod resolve;
pub mod tables;
pub mod validate;

pub use constants::{
    CohortModel, ComorbidityModel, LifeYearsModel, SeverityModel, SimulationConstants,
};
pub use policy::{ComorbidityPoints, ScoringScheme, TierScheme};
pub use preset::CalibrationPreset;
pub use resolve::{load_calibration, resolve_calibration, CalibrationPaths, ConfigSource};
pub use tables::{AgeBand, AgeTable, SeverityRow, SeverityTable, SEVERITY_CAP_BUCKET};
pub use validate::{ValidationError, ValidationResult};

/// Schema version for calibration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
