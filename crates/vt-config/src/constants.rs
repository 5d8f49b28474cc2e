//! Simulation constants for cohort generation.
//!
//! Every calibration coefficient the generator uses lives here, grouped by
//! the sub-model it feeds. The structure is immutable once built and passed
//! explicitly into the generator.

use crate::validate::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// All calibration constants for one simulation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationConstants {
    #[serde(default)]
    pub severity: SeverityModel,

    #[serde(default)]
    pub comorbidity: ComorbidityModel,

    #[serde(default)]
    pub life_years: LifeYearsModel,

    #[serde(default)]
    pub cohort: CohortModel,
}

impl SimulationConstants {
    /// Load constants from a JSON file. Missing sections take their defaults.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    /// Parse constants from a JSON string.
    pub fn from_json_str(json: &str) -> ValidationResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid constants JSON: {}", e)))
    }
}

/// Severity-score model: `μ = intercept + age_slope·age + offset(state)`,
/// drawn from Normal(μ, std_dev) and clamped to `[clamp_min, clamp_max]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityModel {
    pub intercept: f64,
    pub age_slope: f64,
    pub std_dev: f64,
    pub major_offset: f64,
    pub severe_offset: f64,
    pub clamp_min: f64,
    pub clamp_max: f64,
}

impl Default for SeverityModel {
    fn default() -> Self {
        Self {
            intercept: 3.0,
            age_slope: 0.05,
            std_dev: 3.0,
            major_offset: 1.5,
            severe_offset: 3.0,
            clamp_min: 3.0,
            clamp_max: 20.0,
        }
    }
}

/// Multinomial logit for comorbidity state, with `none` as the reference
/// category: `z_major = major_age_coef·age + major_intercept`,
/// `z_severe = severe_age_coef·age + severe_intercept`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComorbidityModel {
    pub major_age_coef: f64,
    pub major_intercept: f64,
    pub severe_age_coef: f64,
    pub severe_intercept: f64,
}

impl Default for ComorbidityModel {
    fn default() -> Self {
        Self {
            major_age_coef: 0.03,
            major_intercept: -2.0,
            severe_age_coef: 0.04,
            severe_intercept: -4.0,
        }
    }
}

impl ComorbidityModel {
    /// Logit scores `[none, major, severe]` at an age.
    pub fn logits(&self, age: f64) -> [f64; 3] {
        [
            0.0,
            self.major_age_coef * age + self.major_intercept,
            self.severe_age_coef * age + self.severe_intercept,
        ]
    }
}

/// Remaining life-years by comorbidity state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifeYearsModel {
    pub max_life_span: f64,
    /// Multiple of `(max_life_span - age)` credited to a major-comorbidity patient.
    pub major_fraction: f64,
    /// Flat life-years credited to a severe-comorbidity patient.
    pub severe_life_years: f64,
}

impl Default for LifeYearsModel {
    fn default() -> Self {
        Self {
            max_life_span: 100.0,
            major_fraction: 0.75,
            severe_life_years: 1.0,
        }
    }
}

/// Cohort-level sampling bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CohortModel {
    /// Bands lying wholly below this age are not sampled.
    pub min_patient_age: f64,
    /// Upper sampling bound for the open-ended final band.
    pub oldest_age: f64,
}

impl Default for CohortModel {
    fn default() -> Self {
        Self {
            min_patient_age: 20.0,
            oldest_age: 100.0,
        }
    }
}
