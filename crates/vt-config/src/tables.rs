//! Calibration table types.
//!
//! Two immutable tables drive cohort generation:
//! - `AgeTable`: age bands with their share of ICU admissions
//! - `SeverityTable`: mortality by severity-score bucket, 0..19 plus a capped ≥20 bucket

use crate::validate::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Highest severity bucket; it stands for every score ≥ 20.
pub const SEVERITY_CAP_BUCKET: u32 = 20;

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

/// One age band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeBand {
    pub label: String,
    pub min_age: f64,
    /// Inclusive upper bound; None marks the final open-ended band.
    #[serde(default)]
    pub max_age: Option<f64>,
    /// Share of total ICU admissions attributable to this band.
    pub relative_weight: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospitalization_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icu_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_percent: Option<f64>,
}

impl AgeBand {
    pub fn new(label: &str, min_age: f64, max_age: Option<f64>, relative_weight: f64) -> Self {
        Self {
            label: label.to_string(),
            min_age,
            max_age,
            relative_weight,
            hospitalization_percent: None,
            icu_percent: None,
            death_percent: None,
        }
    }

    /// Upper sampling bound, substituting `oldest_age` for an open band.
    pub fn upper_bound(&self, oldest_age: f64) -> f64 {
        self.max_age.unwrap_or(oldest_age)
    }
}

/// Age-band outcome table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeTable {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    #[serde(default)]
    pub description: Option<String>,

    pub bands: Vec<AgeBand>,
}

impl AgeTable {
    pub fn new(bands: Vec<AgeBand>) -> Self {
        Self {
            schema_version: default_schema_version(),
            description: None,
            bands,
        }
    }

    /// Load an age table from a JSON file.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    /// Parse an age table from a JSON string.
    pub fn from_json_str(json: &str) -> ValidationResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid age table JSON: {}", e)))
    }

    /// Indices of the bands that patients are drawn from.
    ///
    /// A band is excluded when its whole range lies below `min_patient_age`.
    pub fn sampling_band_indices(&self, min_patient_age: f64) -> Vec<usize> {
        self.bands
            .iter()
            .enumerate()
            .filter(|(_, band)| band.max_age.map_or(true, |max| max >= min_patient_age))
            .map(|(i, _)| i)
            .collect()
    }

    /// Sum of the weights of the sampling bands.
    pub fn sampling_weight(&self, min_patient_age: f64) -> f64 {
        self.sampling_band_indices(min_patient_age)
            .into_iter()
            .map(|i| self.bands[i].relative_weight)
            .sum()
    }
}

/// One severity bucket row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityRow {
    /// Integer score; `SEVERITY_CAP_BUCKET` stands for "≥20".
    pub bucket: u32,
    pub mortality_percent: f64,
}

/// Severity-score mortality table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityTable {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    #[serde(default)]
    pub description: Option<String>,

    pub rows: Vec<SeverityRow>,
}

impl SeverityTable {
    pub fn new(rows: Vec<SeverityRow>) -> Self {
        Self {
            schema_version: default_schema_version(),
            description: None,
            rows,
        }
    }

    /// Build a table from mortality percents indexed by bucket (0, 1, ...).
    pub fn from_mortality(mortality_percent: &[f64]) -> Self {
        Self::new(
            mortality_percent
                .iter()
                .enumerate()
                .map(|(bucket, &m)| SeverityRow {
                    bucket: bucket as u32,
                    mortality_percent: m,
                })
                .collect(),
        )
    }

    /// Load a severity table from a JSON file.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    /// Parse a severity table from a JSON string.
    pub fn from_json_str(json: &str) -> ValidationResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid severity table JSON: {}", e)))
    }

    /// Mortality percent for a bucket, if the table has a row for it.
    pub fn mortality_percent(&self, bucket: u32) -> Option<f64> {
        self.rows
            .iter()
            .find(|row| row.bucket == bucket)
            .map(|row| row.mortality_percent)
    }

    /// Survival probability `1 - mortality/100` for a bucket.
    pub fn survival_probability(&self, bucket: u32) -> Option<f64> {
        self.mortality_percent(bucket)
            .map(|m| (1.0 - m / 100.0).clamp(0.0, 1.0))
    }
}
