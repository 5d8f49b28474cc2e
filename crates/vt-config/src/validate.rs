//! Configuration validation errors and semantic validation.

use crate::constants::SimulationConstants;
use crate::policy::{ScoringScheme, TierScheme};
use crate::tables::{AgeTable, SeverityTable, SEVERITY_CAP_BUCKET};
use thiserror::Error;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }

    /// Field path the error refers to, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::InvalidValue { field, .. } => Some(field),
            _ => None,
        }
    }
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
}

fn check_version(actual: &str) -> ValidationResult<()> {
    if actual != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

fn check_finite(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() {
        return Err(invalid(field, format!("Must be finite, got {}", value)));
    }
    Ok(())
}

/// Validate an age table semantically.
///
/// Bands must be ordered and non-overlapping, only the last band may be
/// open-ended, weights must be finite and non-negative, and the bands that
/// are actually sampled (those reaching `min_patient_age`) must carry a
/// positive total weight.
pub fn validate_age_table(table: &AgeTable, min_patient_age: f64) -> ValidationResult<()> {
    check_version(&table.schema_version)?;

    if table.bands.is_empty() {
        return Err(ValidationError::SemanticError(
            "age table must contain at least one band".to_string(),
        ));
    }

    let last = table.bands.len() - 1;
    let mut previous_max: Option<f64> = None;
    for (i, band) in table.bands.iter().enumerate() {
        let field = format!("bands[{}]", i);
        check_finite(&format!("{}.min_age", field), band.min_age)?;
        if band.min_age < 0.0 {
            return Err(invalid(
                format!("{}.min_age", field),
                format!("Must be non-negative, got {}", band.min_age),
            ));
        }
        match band.max_age {
            Some(max) => {
                check_finite(&format!("{}.max_age", field), max)?;
                if max < band.min_age {
                    return Err(invalid(
                        format!("{}.max_age", field),
                        format!("Must be >= min_age {}, got {}", band.min_age, max),
                    ));
                }
            }
            None if i != last => {
                return Err(invalid(
                    format!("{}.max_age", field),
                    "Only the final band may be open-ended",
                ));
            }
            None => {}
        }
        if let Some(prev) = previous_max {
            if band.min_age <= prev {
                return Err(ValidationError::SemanticError(format!(
                    "band '{}' starts at {} but the previous band ends at {}",
                    band.label, band.min_age, prev
                )));
            }
        }
        check_finite(&format!("{}.relative_weight", field), band.relative_weight)?;
        if band.relative_weight < 0.0 {
            return Err(invalid(
                format!("{}.relative_weight", field),
                format!("Must be non-negative, got {}", band.relative_weight),
            ));
        }
        previous_max = band.max_age;
    }

    let total = table.sampling_weight(min_patient_age);
    if total <= 0.0 || !total.is_finite() {
        return Err(ValidationError::SemanticError(format!(
            "age band weights at or above age {} must sum to a positive value, got {}",
            min_patient_age, total
        )));
    }

    Ok(())
}

/// Validate a severity table: every bucket 0..=20 present exactly once,
/// mortality percents within [0, 100].
pub fn validate_severity_table(table: &SeverityTable) -> ValidationResult<()> {
    check_version(&table.schema_version)?;

    let mut seen = [false; SEVERITY_CAP_BUCKET as usize + 1];
    for (i, row) in table.rows.iter().enumerate() {
        if row.bucket > SEVERITY_CAP_BUCKET {
            return Err(invalid(
                format!("rows[{}].bucket", i),
                format!("Must be at most {}, got {}", SEVERITY_CAP_BUCKET, row.bucket),
            ));
        }
        let slot = &mut seen[row.bucket as usize];
        if *slot {
            return Err(ValidationError::SemanticError(format!(
                "severity bucket {} appears more than once",
                row.bucket
            )));
        }
        *slot = true;

        let m = row.mortality_percent;
        if !m.is_finite() || !(0.0..=100.0).contains(&m) {
            return Err(invalid(
                format!("rows[{}].mortality_percent", i),
                format!("Must be in [0, 100], got {}", m),
            ));
        }
    }

    if let Some(missing) = seen.iter().position(|present| !present) {
        return Err(ValidationError::SemanticError(format!(
            "severity table has no row for bucket {}",
            missing
        )));
    }

    Ok(())
}

/// Validate the simulation constants.
pub fn validate_constants(constants: &SimulationConstants) -> ValidationResult<()> {
    let s = &constants.severity;
    for (name, value) in [
        ("severity.intercept", s.intercept),
        ("severity.age_slope", s.age_slope),
        ("severity.std_dev", s.std_dev),
        ("severity.major_offset", s.major_offset),
        ("severity.severe_offset", s.severe_offset),
        ("severity.clamp_min", s.clamp_min),
        ("severity.clamp_max", s.clamp_max),
    ] {
        check_finite(name, value)?;
    }
    if s.std_dev <= 0.0 {
        return Err(invalid(
            "severity.std_dev",
            format!("Must be positive, got {}", s.std_dev),
        ));
    }
    if s.clamp_min < 0.0 {
        return Err(invalid(
            "severity.clamp_min",
            format!("Must be non-negative, got {}", s.clamp_min),
        ));
    }
    if s.clamp_max < s.clamp_min {
        return Err(invalid(
            "severity.clamp_max",
            format!("Must be >= clamp_min {}, got {}", s.clamp_min, s.clamp_max),
        ));
    }

    let c = &constants.comorbidity;
    for (name, value) in [
        ("comorbidity.major_age_coef", c.major_age_coef),
        ("comorbidity.major_intercept", c.major_intercept),
        ("comorbidity.severe_age_coef", c.severe_age_coef),
        ("comorbidity.severe_intercept", c.severe_intercept),
    ] {
        check_finite(name, value)?;
    }

    let l = &constants.life_years;
    check_finite("life_years.max_life_span", l.max_life_span)?;
    if l.max_life_span <= 0.0 {
        return Err(invalid(
            "life_years.max_life_span",
            format!("Must be positive, got {}", l.max_life_span),
        ));
    }
    if !(0.0..=1.0).contains(&l.major_fraction) {
        return Err(invalid(
            "life_years.major_fraction",
            format!("Must be in [0, 1], got {}", l.major_fraction),
        ));
    }
    if !l.severe_life_years.is_finite() || l.severe_life_years < 0.0 {
        return Err(invalid(
            "life_years.severe_life_years",
            format!("Must be finite and non-negative, got {}", l.severe_life_years),
        ));
    }

    let k = &constants.cohort;
    check_finite("cohort.min_patient_age", k.min_patient_age)?;
    check_finite("cohort.oldest_age", k.oldest_age)?;
    if k.min_patient_age < 0.0 {
        return Err(invalid(
            "cohort.min_patient_age",
            format!("Must be non-negative, got {}", k.min_patient_age),
        ));
    }
    if k.oldest_age <= k.min_patient_age {
        return Err(invalid(
            "cohort.oldest_age",
            format!(
                "Must exceed min_patient_age {}, got {}",
                k.min_patient_age, k.oldest_age
            ),
        ));
    }

    Ok(())
}

/// Validate that the open-ended band's lower bound lies below `oldest_age`.
pub fn validate_open_band(table: &AgeTable, oldest_age: f64) -> ValidationResult<()> {
    if let Some(band) = table.bands.last() {
        if band.max_age.is_none() && band.min_age > oldest_age {
            return Err(ValidationError::SemanticError(format!(
                "open band '{}' starts at {} beyond oldest_age {}",
                band.label, band.min_age, oldest_age
            )));
        }
    }
    Ok(())
}

/// Validate a tier scheme: thresholds strictly increasing, ineligible tier
/// within range and never the first tier.
pub fn validate_tier_scheme(scheme: &TierScheme) -> ValidationResult<()> {
    if scheme.thresholds.is_empty() {
        return Err(invalid("tier.thresholds", "Must contain at least one threshold"));
    }
    if scheme.thresholds.windows(2).any(|w| w[0] >= w[1]) {
        return Err(invalid(
            "tier.thresholds",
            format!("Must be strictly increasing, got {:?}", scheme.thresholds),
        ));
    }
    if let Some(cutoff) = scheme.ineligible_from_tier {
        let tiers = scheme.thresholds.len() as u32 + 1;
        if cutoff == 0 || cutoff >= tiers {
            return Err(invalid(
                "tier.ineligible_from_tier",
                format!("Must be in [1, {}], got {}", tiers - 1, cutoff),
            ));
        }
    }
    Ok(())
}

/// Validate a scoring scheme: cutoffs strictly increasing, age cutoffs finite.
pub fn validate_scoring_scheme(scheme: &ScoringScheme) -> ValidationResult<()> {
    if scheme.severity_cutoffs.windows(2).any(|w| w[0] >= w[1]) {
        return Err(invalid(
            "scoring.severity_cutoffs",
            format!("Must be strictly increasing, got {:?}", scheme.severity_cutoffs),
        ));
    }
    if scheme.age_cutoffs.iter().any(|c| !c.is_finite()) {
        return Err(invalid("scoring.age_cutoffs", "Must be finite"));
    }
    if scheme.age_cutoffs.windows(2).any(|w| w[0] >= w[1]) {
        return Err(invalid(
            "scoring.age_cutoffs",
            format!("Must be strictly increasing, got {:?}", scheme.age_cutoffs),
        ));
    }
    Ok(())
}
