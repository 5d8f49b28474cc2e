//! Cohort generation from calibration tables.
//!
//! Sampling stages, in order:
//! 1. One multinomial draw splits N across the sampling age bands.
//! 2. Ages are uniform within each band, bands in table order.
//! 3. Per patient: comorbidity state (multinomial logit on age), severity
//!    score (clamped normal around an age/comorbidity mean), then the
//!    latent outcome draw against the bucket's survival probability.
//!
//! The per-patient draw order is fixed, so a cohort is a pure function of
//! the tables, the constants, N and the generator state.

use super::{Cohort, Comorbidity, Patient};
use crate::error::{Result, SimError};
use rand::distr::weighted::WeightedIndex;
use rand::Rng;
use rand_distr::{Binomial, Distribution, Normal};
use tracing::trace;
use vt_config::validate::{
    validate_age_table, validate_constants, validate_open_band, validate_severity_table,
};
use vt_config::{AgeTable, SeverityTable, SimulationConstants, SEVERITY_CAP_BUCKET};
use vt_math::{normalize_weights, softmax};

/// Validated generator bound to one set of calibration inputs.
///
/// Construction runs every configuration check, so `generate` only fails on
/// a zero population or defective data that slipped past validation.
#[derive(Debug, Clone)]
pub struct CohortGenerator<'a> {
    age_table: &'a AgeTable,
    severity_table: &'a SeverityTable,
    constants: &'a SimulationConstants,
    /// `(band index, probability)` for bands with positive weight.
    band_probs: Vec<(usize, f64)>,
}

impl<'a> CohortGenerator<'a> {
    pub fn new(
        age_table: &'a AgeTable,
        severity_table: &'a SeverityTable,
        constants: &'a SimulationConstants,
    ) -> Result<Self> {
        validate_constants(constants)?;
        validate_age_table(age_table, constants.cohort.min_patient_age)?;
        validate_open_band(age_table, constants.cohort.oldest_age)?;
        validate_severity_table(severity_table)?;

        let candidates: Vec<usize> = age_table
            .sampling_band_indices(constants.cohort.min_patient_age)
            .into_iter()
            .filter(|&i| age_table.bands[i].relative_weight > 0.0)
            .collect();
        let weights: Vec<f64> = candidates
            .iter()
            .map(|&i| age_table.bands[i].relative_weight)
            .collect();
        let probs = normalize_weights(&weights).ok_or_else(|| {
            SimError::invalid(
                "age_table.relative_weight",
                "sampling band weights must sum to a positive value",
            )
        })?;
        let band_probs: Vec<(usize, f64)> = candidates.into_iter().zip(probs).collect();

        let generator = Self {
            age_table,
            severity_table,
            constants,
            band_probs,
        };
        generator.check_coefficients()?;
        Ok(generator)
    }

    /// Reject coefficient combinations that yield NaN probabilities or means
    /// anywhere in the sampled age range. All scores are linear in age, so
    /// checking both ends covers the interior.
    fn check_coefficients(&self) -> Result<()> {
        let oldest = self.constants.cohort.oldest_age;
        let (lo, hi) = self.band_probs.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(lo, hi), &(i, _)| {
                let band = &self.age_table.bands[i];
                (lo.min(band.min_age), hi.max(band.upper_bound(oldest)))
            },
        );
        for age in [lo, hi] {
            comorbidity_probs(self.constants, age)?;
            for state in Comorbidity::ALL {
                let mu = severity_mean(self.constants, age, state);
                if !mu.is_finite() {
                    return Err(SimError::invalid(
                        "severity",
                        format!("mean severity is not finite at age {} ({})", age, state),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Draw a cohort of exactly `n` patients.
    pub fn generate<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Cohort> {
        if n == 0 {
            return Err(SimError::invalid("patients", "must be positive, got 0"));
        }

        let counts = self.split_across_bands(n, rng)?;
        let oldest = self.constants.cohort.oldest_age;

        let mut patients = Vec::with_capacity(n);
        for (&(band_index, _), &count) in self.band_probs.iter().zip(counts.iter()) {
            let band = &self.age_table.bands[band_index];
            let (lo, hi) = (band.min_age, band.upper_bound(oldest));
            for _ in 0..count {
                let age = if hi > lo { rng.random_range(lo..=hi) } else { lo };
                patients.push(self.draw_patient(age, band_index, rng)?);
            }
        }

        let cohort = Cohort::from_patients(patients, self.age_table.bands.len());
        trace!(
            patients = cohort.len(),
            survivors = cohort.survivors(),
            band_counts = ?cohort.band_counts(),
            "cohort generated"
        );
        Ok(cohort)
    }

    /// Multinomial split of `n` by sequential conditional binomials; the
    /// last band takes the remainder so counts sum to `n` exactly.
    fn split_across_bands<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vec<usize>> {
        let mut counts = vec![0usize; self.band_probs.len()];
        let mut remaining = n as u64;
        let mut mass_left = 1.0;
        let last = self.band_probs.len() - 1;

        for (i, &(_, p)) in self.band_probs.iter().enumerate() {
            if remaining == 0 {
                break;
            }
            if i == last {
                counts[i] = remaining as usize;
                break;
            }
            let q = if mass_left > 0.0 {
                (p / mass_left).clamp(0.0, 1.0)
            } else {
                1.0
            };
            let binomial = Binomial::new(remaining, q).map_err(|e| {
                SimError::invalid("age_table.relative_weight", format!("binomial split: {}", e))
            })?;
            let drawn = binomial.sample(rng);
            counts[i] = drawn as usize;
            remaining -= drawn;
            mass_left -= p;
        }
        Ok(counts)
    }

    fn draw_patient<R: Rng + ?Sized>(
        &self,
        age: f64,
        age_band: usize,
        rng: &mut R,
    ) -> Result<Patient> {
        let probs = comorbidity_probs(self.constants, age)?;
        let states = WeightedIndex::new(probs).map_err(|e| {
            SimError::invalid("comorbidity", format!("state weights at age {}: {}", age, e))
        })?;
        let comorbidity = Comorbidity::ALL[states.sample(rng)];

        let model = &self.constants.severity;
        let mu = severity_mean(self.constants, age, comorbidity);
        let normal = Normal::new(mu, model.std_dev)
            .map_err(|e| SimError::invalid("severity", format!("normal({}, {}): {}", mu, model.std_dev, e)))?;
        let raw: f64 = normal.sample(rng);
        let severity_score = raw.clamp(model.clamp_min, model.clamp_max).floor() as u32;

        let survival_probability = survival_probability(self.severity_table, severity_score)?;
        let outcome_draw: f64 = rng.random();

        Ok(Patient {
            id: 0,
            age,
            age_band,
            comorbidity,
            severity_score,
            survival_probability,
            outcome_draw,
            alive: outcome_draw < survival_probability,
            life_years_remaining: life_years_remaining(self.constants, age, comorbidity),
        })
    }
}

/// Generate one cohort: validate inputs, then draw `n` patients.
pub fn generate_cohort<R: Rng + ?Sized>(
    age_table: &AgeTable,
    severity_table: &SeverityTable,
    constants: &SimulationConstants,
    n: usize,
    rng: &mut R,
) -> Result<Cohort> {
    CohortGenerator::new(age_table, severity_table, constants)?.generate(n, rng)
}

/// Comorbidity state probabilities `[none, major, severe]` at an age.
pub fn comorbidity_probs(constants: &SimulationConstants, age: f64) -> Result<[f64; 3]> {
    let p = softmax(&constants.comorbidity.logits(age));
    if p.iter().any(|v| v.is_nan() || *v < 0.0) {
        return Err(SimError::invalid(
            "comorbidity",
            format!("logit coefficients give invalid probabilities at age {}", age),
        ));
    }
    Ok([p[0], p[1], p[2]])
}

/// Mean severity score for an age and comorbidity state.
pub fn severity_mean(constants: &SimulationConstants, age: f64, state: Comorbidity) -> f64 {
    let model = &constants.severity;
    let offset = match state {
        Comorbidity::None => 0.0,
        Comorbidity::Major => model.major_offset,
        Comorbidity::Severe => model.severe_offset,
    };
    model.intercept + model.age_slope * age + offset
}

/// Survival probability for a score; scores past the cap share the ≥20 row.
pub fn survival_probability(table: &SeverityTable, severity_score: u32) -> Result<f64> {
    let bucket = severity_score.min(SEVERITY_CAP_BUCKET);
    table
        .survival_probability(bucket)
        .ok_or(SimError::LookupFailure { bucket })
}

/// Remaining life-years for an age and comorbidity state.
pub fn life_years_remaining(constants: &SimulationConstants, age: f64, state: Comorbidity) -> f64 {
    let model = &constants.life_years;
    let full = (model.max_life_span - age).max(0.0);
    match state {
        Comorbidity::None => full,
        Comorbidity::Major => model.major_fraction * full,
        Comorbidity::Severe => model.severe_life_years,
    }
}
