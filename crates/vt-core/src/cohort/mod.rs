//! Synthetic patient cohorts.
//!
//! A `Cohort` is one trial's population. Every field of a `Patient`,
//! including the latent survival outcome, is fixed when the cohort is
//! generated; allocation policies only read it.

pub mod generator;

pub use generator::{generate_cohort, CohortGenerator};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Chronic-illness burden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comorbidity {
    None,
    Major,
    Severe,
}

impl Comorbidity {
    /// States in logit order: the reference category first.
    pub const ALL: [Comorbidity; 3] = [Comorbidity::None, Comorbidity::Major, Comorbidity::Severe];

    pub fn as_str(&self) -> &'static str {
        match self {
            Comorbidity::None => "none",
            Comorbidity::Major => "major",
            Comorbidity::Severe => "severe",
        }
    }
}

impl fmt::Display for Comorbidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One simulated patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    /// Position in the cohort.
    pub id: usize,
    pub age: f64,
    /// Index of the age band the patient was drawn from.
    pub age_band: usize,
    pub comorbidity: Comorbidity,
    /// Integer severity score after clamping.
    pub severity_score: u32,
    pub survival_probability: f64,
    /// Uniform draw behind `alive`.
    pub outcome_draw: f64,
    /// Latent outcome: survives if given the resource.
    pub alive: bool,
    pub life_years_remaining: f64,
}

impl Patient {
    /// Expected life-years gained if granted the resource.
    pub fn expected_life_years(&self) -> f64 {
        self.survival_probability * self.life_years_remaining
    }
}

/// One trial's patient population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cohort {
    patients: Vec<Patient>,
    /// Patients drawn per age band, aligned to the age table.
    band_counts: Vec<usize>,
}

impl Cohort {
    /// Assemble a cohort from patients, reassigning ids to their positions.
    ///
    /// Band counts are recomputed from each patient's `age_band`.
    pub fn from_patients(mut patients: Vec<Patient>, num_bands: usize) -> Self {
        let mut band_counts = vec![0; num_bands];
        for (i, patient) in patients.iter_mut().enumerate() {
            patient.id = i;
            if let Some(count) = band_counts.get_mut(patient.age_band) {
                *count += 1;
            }
        }
        Self {
            patients,
            band_counts,
        }
    }

    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    pub fn band_counts(&self) -> &[usize] {
        &self.band_counts
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Patient> {
        self.patients.iter()
    }

    /// Total potential life-years across the whole cohort.
    pub fn total_life_years(&self) -> f64 {
        self.patients.iter().map(|p| p.life_years_remaining).sum()
    }

    /// Number of patients whose latent outcome is survival.
    pub fn survivors(&self) -> usize {
        self.patients.iter().filter(|p| p.alive).count()
    }
}

impl<'a> IntoIterator for &'a Cohort {
    type Item = &'a Patient;
    type IntoIter = std::slice::Iter<'a, Patient>;

    fn into_iter(self) -> Self::IntoIter {
        self.patients.iter()
    }
}
