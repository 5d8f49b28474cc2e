//! Constants for the regional allocation schemes.
//!
//! - `TierScheme`: severity thresholds that split patients into priority tiers,
//!   optionally marking the worst tiers as ineligible.
//! - `ScoringScheme`: point scores from severity and comorbidity, with an
//!   age-point tiebreak.

use serde::{Deserialize, Serialize};

/// Tiered-lottery scheme.
///
/// A patient's tier is the number of thresholds at or below their severity
/// score, so thresholds `[7, 12]` give `<7 → 0`, `<12 → 1`, else `2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierScheme {
    pub thresholds: Vec<u32>,
    /// Tiers at or beyond this index never receive the resource.
    #[serde(default)]
    pub ineligible_from_tier: Option<u32>,
}

impl Default for TierScheme {
    fn default() -> Self {
        Self {
            thresholds: vec![7, 12],
            ineligible_from_tier: Some(2),
        }
    }
}

impl TierScheme {
    pub fn tier(&self, severity_score: u32) -> u32 {
        self.thresholds
            .iter()
            .take_while(|&&t| severity_score >= t)
            .count() as u32
    }

    pub fn is_eligible(&self, severity_score: u32) -> bool {
        match self.ineligible_from_tier {
            Some(cutoff) => self.tier(severity_score) < cutoff,
            None => true,
        }
    }
}

/// Points by comorbidity state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComorbidityPoints {
    pub none: u32,
    pub major: u32,
    pub severe: u32,
}

impl Default for ComorbidityPoints {
    fn default() -> Self {
        Self {
            none: 0,
            major: 2,
            severe: 4,
        }
    }
}

/// Scored-tiebreak scheme.
///
/// Severity points are `1 + #{cutoffs ≤ score}`, so the default cutoffs
/// `[6, 9, 12]` give `<6 → 1`, `<9 → 2`, `<12 → 3`, else `4`. Age points use
/// the same rule on `age_cutoffs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringScheme {
    pub severity_cutoffs: Vec<u32>,
    #[serde(default)]
    pub comorbidity_points: ComorbidityPoints,
    pub age_cutoffs: Vec<f64>,
}

impl Default for ScoringScheme {
    fn default() -> Self {
        Self {
            severity_cutoffs: vec![6, 9, 12],
            comorbidity_points: ComorbidityPoints::default(),
            age_cutoffs: vec![50.0, 70.0, 85.0],
        }
    }
}

impl ScoringScheme {
    pub fn severity_points(&self, severity_score: u32) -> u32 {
        1 + self
            .severity_cutoffs
            .iter()
            .take_while(|&&c| severity_score >= c)
            .count() as u32
    }

    pub fn age_points(&self, age: f64) -> u32 {
        1 + self.age_cutoffs.iter().take_while(|&&c| age >= c).count() as u32
    }
}
