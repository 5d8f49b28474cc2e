//! Allocation policies.
//!
//! Every policy reduces to a total order over the cohort:
//! `(ineligible last, primary key, secondary key, lottery draw, index)`,
//! ascending. The first `K` eligible patients in that order receive the
//! resource. Lottery draws are supplied by the caller, one per patient, so
//! the same draws always reproduce the same allocation.

pub mod allocation;

pub use allocation::{Allocation, AllocationOutcome};

use crate::cohort::{Cohort, Comorbidity, Patient};
use crate::error::{Result, SimError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use tracing::trace;
use vt_config::validate::{validate_scoring_scheme, validate_tier_scheme};
use vt_config::{ScoringScheme, TierScheme};

/// A triage policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Policy {
    /// Highest severity score first.
    SickestFirst,
    /// Pure lottery.
    Lottery,
    /// Lowest age first.
    YoungestFirst,
    /// Lowest severity score first.
    MaximizeSurvival,
    /// Highest expected life-years first.
    MaximizeLifeYears,
    /// Severity tiers served best-first, lottery within a tier.
    TieredLottery {
        #[serde(default)]
        scheme: TierScheme,
    },
    /// Severity plus comorbidity points, age points as tiebreak.
    ScoredTiebreak {
        #[serde(default)]
        scheme: ScoringScheme,
    },
}

/// Sort key for one patient. Lower sorts first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorityKey {
    pub eligible: bool,
    pub primary: f64,
    pub secondary: f64,
}

impl PriorityKey {
    fn new(eligible: bool, primary: f64, secondary: f64) -> Self {
        Self {
            eligible,
            primary,
            secondary,
        }
    }

    fn cmp_with(&self, other: &PriorityKey) -> Ordering {
        other
            .eligible
            .cmp(&self.eligible)
            .then_with(|| self.primary.total_cmp(&other.primary))
            .then_with(|| self.secondary.total_cmp(&other.secondary))
    }
}

impl Policy {
    /// Default-parameterized instances of every policy.
    pub fn defaults() -> Vec<Policy> {
        vec![
            Policy::SickestFirst,
            Policy::Lottery,
            Policy::YoungestFirst,
            Policy::MaximizeSurvival,
            Policy::MaximizeLifeYears,
            Policy::TieredLottery {
                scheme: TierScheme::default(),
            },
            Policy::ScoredTiebreak {
                scheme: ScoringScheme::default(),
            },
        ]
    }

    /// Stable kebab-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Policy::SickestFirst => "sickest-first",
            Policy::Lottery => "lottery",
            Policy::YoungestFirst => "youngest-first",
            Policy::MaximizeSurvival => "maximize-survival",
            Policy::MaximizeLifeYears => "maximize-life-years",
            Policy::TieredLottery { .. } => "tiered-lottery",
            Policy::ScoredTiebreak { .. } => "scored-tiebreak",
        }
    }

    /// Identity within a run. Equals `name()` unless the scheme differs from
    /// its default, in which case the parameters are appended, e.g.
    /// `tiered-lottery[7,12;excl>=1]`. Lottery streams and report sections
    /// are keyed by this label.
    pub fn label(&self) -> String {
        match self {
            Policy::TieredLottery { scheme } if *scheme != TierScheme::default() => {
                let exclusion = scheme
                    .ineligible_from_tier
                    .map(|tier| format!(";excl>={}", tier))
                    .unwrap_or_default();
                format!("{}[{}{}]", self.name(), join(&scheme.thresholds), exclusion)
            }
            Policy::ScoredTiebreak { scheme } if *scheme != ScoringScheme::default() => {
                let points = &scheme.comorbidity_points;
                format!(
                    "{}[sev={};com={},{},{};age={}]",
                    self.name(),
                    join(&scheme.severity_cutoffs),
                    points.none,
                    points.major,
                    points.severe,
                    join(&scheme.age_cutoffs)
                )
            }
            _ => self.name().to_string(),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Policy::SickestFirst => "highest severity score first, lottery among ties",
            Policy::Lottery => "uniform random order",
            Policy::YoungestFirst => "lowest age first, lottery among ties",
            Policy::MaximizeSurvival => "lowest severity score first, lottery among ties",
            Policy::MaximizeLifeYears => {
                "highest survival probability x life-years remaining first, lottery among ties"
            }
            Policy::TieredLottery { .. } => {
                "severity tiers best-first, lottery within tier; worst tier ineligible"
            }
            Policy::ScoredTiebreak { .. } => {
                "severity + comorbidity points, lower first; age points then lottery break ties"
            }
        }
    }

    /// Reject malformed scheme parameters.
    pub fn validate(&self) -> Result<()> {
        match self {
            Policy::TieredLottery { scheme } => validate_tier_scheme(scheme)?,
            Policy::ScoredTiebreak { scheme } => validate_scoring_scheme(scheme)?,
            _ => {}
        }
        Ok(())
    }

    /// Whether the policy may ever grant this patient the resource.
    pub fn is_eligible(&self, patient: &Patient) -> bool {
        match self {
            Policy::TieredLottery { scheme } => scheme.is_eligible(patient.severity_score),
            _ => true,
        }
    }

    pub fn priority_key(&self, patient: &Patient) -> PriorityKey {
        let eligible = self.is_eligible(patient);
        let score = f64::from(patient.severity_score);
        let (primary, secondary) = match self {
            Policy::SickestFirst => (0.0 - score, 0.0),
            Policy::Lottery => (0.0, 0.0),
            Policy::YoungestFirst => (patient.age, 0.0),
            Policy::MaximizeSurvival => (score, 0.0),
            Policy::MaximizeLifeYears => (0.0 - patient.expected_life_years(), 0.0),
            Policy::TieredLottery { scheme } => {
                (f64::from(scheme.tier(patient.severity_score)), 0.0)
            }
            Policy::ScoredTiebreak { scheme } => {
                let points = scheme.severity_points(patient.severity_score)
                    + comorbidity_points(scheme, patient.comorbidity);
                (f64::from(points), f64::from(scheme.age_points(patient.age)))
            }
        };
        PriorityKey::new(eligible, primary, secondary)
    }

    /// Priority order over patient indices. Always a permutation of the
    /// cohort; ineligible patients trail.
    pub fn order(&self, cohort: &Cohort, lottery: &[f64]) -> Result<Vec<usize>> {
        check_lottery(cohort, lottery)?;
        let keys: Vec<PriorityKey> = cohort.iter().map(|p| self.priority_key(p)).collect();
        let mut order: Vec<usize> = (0..cohort.len()).collect();
        order.sort_by(|&a, &b| {
            keys[a]
                .cmp_with(&keys[b])
                .then_with(|| lottery[a].total_cmp(&lottery[b]))
                .then_with(|| a.cmp(&b))
        });
        Ok(order)
    }

    /// Grant up to `ventilators` eligible patients using explicit lottery
    /// draws. Budgets beyond the eligible count grant every eligible patient.
    pub fn allocate_with_lottery(
        &self,
        cohort: &Cohort,
        ventilators: usize,
        lottery: &[f64],
    ) -> Result<Allocation> {
        let order = self.order(cohort, lottery)?;
        let patients = cohort.patients();
        let mut outcomes = vec![AllocationOutcome::Denied; cohort.len()];
        let mut granted = 0usize;
        for &idx in &order {
            if granted == ventilators {
                break;
            }
            let patient = &patients[idx];
            if !self.is_eligible(patient) {
                break;
            }
            outcomes[idx] = AllocationOutcome::granted(patient.alive);
            granted += 1;
        }

        trace!(
            policy = self.name(),
            ventilators,
            granted,
            "allocation complete"
        );
        Ok(Allocation { order, outcomes })
    }

    /// Draw one fresh lottery value per patient from `rng`, then allocate.
    pub fn allocate<R: Rng + ?Sized>(
        &self,
        cohort: &Cohort,
        ventilators: usize,
        rng: &mut R,
    ) -> Result<Allocation> {
        let lottery = draw_lottery(cohort.len(), rng);
        self.allocate_with_lottery(cohort, ventilators, &lottery)
    }
}

/// One uniform draw in `[0, 1)` per patient.
pub fn draw_lottery<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<f64> {
    (0..n).map(|_| rng.random::<f64>()).collect()
}

fn join<T: fmt::Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn comorbidity_points(scheme: &ScoringScheme, state: Comorbidity) -> u32 {
    let points = &scheme.comorbidity_points;
    match state {
        Comorbidity::None => points.none,
        Comorbidity::Major => points.major,
        Comorbidity::Severe => points.severe,
    }
}

fn check_lottery(cohort: &Cohort, lottery: &[f64]) -> Result<()> {
    if lottery.len() != cohort.len() {
        return Err(SimError::invalid(
            "lottery",
            format!(
                "expected one draw per patient ({}), got {}",
                cohort.len(),
                lottery.len()
            ),
        ));
    }
    Ok(())
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Policy {
    type Err = String;

    /// Case-insensitive; underscores are accepted in place of hyphens.
    /// Schemes are parsed with their default parameters.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "sickest-first" | "sickest" => Ok(Policy::SickestFirst),
            "lottery" | "random" => Ok(Policy::Lottery),
            "youngest-first" | "youngest" => Ok(Policy::YoungestFirst),
            "maximize-survival" => Ok(Policy::MaximizeSurvival),
            "maximize-life-years" => Ok(Policy::MaximizeLifeYears),
            "tiered-lottery" | "scheme-a" => Ok(Policy::TieredLottery {
                scheme: TierScheme::default(),
            }),
            "scored-tiebreak" | "scheme-b" => Ok(Policy::ScoredTiebreak {
                scheme: ScoringScheme::default(),
            }),
            _ => Err(format!(
                "unknown policy '{}'; expected one of: {}",
                s,
                Policy::defaults()
                    .iter()
                    .map(Policy::name)
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}
