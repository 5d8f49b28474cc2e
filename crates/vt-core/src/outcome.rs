//! Outcome aggregation: per-trial metrics and the cross-trial comparison
//! report.
//!
//! Every policy in a run is evaluated on the same cohorts, so per-trial
//! differences against a baseline policy are paired observations.

use crate::cohort::Cohort;
use crate::error::{Result, SimError};
use crate::policy::{Allocation, AllocationOutcome, Policy};
use crate::trial::TrialRun;
use serde::{Deserialize, Serialize};
use vt_math::DistributionSummary;

/// Metrics for one (cohort, policy) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    /// Granted patients whose latent outcome is survival.
    pub lives_saved: u32,
    /// Life-years of granted survivors over the cohort's total life-years.
    pub life_years_saved: f64,
    pub granted: u32,
}

/// Reduce one allocation to its trial metrics.
pub fn summarize(cohort: &Cohort, allocation: &Allocation) -> Result<TrialResult> {
    if allocation.outcomes.len() != cohort.len() {
        return Err(SimError::invalid(
            "allocation",
            format!(
                "{} outcomes for a cohort of {}",
                allocation.outcomes.len(),
                cohort.len()
            ),
        ));
    }

    let mut lives_saved = 0u32;
    let mut granted = 0u32;
    let mut years_saved = 0.0;
    for (patient, outcome) in cohort.iter().zip(&allocation.outcomes) {
        match outcome {
            AllocationOutcome::GrantedSurvived => {
                lives_saved += 1;
                granted += 1;
                years_saved += patient.life_years_remaining;
            }
            AllocationOutcome::GrantedDied => granted += 1,
            AllocationOutcome::Denied => {}
        }
    }

    let total = cohort.total_life_years();
    let life_years_saved = if total > 0.0 { years_saved / total } else { 0.0 };

    Ok(TrialResult {
        lives_saved,
        life_years_saved,
        granted,
    })
}

/// One policy's results across all trials, in trial order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyOutcomes {
    pub policy: Policy,
    pub results: Vec<TrialResult>,
}

impl PolicyOutcomes {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            results: Vec::new(),
        }
    }

    pub fn lives_saved(&self) -> Vec<u32> {
        self.results.iter().map(|r| r.lives_saved).collect()
    }

    pub fn life_years_saved(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.life_years_saved).collect()
    }
}

/// Paired per-trial differences `policy - baseline`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairedComparison {
    pub baseline: String,
    pub lives_saved_diff: Vec<i64>,
    pub life_years_saved_diff: Vec<f64>,
    pub lives_saved_diff_summary: Option<DistributionSummary>,
    pub life_years_saved_diff_summary: Option<DistributionSummary>,
    /// Fraction of trials where the policy saved strictly more lives.
    pub lives_saved_win_rate: f64,
    /// Fraction of trials where the policy saved strictly more life-years.
    pub life_years_saved_win_rate: f64,
}

impl PairedComparison {
    pub fn between(policy: &PolicyOutcomes, baseline: &PolicyOutcomes) -> Self {
        let lives_saved_diff: Vec<i64> = policy
            .results
            .iter()
            .zip(&baseline.results)
            .map(|(p, b)| i64::from(p.lives_saved) - i64::from(b.lives_saved))
            .collect();
        let life_years_saved_diff: Vec<f64> = policy
            .results
            .iter()
            .zip(&baseline.results)
            .map(|(p, b)| p.life_years_saved - b.life_years_saved)
            .collect();

        let lives_as_f64: Vec<f64> = lives_saved_diff.iter().map(|&d| d as f64).collect();
        Self {
            baseline: baseline.policy.label(),
            lives_saved_win_rate: win_rate(&lives_as_f64),
            life_years_saved_win_rate: win_rate(&life_years_saved_diff),
            lives_saved_diff_summary: DistributionSummary::from_samples(&lives_as_f64),
            life_years_saved_diff_summary: DistributionSummary::from_samples(
                &life_years_saved_diff,
            ),
            lives_saved_diff,
            life_years_saved_diff,
        }
    }
}

fn win_rate(diffs: &[f64]) -> f64 {
    if diffs.is_empty() {
        return 0.0;
    }
    diffs.iter().filter(|&&d| d > 0.0).count() as f64 / diffs.len() as f64
}

/// Per-policy section of the comparison report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyReport {
    pub policy: String,
    pub description: String,
    pub lives_saved: Vec<u32>,
    pub life_years_saved: Vec<f64>,
    pub lives_saved_summary: Option<DistributionSummary>,
    pub life_years_saved_summary: Option<DistributionSummary>,
    /// Absent for the baseline itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vs_baseline: Option<PairedComparison>,
}

/// Final artifact of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyComparisonReport {
    pub patients: usize,
    pub ventilators: usize,
    pub trials: usize,
    pub seed: u64,
    pub baseline: String,
    pub policies: Vec<PolicyReport>,
}

impl PolicyComparisonReport {
    /// Build the report. `baseline` defaults to the first policy of the run.
    pub fn from_run(run: &TrialRun, baseline: Option<&str>) -> Result<Self> {
        let base = match baseline {
            Some(name) => run.outcomes_for(name).ok_or_else(|| {
                SimError::invalid(
                    "baseline",
                    format!("policy '{}' is not part of this run", name),
                )
            })?,
            None => run
                .outcomes
                .first()
                .ok_or_else(|| SimError::invalid("policies", "run contains no policies"))?,
        };

        let policies = run
            .outcomes
            .iter()
            .map(|outcomes| {
                let lives_saved = outcomes.lives_saved();
                let life_years_saved = outcomes.life_years_saved();
                let vs_baseline = if outcomes.policy.label() == base.policy.label() {
                    None
                } else {
                    Some(PairedComparison::between(outcomes, base))
                };
                PolicyReport {
                    policy: outcomes.policy.label(),
                    description: outcomes.policy.description().to_string(),
                    lives_saved_summary: DistributionSummary::from_counts(&lives_saved),
                    life_years_saved_summary: DistributionSummary::from_samples(
                        &life_years_saved,
                    ),
                    lives_saved,
                    life_years_saved,
                    vs_baseline,
                }
            })
            .collect();

        Ok(Self {
            patients: run.patients,
            ventilators: run.ventilators,
            trials: run.trials,
            seed: run.seed,
            baseline: base.policy.label(),
            policies,
        })
    }

    pub fn policy(&self, name: &str) -> Option<&PolicyReport> {
        self.policies.iter().find(|p| p.policy == name)
    }
}
