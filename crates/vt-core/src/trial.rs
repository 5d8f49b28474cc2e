//! Trial runner.
//!
//! Each trial draws one cohort and applies every policy in the run to that
//! same cohort. Trials are independent: trial `t` uses the cohort stream and
//! lottery streams derived from `(seed, t)`, so sequential and parallel
//! execution produce identical results in identical order.

use crate::cohort::{Cohort, CohortGenerator};
use crate::error::{Result, SimError};
use crate::outcome::{summarize, PolicyOutcomes, TrialResult};
use crate::policy::{Allocation, Policy};
use crate::seed::{cohort_rng, lottery_rng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::time::Instant;
use tracing::{debug, info};
use vt_config::{AgeTable, SeverityTable, SimulationConstants};

/// How trials are scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Sequential,
    /// Trials spread over the rayon thread pool.
    Parallel,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Sequential => write!(f, "sequential"),
            ExecutionMode::Parallel => write!(f, "parallel"),
        }
    }
}

/// Parameters of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Cohort size N.
    pub patients: usize,
    /// Resource budget K per trial.
    pub ventilators: usize,
    pub trials: usize,
    /// Root seed for every derived stream.
    pub seed: u64,
    pub policies: Vec<Policy>,
    #[serde(default)]
    pub execution: ExecutionMode,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            patients: 1000,
            ventilators: 500,
            trials: 100,
            seed: 0,
            policies: Policy::defaults(),
            execution: ExecutionMode::Sequential,
        }
    }
}

impl RunConfig {
    /// Set the budget from a scarcity ratio `K / N`, rounded to the nearest
    /// whole ventilator.
    pub fn with_scarcity(mut self, ratio: f64) -> Result<Self> {
        self.ventilators = ventilators_for_scarcity(self.patients, ratio)?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.patients == 0 {
            return Err(SimError::invalid("patients", "must be positive, got 0"));
        }
        if self.ventilators > self.patients {
            return Err(SimError::invalid(
                "ventilators",
                format!(
                    "must not exceed patients ({}), got {}",
                    self.patients, self.ventilators
                ),
            ));
        }
        if self.trials == 0 {
            return Err(SimError::invalid("trials", "must be positive, got 0"));
        }
        if self.policies.is_empty() {
            return Err(SimError::invalid("policies", "at least one policy is required"));
        }
        let mut seen = HashSet::new();
        for policy in &self.policies {
            if !seen.insert(policy.label()) {
                return Err(SimError::invalid(
                    "policies",
                    format!("policy '{}' listed more than once", policy.label()),
                ));
            }
            policy.validate()?;
        }
        Ok(())
    }
}

/// Budget for a scarcity ratio in `[0, 1]`.
pub fn ventilators_for_scarcity(patients: usize, ratio: f64) -> Result<usize> {
    if !(0.0..=1.0).contains(&ratio) {
        return Err(SimError::invalid(
            "scarcity",
            format!("must be in [0, 1], got {}", ratio),
        ));
    }
    Ok((patients as f64 * ratio).round() as usize)
}

/// Everything produced by one trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialEvaluation {
    pub trial: usize,
    pub cohort: Cohort,
    /// Aligned to the run's policy list.
    pub allocations: Vec<Allocation>,
    pub results: Vec<TrialResult>,
}

/// Raw per-trial results of a run, per policy in configuration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRun {
    pub patients: usize,
    pub ventilators: usize,
    pub trials: usize,
    pub seed: u64,
    pub outcomes: Vec<PolicyOutcomes>,
}

impl TrialRun {
    /// Results for the policy with this label (see [`Policy::label`]).
    pub fn outcomes_for(&self, label: &str) -> Option<&PolicyOutcomes> {
        self.outcomes.iter().find(|o| o.policy.label() == label)
    }
}

/// Runs trials for one validated configuration.
#[derive(Debug, Clone)]
pub struct TrialRunner<'a> {
    config: RunConfig,
    generator: CohortGenerator<'a>,
}

impl<'a> TrialRunner<'a> {
    /// Validate the run configuration and calibration inputs.
    pub fn new(
        config: RunConfig,
        age_table: &'a AgeTable,
        severity_table: &'a SeverityTable,
        constants: &'a SimulationConstants,
    ) -> Result<Self> {
        config.validate()?;
        let generator = CohortGenerator::new(age_table, severity_table, constants)?;
        Ok(Self { config, generator })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Generate trial `trial`'s cohort and evaluate every policy on it.
    pub fn evaluate_trial(&self, trial: usize) -> Result<TrialEvaluation> {
        let cfg = &self.config;
        let cohort = self
            .generator
            .generate(cfg.patients, &mut cohort_rng(cfg.seed, trial))?;

        let mut allocations = Vec::with_capacity(cfg.policies.len());
        let mut results = Vec::with_capacity(cfg.policies.len());
        for policy in &cfg.policies {
            let mut rng = lottery_rng(cfg.seed, &policy.label(), trial);
            let allocation = policy.allocate(&cohort, cfg.ventilators, &mut rng)?;
            results.push(summarize(&cohort, &allocation)?);
            allocations.push(allocation);
        }

        debug!(
            trial,
            survivors = cohort.survivors(),
            lives_saved = ?results.iter().map(|r| r.lives_saved).collect::<Vec<_>>(),
            "trial evaluated"
        );
        Ok(TrialEvaluation {
            trial,
            cohort,
            allocations,
            results,
        })
    }

    fn trial_results(&self, trial: usize) -> Result<Vec<TrialResult>> {
        self.evaluate_trial(trial).map(|evaluation| evaluation.results)
    }

    /// Run every trial and collect per-policy result sequences.
    pub fn run(&self) -> Result<TrialRun> {
        let cfg = &self.config;
        let start = Instant::now();
        info!(
            patients = cfg.patients,
            ventilators = cfg.ventilators,
            trials = cfg.trials,
            seed = cfg.seed,
            policies = cfg.policies.len(),
            execution = %cfg.execution,
            "run started"
        );

        let per_trial: Vec<Vec<TrialResult>> = match cfg.execution {
            ExecutionMode::Sequential => (0..cfg.trials)
                .map(|t| self.trial_results(t))
                .collect::<Result<_>>()?,
            ExecutionMode::Parallel => (0..cfg.trials)
                .into_par_iter()
                .map(|t| self.trial_results(t))
                .collect::<Result<_>>()?,
        };

        let mut outcomes: Vec<PolicyOutcomes> = cfg
            .policies
            .iter()
            .cloned()
            .map(PolicyOutcomes::new)
            .collect();
        for results in per_trial {
            for (policy_outcomes, result) in outcomes.iter_mut().zip(results) {
                policy_outcomes.results.push(result);
            }
        }

        info!(
            trials = cfg.trials,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "run finished"
        );
        Ok(TrialRun {
            patients: cfg.patients,
            ventilators: cfg.ventilators,
            trials: cfg.trials,
            seed: cfg.seed,
            outcomes,
        })
    }
}

/// Validate and run in one call.
pub fn run_trials(
    config: RunConfig,
    age_table: &AgeTable,
    severity_table: &SeverityTable,
    constants: &SimulationConstants,
) -> Result<TrialRun> {
    TrialRunner::new(config, age_table, severity_table, constants)?.run()
}
