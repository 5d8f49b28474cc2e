//! Ventilator Triage Core Library
//!
//! Monte Carlo comparison of scarce-resource allocation policies:
//! - Cohort generation from calibrated age and severity tables
//! - Allocation policies over a shared cohort
//! - Outcome aggregation and paired policy comparison
//! - Reproducible trial running, sequential or parallel
//!
//! The binary entry point is in `main.rs`.

pub mod cohort;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod outcome;
pub mod policy;
pub mod seed;
pub mod trial;

pub use cohort::{generate_cohort, Cohort, CohortGenerator, Comorbidity, Patient};
pub use error::{Result, SimError};
pub use outcome::{
    summarize, PairedComparison, PolicyComparisonReport, PolicyOutcomes, PolicyReport,
    TrialResult,
};
pub use policy::{Allocation, AllocationOutcome, Policy};
pub use trial::{run_trials, ExecutionMode, RunConfig, TrialEvaluation, TrialRun, TrialRunner};
