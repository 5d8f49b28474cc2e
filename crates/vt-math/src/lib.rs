//! Ventilator triage math utilities.

pub mod math;

pub use math::categorical::normalize_weights;
pub use math::stable::*;
pub use math::summary::{quantile, DistributionSummary};
