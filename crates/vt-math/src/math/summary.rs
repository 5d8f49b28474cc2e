//! Empirical distribution summaries for per-trial outcome sequences.
//!
//! Quantiles use linear interpolation between order statistics (the
//! "type 7" estimator), so the median of an even-length sample is the mean of
//! the two middle values.

use serde::{Deserialize, Serialize};

/// Summary statistics of a sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    /// Number of finite samples summarized.
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator); 0 for a single sample.
    pub std_dev: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl DistributionSummary {
    /// Summarize a sample, ignoring NaN values.
    ///
    /// Returns None if no finite values remain.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = samples.iter().copied().filter(|v| !v.is_nan()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let std_dev = if count > 1 {
            let ss: f64 = sorted.iter().map(|v| (v - mean) * (v - mean)).sum();
            (ss / (count - 1) as f64).sqrt()
        } else {
            0.0
        };

        Some(Self {
            count,
            mean,
            std_dev,
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[count - 1],
        })
    }

    /// Summarize integer counts (e.g. lives saved per trial).
    pub fn from_counts(counts: &[u32]) -> Option<Self> {
        let as_f64: Vec<f64> = counts.iter().map(|&c| f64::from(c)).collect();
        Self::from_samples(&as_f64)
    }
}

/// Quantile of an ascending-sorted sample by linear interpolation.
///
/// `p` is clamped to [0, 1]. Returns NaN for an empty slice or NaN `p`.
pub fn quantile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() || p.is_nan() {
        return f64::NAN;
    }
    let p = p.clamp(0.0, 1.0);
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}
