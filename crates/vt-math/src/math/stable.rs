//! Numerically stable primitives for log-domain probability math.
//!
//! The comorbidity model scores each state on the logit scale; these helpers
//! turn such scores into probabilities without overflowing for large ages or
//! coefficients.

/// Stable log(sum(exp(values))).
///
/// Returns NEG_INFINITY for empty input or all -inf inputs.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NEG_INFINITY;
    }
    if values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    if max == f64::INFINITY {
        return f64::INFINITY;
    }
    let sum: f64 = values.iter().map(|v| (*v - max).exp()).sum();
    max + sum.ln()
}

/// Softmax over logit scores.
///
/// Any NaN or +inf score poisons the whole vector with NaN so callers can
/// reject pathological coefficients instead of sampling from garbage.
/// Empty input yields an empty vector.
pub fn softmax(scores: &[f64]) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }
    let lse = log_sum_exp(scores);
    if !lse.is_finite() {
        return vec![f64::NAN; scores.len()];
    }
    scores.iter().map(|s| (s - lse).exp()).collect()
}
