//! Weight normalization for categorical splits.

/// Normalize non-negative weights into probabilities.
///
/// Returns None if the slice is empty, any weight is negative or non-finite,
/// or the weights do not sum to a positive value.
pub fn normalize_weights(weights: &[f64]) -> Option<Vec<f64>> {
    if weights.is_empty() {
        return None;
    }
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return None;
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return None;
    }
    Some(weights.iter().map(|w| w / total).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_sums_to_one() {
        let p = normalize_weights(&[1.0, 3.0]).expect("valid weights");
        assert_eq!(p, vec![0.25, 0.75]);
    }

    #[test]
    fn normalize_rejects_bad_weights() {
        assert!(normalize_weights(&[]).is_none());
        assert!(normalize_weights(&[0.0, 0.0]).is_none());
        assert!(normalize_weights(&[1.0, -0.5]).is_none());
        assert!(normalize_weights(&[1.0, f64::NAN]).is_none());
        assert!(normalize_weights(&[1.0, f64::INFINITY]).is_none());
    }
}
