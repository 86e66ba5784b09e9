//! Allocation helpers (stable softmax, categorical sampling).
//!
//! These turn a score vector into a probability distribution, and a
//! distribution plus one uniform draw into an index.

use rand::Rng;

/// Compute a stable softmax distribution over `values`.
///
/// - `temperature` controls sharpness. Callers are expected to pass a finite
///   value > 0; anything else is treated as `1.0`.
/// - Uses the max-trick: `exp((v - max) / temperature)`, so large scores never
///   overflow and tiny temperatures never collapse the whole vector to zero.
/// - Returns a distribution that sums to 1 (or empty if `values` is empty).
pub fn softmax(values: &[f64], temperature: f64) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let t = if temperature.is_finite() && temperature > 0.0 {
        temperature
    } else {
        1.0
    };

    let max_value = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut out: Vec<f64> = Vec::with_capacity(values.len());
    let mut denom = 0.0;
    for &v in values {
        let x = ((v - max_value) / t).exp();
        denom += x;
        out.push(x);
    }
    if denom <= 0.0 || !denom.is_finite() {
        // Degenerate underflow: uniform.
        let n = values.len() as f64;
        return vec![1.0 / n; values.len()];
    }

    for p in &mut out {
        *p /= denom;
    }
    out
}

/// Sample an index from `probs` by inverse CDF.
///
/// Draws `r` uniformly from `[0, 1)` and returns the first index whose
/// cumulative probability is `>= r`. If rounding leaves the CDF short of `r`,
/// returns the last index. Returns `None` only if `probs` is empty.
pub fn sample_index<R: Rng + ?Sized>(rng: &mut R, probs: &[f64]) -> Option<usize> {
    if probs.is_empty() {
        return None;
    }
    let r: f64 = rng.random();
    let mut cdf = 0.0;
    for (i, &p) in probs.iter().enumerate() {
        cdf += p;
        if r <= cdf {
            return Some(i);
        }
    }
    // Numerical fallback.
    Some(probs.len() - 1)
}
