//! Piecewise-linear trend on the scaled time axis.
//!
//! The optimizer places changepoints and estimates the slope changes; this is
//! only the evaluation used when simulating future trend paths.

/// `g(t) = k t + m + Σ δ_j (t - s_j)+`
pub fn piecewise_linear(t: f64, k: f64, m: f64, deltas: &[f64], changepoints_t: &[f64]) -> f64 {
    let mut g = k * t + m;
    for (&d, &s) in deltas.iter().zip(changepoints_t.iter()) {
        g += d * (t - s).max(0.0);
    }
    g
}
