//! Horizon-bucketed accuracy of cross-validation predictions.
//!
//! Points are sorted by horizon (days after their cutoff) and each metric is a
//! trailing mean over `w` points, where `w` is a fraction of all points. Points
//! that share a horizon are always aggregated together.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::eval::CvPoint;

/// Metrics for one horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonMetrics {
    pub horizon_days: i64,
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    /// Absent when some actual value is (near) zero.
    pub mape: Option<f64>,
    /// Share of actuals inside the interval; absent without intervals.
    pub coverage: Option<f64>,
}

/// Cross-validation result with per-horizon and averaged metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvSummary {
    pub folds: usize,
    pub points: Vec<CvPoint>,
    pub metrics: Vec<HorizonMetrics>,
    /// Mean of `metrics[..].mae`.
    pub mean_mae: f64,
    /// Mean of `metrics[..].rmse`.
    pub mean_rmse: f64,
}

/// Trailing mean of `x` over windows of `w` points, grouped by horizon.
///
/// `h` must be sorted ascending. Returns `(horizon, mean)` for every horizon
/// that has at least `w` points at or below it; the window is filled from the
/// current horizon backwards, taking a pro-rated share of the oldest bucket.
pub fn rolling_mean_by_h(x: &[f64], h: &[i64], w: usize) -> Vec<(i64, f64)> {
    let mut hs: Vec<i64> = Vec::new();
    let mut sums: Vec<f64> = Vec::new();
    let mut counts: Vec<usize> = Vec::new();
    for (&xi, &hi) in x.iter().zip(h.iter()) {
        if hs.last() == Some(&hi) {
            if let (Some(s), Some(c)) = (sums.last_mut(), counts.last_mut()) {
                *s += xi;
                *c += 1;
            }
        } else {
            hs.push(hi);
            sums.push(xi);
            counts.push(1);
        }
    }
    if w == 0 || hs.is_empty() {
        return Vec::new();
    }

    let buckets = hs.len();
    let mut res = vec![0.0; buckets];
    // Index of the newest bucket still waiting for a value; `buckets` = none.
    let mut trailing = buckets;
    let mut x_sum = 0.0;
    let mut n_sum = 0usize;
    for i in (0..buckets).rev() {
        x_sum += sums[i];
        n_sum += counts[i];
        while n_sum >= w && trailing > 0 {
            let t = trailing - 1;
            let excess_n = (n_sum - w) as f64;
            let excess_x = excess_n * sums[i] / counts[i] as f64;
            res[t] = (x_sum - excess_x) / w as f64;
            x_sum -= sums[t];
            n_sum -= counts[t];
            trailing = t;
        }
    }

    hs.into_iter()
        .zip(res)
        .skip(trailing)
        .collect()
}

/// Per-horizon metrics over cross-validation points.
pub fn performance_metrics(points: &[CvPoint], rolling_window: f64) -> Result<Vec<HorizonMetrics>, AppError> {
    if points.is_empty() {
        return Err(AppError::data("No cross-validation predictions to score."));
    }
    if !(rolling_window.is_finite() && rolling_window >= 0.0) {
        return Err(AppError::config(format!(
            "rolling_window must be >= 0, got {rolling_window}."
        )));
    }

    let mut sorted: Vec<&CvPoint> = points.iter().collect();
    sorted.sort_by_key(|p| p.horizon_days());
    let n = sorted.len();
    let w = ((rolling_window * n as f64) as usize).max(1).min(n);

    let h: Vec<i64> = sorted.iter().map(|p| p.horizon_days()).collect();
    let se: Vec<f64> = sorted.iter().map(|p| (p.y - p.yhat) * (p.y - p.yhat)).collect();
    let ae: Vec<f64> = sorted.iter().map(|p| (p.y - p.yhat).abs()).collect();

    let mse = rolling_mean_by_h(&se, &h, w);
    let mae = rolling_mean_by_h(&ae, &h, w);

    let mape = if sorted.iter().all(|p| p.y.abs() >= 1e-8) {
        let ape: Vec<f64> = sorted.iter().map(|p| ((p.y - p.yhat) / p.y).abs()).collect();
        Some(rolling_mean_by_h(&ape, &h, w))
    } else {
        tracing::warn!("skipping MAPE: some actual values are zero");
        None
    };

    let coverage = if sorted.iter().all(|p| p.yhat_lower.is_some() && p.yhat_upper.is_some()) {
        let inside: Vec<f64> = sorted
            .iter()
            .map(|p| match (p.yhat_lower, p.yhat_upper) {
                (Some(lo), Some(hi)) if lo <= p.y && p.y <= hi => 1.0,
                _ => 0.0,
            })
            .collect();
        Some(rolling_mean_by_h(&inside, &h, w))
    } else {
        None
    };

    let rows = mse
        .iter()
        .zip(mae.iter())
        .enumerate()
        .map(|(i, (&(horizon_days, mse), &(_, mae)))| HorizonMetrics {
            horizon_days,
            mse,
            rmse: mse.sqrt(),
            mae,
            mape: mape.as_ref().and_then(|m| m.get(i)).map(|&(_, v)| v),
            coverage: coverage.as_ref().and_then(|c| c.get(i)).map(|&(_, v)| v),
        })
        .collect();
    Ok(rows)
}

/// Score cross-validation output and average the per-horizon metrics.
pub fn summarize(points: Vec<CvPoint>, rolling_window: f64) -> Result<CvSummary, AppError> {
    let metrics = performance_metrics(&points, rolling_window)?;
    if metrics.is_empty() {
        return Err(AppError::data("Cross-validation produced no horizon metrics."));
    }
    let rows = metrics.len() as f64;
    let mean_mae = metrics.iter().map(|m| m.mae).sum::<f64>() / rows;
    let mean_rmse = metrics.iter().map(|m| m.rmse).sum::<f64>() / rows;

    let mut cutoffs: Vec<_> = points.iter().map(|p| p.cutoff).collect();
    cutoffs.dedup();

    tracing::info!(
        folds = cutoffs.len(),
        horizons = metrics.len(),
        mean_mae,
        mean_rmse,
        "cross-validation scored"
    );

    Ok(CvSummary {
        folds: cutoffs.len(),
        points,
        metrics,
        mean_mae,
        mean_rmse,
    })
}
