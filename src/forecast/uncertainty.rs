//! Prediction intervals by simulation.
//!
//! Each path keeps the fitted trend over the history and, beyond it, adds new
//! changepoints at the historical rate with Laplace-distributed slope changes
//! whose scale is the mean absolute fitted change. Gaussian observation noise
//! is added on top. Interval bounds are percentiles across paths.
//!
//! This is the Prophet sampling scheme, run here rather than in the backend
//! because the backend draws from an unseeded thread RNG. Every path gets its
//! own RNG seeded from `seed + path_index`, so output does not depend on how
//! rayon schedules the work.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, Poisson};
use rayon::prelude::*;

use crate::error::AppError;
use crate::fit::piecewise_linear;
use crate::forecast::Decomposition;
use crate::math::percentile_sorted;
use crate::models::{Growth, RestoredModel};

/// `(lower, upper)` bounds in price units, one per decomposed date.
pub fn predictive_intervals(
    model: &RestoredModel<'_>,
    decomposition: &Decomposition,
    seed: u64,
) -> Result<Vec<(f64, f64)>, AppError> {
    let fitted = model.fitted;
    let n_samples = fitted.config.uncertainty_samples;
    let n = decomposition.t.len();
    if n_samples == 0 || n == 0 {
        return Ok(Vec::new());
    }

    let y_scale = model.scaling.y_scale;
    let noise = Normal::new(0.0, fitted.params().sigma_obs * y_scale)
        .map_err(|e| AppError::fit(format!("Invalid observation noise: {e}")))?;

    let paths: Vec<Vec<f64>> = (0..n_samples)
        .into_par_iter()
        .map(|i| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
            sample_path(model, decomposition, &noise, &mut rng)
        })
        .collect::<Result<_, _>>()?;

    let width = fitted.config.interval_width;
    let lower_q = (1.0 - width) / 2.0 * 100.0;
    let upper_q = (1.0 + width) / 2.0 * 100.0;

    let mut out = Vec::with_capacity(n);
    let mut column = vec![0.0; n_samples];
    for j in 0..n {
        for (c, path) in column.iter_mut().zip(paths.iter()) {
            *c = path[j];
        }
        column.sort_by(f64::total_cmp);
        match (percentile_sorted(&column, lower_q), percentile_sorted(&column, upper_q)) {
            (Some(lo), Some(hi)) => out.push((lo, hi)),
            _ => return Err(AppError::fit("Could not compute interval percentiles.")),
        }
    }

    tracing::debug!(samples = n_samples, dates = n, "prediction intervals simulated");
    Ok(out)
}

/// One simulated path in price units.
fn sample_path<R: Rng>(
    model: &RestoredModel<'_>,
    decomposition: &Decomposition,
    noise: &Normal<f64>,
    rng: &mut R,
) -> Result<Vec<f64>, AppError> {
    let fitted = model.fitted;
    let params = fitted.params();
    let (changepoints, deltas) = match fitted.config.growth {
        Growth::Linear => future_changes(model, decomposition, rng)?,
        Growth::Flat => (Vec::new(), Vec::new()),
    };

    let y_scale = model.scaling.y_scale;
    let path = decomposition
        .t
        .iter()
        .enumerate()
        .map(|(j, &t)| {
            let g = match fitted.config.growth {
                Growth::Linear => piecewise_linear(t, params.k, params.m, &deltas, &changepoints),
                Growth::Flat => params.m,
            };
            let trend = g * y_scale;
            trend * (1.0 + decomposition.multiplicative[j]) + decomposition.additive[j] + noise.sample(&mut *rng)
        })
        .collect();
    Ok(path)
}

/// Historical changepoints plus simulated ones on `(1, t_max]`.
fn future_changes<R: Rng>(
    model: &RestoredModel<'_>,
    decomposition: &Decomposition,
    rng: &mut R,
) -> Result<(Vec<f64>, Vec<f64>), AppError> {
    let mut changepoints = model.fitted.fit.changepoints_t.clone();
    let mut deltas = model.fitted.params().delta.clone();

    let t_max = decomposition.t.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let rate = changepoints.len() as f64 * (t_max - 1.0);
    if t_max <= 1.0 || rate <= 0.0 {
        return Ok((changepoints, deltas));
    }

    let poisson = Poisson::new(rate).map_err(|e| AppError::fit(format!("Invalid changepoint rate: {e}")))?;
    let n_new = poisson.sample(rng) as usize;
    let scale = deltas.iter().map(|d| d.abs()).sum::<f64>() / deltas.len().max(1) as f64 + 1e-8;

    for _ in 0..n_new {
        changepoints.push(rng.gen_range(1.0..t_max));
        deltas.push(laplace(rng, scale));
    }
    Ok((changepoints, deltas))
}

/// Laplace(0, scale) by inverse CDF.
fn laplace<R: Rng>(rng: &mut R, scale: f64) -> f64 {
    let u: f64 = rng.gen_range(-0.5..0.5);
    -scale * u.signum() * (1.0 - 2.0 * u.abs()).max(f64::MIN_POSITIVE).ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Covariates, TrainingFrame};
    use crate::forecast::decompose;
    use crate::models::{FittedModel, ModelBuilder, SeasonalitySpec};
    use chrono::{Months, NaiveDate};

    fn month(i: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2001, 1, 1)
            .unwrap()
            .checked_add_months(Months::new(i as u32))
            .unwrap()
    }

    fn fitted(samples: usize) -> FittedModel {
        let dates: Vec<NaiveDate> = (0..72).map(month).collect();
        let y = (0..72)
            .map(|i| {
                let wiggle = ((i as f64 * 12.9898).sin() * 43758.5453).fract() - 0.5;
                1.0 + 0.015 * i as f64 + 0.15 * (i as f64 * 0.5236).sin() + 0.1 * wiggle
            })
            .collect();
        let frame = TrainingFrame::new(dates.clone(), y, Covariates::new(72)).unwrap();
        ModelBuilder::new()
            .add_seasonality(SeasonalitySpec::new("yearly", 365.25, 3))
            .uncertainty_samples(samples)
            .build()
            .unwrap()
            .fit(&frame)
            .unwrap()
    }

    #[test]
    fn intervals_bracket_point_forecast_and_widen() {
        let fitted = fitted(300);
        let restored = fitted.restore().unwrap();
        let dates: Vec<NaiveDate> = (0..96).map(month).collect();
        let cov = Covariates::new(dates.len());
        let dec = decompose(&restored, &dates, &cov).unwrap();
        let iv = predictive_intervals(&restored, &dec, 7).unwrap();
        assert_eq!(iv.len(), dates.len());

        for (i, (lo, hi)) in iv.iter().enumerate() {
            let yhat = dec.yhat(i);
            assert!(lo < hi);
            assert!(*lo < yhat + 0.05 && yhat - 0.05 < *hi, "row {i}: {lo} {yhat} {hi}");
        }
        let width_in = iv[10].1 - iv[10].0;
        let width_far = iv[95].1 - iv[95].0;
        assert!(width_far >= width_in);
    }

    #[test]
    fn same_seed_same_intervals() {
        let fitted = fitted(100);
        let restored = fitted.restore().unwrap();
        let dates: Vec<NaiveDate> = (60..84).map(month).collect();
        let cov = Covariates::new(dates.len());
        let dec = decompose(&restored, &dates, &cov).unwrap();
        let a = predictive_intervals(&restored, &dec, 42).unwrap();
        let b = predictive_intervals(&restored, &dec, 42).unwrap();
        let c = predictive_intervals(&restored, &dec, 43).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn laplace_draws_are_centered() {
        let mut rng = StdRng::seed_from_u64(1);
        let draws: Vec<f64> = (0..20_000).map(|_| laplace(&mut rng, 0.5)).collect();
        let mean = draws.iter().sum::<f64>() / draws.len() as f64;
        let mean_abs = draws.iter().map(|d| d.abs()).sum::<f64>() / draws.len() as f64;
        assert!(mean.abs() < 0.02);
        // E|X| = scale for a Laplace distribution.
        assert!((mean_abs - 0.5).abs() < 0.02);
    }
}
