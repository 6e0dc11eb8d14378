//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::domain::{Evaluation, Forecast, MetricPair, Series, Split};
use crate::eval::{CvConfig, CvSummary};
use crate::models::{FittedModel, Growth, SeasonalityMode};

/// Dataset, split and fitted-model overview.
pub fn format_run_summary(series: &Series, split: &Split, fitted: &FittedModel) -> String {
    let mut out = String::new();

    out.push_str("=== gasfc - Monthly Gasoline Price Forecast ===\n");
    let (lo, hi) = series.price_range().unwrap_or((f64::NAN, f64::NAN));
    match (series.first_date(), series.last_date()) {
        (Some(first), Some(last)) => out.push_str(&format!(
            "Data: n={} | {first}..{last} | price=[{lo:.3}, {hi:.3}]\n",
            series.len()
        )),
        _ => out.push_str("Data: empty\n"),
    }
    out.push_str(&format!(
        "Split: cutoff={} | train={} | test={}\n",
        split.cutoff,
        split.train.len(),
        split.test.len()
    ));

    let cfg = &fitted.config;
    out.push_str("\nModel:\n");
    match cfg.growth {
        Growth::Linear => out.push_str(&format!(
            "- trend: linear, {} changepoints (range={:.2}, prior={:.3})\n",
            fitted.changepoints().len(),
            cfg.changepoint_range,
            cfg.changepoint_prior_scale
        )),
        Growth::Flat => out.push_str("- trend: flat\n"),
    }
    for s in &cfg.seasonalities {
        out.push_str(&component_row(
            &s.name,
            &format!("seasonality ({} terms)", 2 * s.fourier_order),
            cfg.seasonality_prior(s),
            s.mode,
        ));
    }
    for r in &cfg.regressors {
        out.push_str(&component_row(&r.name, "regressor", cfg.regressor_prior(r), r.mode));
    }

    let sigma = fitted
        .scaling()
        .map(|sc| fitted.params().sigma_obs * sc.y_scale)
        .unwrap_or(f64::NAN);
    out.push_str(&format!(
        "Fit: Stan MAP (augurs-prophet) | max_iterations={} | sigma_obs={sigma:.4}\n",
        cfg.max_iterations
    ));

    out
}

/// MAE/RMSE table for the train and test partitions.
pub fn format_evaluation(evaluation: &Evaluation) -> String {
    let mut out = String::new();
    out.push_str("Holdout metrics (in-sample fit on train, forecast on test):\n");
    out.push_str(&format!("{:<10} {:>6} {:>10} {:>10}\n", "partition", "n", "MAE", "RMSE"));
    out.push_str(&format!("{:-<10} {:-<6} {:-<10} {:-<10}\n", "", "", "", ""));
    out.push_str(&metric_row("train", &evaluation.train));
    out.push_str(&metric_row("test", &evaluation.test));
    out
}

fn metric_row(label: &str, m: &MetricPair) -> String {
    format!("{label:<10} {:>6} {:>10.4} {:>10.4}\n", m.n, m.mae, m.rmse)
}

/// Cross-validation summary: averaged metrics plus the per-horizon table.
pub fn format_cv_summary(summary: &CvSummary, cv: &CvConfig, max_rows: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Cross-validation (initial={}d, period={}d, horizon={}d): folds={} | predictions={}\n",
        cv.initial_days,
        cv.period_days,
        cv.horizon_days,
        summary.folds,
        summary.points.len()
    ));
    out.push_str(&format!("MAE mean for horizon:  {:.4}\n", summary.mean_mae));
    out.push_str(&format!("RMSE mean for horizon: {:.4}\n", summary.mean_rmse));

    if max_rows == 0 || summary.metrics.is_empty() {
        return out;
    }
    out.push('\n');
    out.push_str(&format!(
        "{:>8} {:>10} {:>10} {:>10} {:>10}\n",
        "horizon", "MAE", "RMSE", "MAPE", "coverage"
    ));
    out.push_str(&format!("{:->8} {:->10} {:->10} {:->10} {:->10}\n", "", "", "", "", ""));
    for m in summary.metrics.iter().take(max_rows) {
        out.push_str(&format!(
            "{:>7}d {:>10.4} {:>10.4} {:>10} {:>10}\n",
            m.horizon_days,
            m.mae,
            m.rmse,
            fmt_opt(m.mape),
            fmt_opt(m.coverage)
        ));
    }
    if summary.metrics.len() > max_rows {
        out.push_str(&format!("... {} more horizons\n", summary.metrics.len() - max_rows));
    }
    out
}

/// Point forecast with interval bounds, one row per date.
pub fn format_forecast_table(forecast: &Forecast) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<10} {:>10} {:>10} {:>10} {:>10}\n",
        "date", "yhat", "lower", "upper", "trend"
    ));
    out.push_str(&format!("{:-<10} {:->10} {:->10} {:->10} {:->10}\n", "", "", "", "", ""));
    for p in &forecast.points {
        out.push_str(&format!(
            "{:<10} {:>10.4} {:>10} {:>10} {:>10.4}\n",
            p.date.to_string(),
            p.yhat,
            fmt_opt(p.yhat_lower),
            fmt_opt(p.yhat_upper),
            p.trend
        ));
    }
    out
}

fn component_row(name: &str, kind: &str, prior_scale: f64, mode: SeasonalityMode) -> String {
    format!("- {name:<24} {kind:<22} prior={prior_scale:<8.3} {}\n", mode_label(mode))
}

fn mode_label(mode: SeasonalityMode) -> &'static str {
    match mode {
        SeasonalityMode::Additive => "additive",
        SeasonalityMode::Multiplicative => "multiplicative",
    }
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.4}")).unwrap_or_else(|| "-".to_string())
}
