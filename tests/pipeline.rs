use chrono::NaiveDate;

use gas_forecast::app::pipeline::{
    RunConfig, forecast_from_model_file, gas_price_model, great_recession_window, run_pipeline, run_with_series,
    synthetic_series,
};
use gas_forecast::domain::{Split, TrainingFrame};
use gas_forecast::error::{AppError, Partition};
use gas_forecast::eval::{CvConfig, evaluate};
use gas_forecast::io::{ModelFile, write_model_json, write_series_csv};

fn d(y: i32, m: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, 1).unwrap()
}

fn quick_config(cross_validation: Option<CvConfig>) -> RunConfig {
    RunConfig {
        uncertainty_samples: 50,
        cross_validation,
        ..RunConfig::new(d(2016, 1), 42)
    }
}

#[test]
fn full_run_from_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prices.csv");
    let series = synthetic_series(d(1992, 1), d(2018, 1), 42).unwrap();
    write_series_csv(&path, &series).unwrap();

    let cv = CvConfig {
        initial_days: 3650,
        period_days: 1825,
        horizon_days: 365,
    };
    let run = run_pipeline(&path, &quick_config(Some(cv))).unwrap();

    assert_eq!(run.series.len(), 313);
    assert_eq!(run.split.train.len(), 288);
    assert_eq!(run.split.test.len(), 25);
    assert_eq!(run.forecast.len(), 313);

    for m in [&run.evaluation.train, &run.evaluation.test] {
        assert!(m.mae >= 0.0);
        assert!(m.rmse >= m.mae);
    }
    assert_eq!(run.evaluation.train.n, 288);
    assert_eq!(run.evaluation.test.n, 25);
    assert!(run.evaluation.train.mae < 0.5, "train MAE {}", run.evaluation.train.mae);

    for p in &run.forecast.points {
        let (lo, hi) = (p.yhat_lower.unwrap(), p.yhat_upper.unwrap());
        assert!(lo <= hi);
    }

    let summary = run.cv.expect("cross-validation enabled");
    assert!(summary.folds >= 1);
    assert!(!summary.points.is_empty());
    assert!(!summary.metrics.is_empty());
    for p in &summary.points {
        assert!(p.date > p.cutoff);
        assert!(p.horizon_days() <= cv.horizon_days);
    }
    assert!(summary.mean_mae >= 0.0);
    assert!(summary.mean_rmse >= summary.mean_mae - 1e-12);
}

#[test]
fn same_seed_same_outputs() {
    let series = synthetic_series(d(1995, 1), d(2017, 6), 3).unwrap();
    let a = run_with_series(series.clone(), &quick_config(None)).unwrap();
    let b = run_with_series(series, &quick_config(None)).unwrap();

    assert_eq!(a.evaluation, b.evaluation);
    let bounds = |run: &gas_forecast::app::pipeline::RunOutput| {
        run.forecast
            .points
            .iter()
            .map(|p| (p.yhat_lower, p.yhat_upper))
            .collect::<Vec<_>>()
    };
    assert_eq!(bounds(&a), bounds(&b));
}

#[test]
fn cross_validation_is_reproducible() {
    let series = synthetic_series(d(1995, 1), d(2017, 6), 11).unwrap();
    let cv = CvConfig {
        initial_days: 3650,
        period_days: 1825,
        horizon_days: 365,
    };
    let a = run_with_series(series.clone(), &quick_config(Some(cv))).unwrap();
    let b = run_with_series(series, &quick_config(Some(cv))).unwrap();

    let summary = a.cv.clone().expect("cross-validation enabled");
    assert!(summary.points.iter().all(|p| p.yhat_lower.is_some()));
    assert_eq!(a.cv, b.cv);
}

#[test]
fn cutoff_at_series_start_is_rejected() {
    let series = synthetic_series(d(2000, 1), d(2017, 12), 1).unwrap();
    let config = RunConfig {
        cutoff: d(2000, 1),
        ..quick_config(None)
    };
    let err = run_with_series(series, &config).unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn empty_test_partition_fails_evaluation() {
    let series = synthetic_series(d(2000, 1), d(2010, 12), 5).unwrap();
    let windows = vec![great_recession_window().unwrap()];
    let split = Split::at(&series, d(2011, 1));
    assert!(split.test.is_empty());

    let frame = TrainingFrame::from_observations(&split.train, &windows).unwrap();
    let fitted = gas_price_model(0).unwrap().fit(&frame).unwrap();
    let dates = series.dates();
    let covariates = gas_forecast::domain::Covariates::from_windows(&windows, &dates).unwrap();
    let forecast = fitted.predict(&dates, &covariates, 1).unwrap();

    let err = evaluate(&forecast, &split).unwrap_err();
    assert!(matches!(err, AppError::EmptyPartition(Partition::Test)));
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn saved_model_forecasts_past_history() {
    let series = synthetic_series(d(1998, 1), d(2017, 12), 9).unwrap();
    let run = run_with_series(series, &quick_config(None)).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    write_model_json(&path, &ModelFile::new(run.fitted.clone(), run.windows.clone())).unwrap();

    let future = forecast_from_model_file(&path, 6, 42).unwrap();
    assert_eq!(future.dates(), (1..=6).map(|m| d(2016, m)).collect::<Vec<_>>());
    for p in &future.points {
        let in_run = run.forecast.get(p.date).unwrap();
        assert!((p.yhat - in_run.yhat).abs() < 1e-9);
        assert!((p.trend - in_run.trend).abs() < 1e-9);
    }
}
