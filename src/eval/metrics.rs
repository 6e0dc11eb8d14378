//! Point-forecast error metrics.

use crate::domain::{Evaluation, Forecast, MetricPair, Observation, Split};
use crate::error::{AppError, Partition};

/// Mean absolute error; `None` when empty or misaligned.
pub fn mae(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    if actual.is_empty() || actual.len() != predicted.len() {
        return None;
    }
    let sum: f64 = actual.iter().zip(predicted).map(|(a, p)| (a - p).abs()).sum();
    Some(sum / actual.len() as f64)
}

/// Root mean squared error; `None` when empty or misaligned.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    if actual.is_empty() || actual.len() != predicted.len() {
        return None;
    }
    let sum: f64 = actual.iter().zip(predicted).map(|(a, p)| (a - p) * (a - p)).sum();
    Some((sum / actual.len() as f64).sqrt())
}

pub fn metric_pair(actual: &[f64], predicted: &[f64]) -> Option<MetricPair> {
    Some(MetricPair {
        n: actual.len(),
        mae: mae(actual, predicted)?,
        rmse: rmse(actual, predicted)?,
    })
}

/// MAE/RMSE of `forecast` against one partition's observations, matched by date.
pub fn evaluate_partition(
    forecast: &Forecast,
    observations: &[Observation],
    partition: Partition,
) -> Result<MetricPair, AppError> {
    if observations.is_empty() {
        return Err(AppError::EmptyPartition(partition));
    }

    let mut actual = Vec::with_capacity(observations.len());
    let mut predicted = Vec::with_capacity(observations.len());
    for obs in observations {
        let point = forecast.get(obs.date).ok_or_else(|| {
            AppError::data(format!("Forecast has no prediction for {} ({partition}).", obs.date))
        })?;
        actual.push(obs.price);
        predicted.push(point.yhat);
    }

    metric_pair(&actual, &predicted).ok_or(AppError::EmptyPartition(partition))
}

/// Metrics for both sides of the split.
pub fn evaluate(forecast: &Forecast, split: &Split) -> Result<Evaluation, AppError> {
    let train = evaluate_partition(forecast, split.partition(Partition::Train), Partition::Train)?;
    let test = evaluate_partition(forecast, split.partition(Partition::Test), Partition::Test)?;
    tracing::info!(
        train_mae = train.mae,
        train_rmse = train.rmse,
        test_mae = test.mae,
        test_rmse = test.rmse,
        "evaluation complete"
    );
    Ok(Evaluation { train, test })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ForecastPoint, Series};
    use chrono::NaiveDate;

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn forecast(dates: &[NaiveDate], yhat: &[f64]) -> Forecast {
        Forecast {
            points: dates
                .iter()
                .zip(yhat)
                .map(|(&date, &yhat)| ForecastPoint {
                    date,
                    yhat,
                    yhat_lower: None,
                    yhat_upper: None,
                    trend: yhat,
                    additive: 0.0,
                    multiplicative: 0.0,
                })
                .collect(),
            components: Default::default(),
        }
    }

    fn series(prices: &[f64]) -> Series {
        let obs = prices
            .iter()
            .enumerate()
            .map(|(i, &price)| Observation {
                date: d(2015, 1 + i as u32),
                price,
            })
            .collect();
        Series::new(obs).unwrap()
    }

    #[test]
    fn known_values() {
        let actual = [1.0, 2.0, 3.0, 4.0];
        let predicted = [1.5, 2.0, 2.0, 6.0];
        assert!((mae(&actual, &predicted).unwrap() - 0.875).abs() < 1e-12);
        // (0.25 + 0 + 1 + 4) / 4 = 1.3125
        assert!((rmse(&actual, &predicted).unwrap() - 1.3125_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn rmse_dominates_mae() {
        let cases: [(&[f64], &[f64]); 3] = [
            (&[0.0, 0.0, 0.0], &[1.0, -1.0, 1.0]),
            (&[1.0, 2.0, 3.0, 4.0, 5.0], &[1.1, 1.7, 3.9, 4.0, 2.0]),
            (&[2.5], &[2.5]),
        ];
        for (a, p) in cases {
            let pair = metric_pair(a, p).unwrap();
            assert!(pair.mae >= 0.0 && pair.rmse >= 0.0);
            assert!(pair.rmse + 1e-12 >= pair.mae);
        }
    }

    #[test]
    fn empty_or_misaligned_inputs_have_no_metric() {
        assert!(mae(&[], &[]).is_none());
        assert!(rmse(&[1.0], &[]).is_none());
        assert!(metric_pair(&[], &[]).is_none());
    }

    #[test]
    fn evaluate_matches_by_date() {
        let s = series(&[2.0, 2.2, 2.4, 2.6]);
        let split = Split::at(&s, d(2015, 3));
        let fc = forecast(&s.dates(), &[2.1, 2.2, 2.0, 2.6]);
        let ev = evaluate(&fc, &split).unwrap();
        assert_eq!(ev.train.n, 2);
        assert!((ev.train.mae - 0.05).abs() < 1e-12);
        assert_eq!(ev.test.n, 2);
        assert!((ev.test.mae - 0.2).abs() < 1e-12);
    }

    #[test]
    fn empty_train_partition_is_signaled() {
        let s = series(&[2.0, 2.2, 2.4]);
        let split = Split::at(&s, d(2010, 1));
        let fc = forecast(&s.dates(), &[2.0, 2.2, 2.4]);
        let err = evaluate(&fc, &split).unwrap_err();
        assert!(matches!(err, AppError::EmptyPartition(Partition::Train)));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn missing_forecast_date_is_data_error() {
        let s = series(&[2.0, 2.2, 2.4]);
        let fc = forecast(&s.dates()[..2], &[2.0, 2.2]);
        let err = evaluate_partition(&fc, s.observations(), Partition::Test).unwrap_err();
        assert!(matches!(err, AppError::Data(_)));
    }
}
