//! Train/test partitioning by date cutoff.

use chrono::NaiveDate;

use crate::domain::{Observation, Series};
use crate::error::{AppError, Partition};

/// Two disjoint, date-contiguous halves of a series.
///
/// Every train date is `< cutoff`, every test date is `>= cutoff`.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub cutoff: NaiveDate,
    pub train: Vec<Observation>,
    pub test: Vec<Observation>,
}

impl Split {
    /// Partition without range checks; either side may end up empty.
    pub fn at(series: &Series, cutoff: NaiveDate) -> Self {
        let obs = series.observations();
        // Dates are strictly increasing, so the cutoff is a single boundary.
        let boundary = obs.partition_point(|o| o.date < cutoff);
        Self {
            cutoff,
            train: obs[..boundary].to_vec(),
            test: obs[boundary..].to_vec(),
        }
    }

    pub fn partition(&self, which: Partition) -> &[Observation] {
        match which {
            Partition::Train => &self.train,
            Partition::Test => &self.test,
        }
    }

    pub fn len(&self) -> usize {
        self.train.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split for model training: the cutoff must fall strictly inside the series
/// so that both partitions are non-empty.
pub fn split_train_test(series: &Series, cutoff: NaiveDate) -> Result<Split, AppError> {
    let (Some(first), Some(last)) = (series.first_date(), series.last_date()) else {
        return Err(AppError::config("Cannot split an empty series."));
    };
    if cutoff <= first || cutoff > last {
        return Err(AppError::config(format!(
            "Cutoff {cutoff} is outside the series range ({first}..={last}); one partition would be empty."
        )));
    }

    let split = Split::at(series, cutoff);
    tracing::info!(
        cutoff = %cutoff,
        train = split.train.len(),
        test = split.test.len(),
        "split series"
    );
    Ok(split)
}
