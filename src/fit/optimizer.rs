//! Optimizers handed to the Prophet model.
//!
//! A fitted `augurs_prophet::Prophet` keeps its parameter estimates private, so
//! both optimizers here sit between the model and Stan:
//!
//! - `StanOptimizer` runs the Stan MAP fit (WebAssembly build) and records the
//!   estimate together with the changepoint times it was fitted against
//! - `ReplayOptimizer` hands a recorded estimate back, which rebuilds a fitted
//!   model from a saved file without optimizing again

use std::sync::{Arc, Mutex, OnceLock};

use augurs_prophet::optimizer::{self, Data, InitialParams, OptimizeOpts, OptimizedParams};
use augurs_prophet::wasmstan::WasmstanOptimizer;
use augurs_prophet::{Optimizer, PositiveFloat};
use serde::{Deserialize, Serialize};

/// Parameter estimates on the scaled axes (`y / y_scale`, `t` in `[0, 1]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapParams {
    /// Base growth rate.
    pub k: f64,
    /// Offset.
    pub m: f64,
    pub sigma_obs: f64,
    /// Slope change at each changepoint.
    pub delta: Vec<f64>,
    /// Seasonality and regressor coefficients.
    pub beta: Vec<f64>,
    /// Fitted trend over the history.
    pub trend: Vec<f64>,
}

impl From<&OptimizedParams> for MapParams {
    fn from(p: &OptimizedParams) -> Self {
        Self {
            k: p.k,
            m: p.m,
            sigma_obs: *p.sigma_obs,
            delta: p.delta.clone(),
            beta: p.beta.clone(),
            trend: p.trend.clone(),
        }
    }
}

impl MapParams {
    fn to_optimized(&self) -> Result<OptimizedParams, optimizer::Error> {
        let sigma_obs = PositiveFloat::try_new(self.sigma_obs)
            .map_err(|e| optimizer::Error::string(format!("sigma_obs: {e}")))?;
        Ok(OptimizedParams {
            k: self.k,
            m: self.m,
            sigma_obs,
            delta: self.delta.clone(),
            beta: self.beta.clone(),
            trend: self.trend.clone(),
        })
    }
}

/// One optimizer run: the estimate and the changepoints it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitRecord {
    pub params: MapParams,
    /// Changepoint times on the scaled axis, as given to the optimizer.
    pub changepoints_t: Vec<f64>,
}

impl FitRecord {
    /// Reject a record that was not estimated on data shaped like `data`.
    pub fn check_against(&self, data: &Data) -> Result<(), String> {
        let p = &self.params;
        let expect = [
            ("coefficients", usize::try_from(data.K).ok(), p.beta.len()),
            ("slope changes", usize::try_from(data.S).ok(), p.delta.len()),
            ("changepoints", usize::try_from(data.S).ok(), self.changepoints_t.len()),
            ("trend values", usize::try_from(data.T).ok(), p.trend.len()),
        ];
        for (what, want, got) in expect {
            if want != Some(got) {
                return Err(format!("model has {got} {what}, data needs {}", want.unwrap_or(0)));
            }
        }
        let moved = self
            .changepoints_t
            .iter()
            .zip(data.t_change.iter())
            .any(|(a, b)| (a - b).abs() > 1e-9);
        if moved {
            return Err("changepoint times differ from the training history".to_string());
        }
        Ok(())
    }
}

fn shared_wasmstan() -> &'static WasmstanOptimizer {
    static OPTIMIZER: OnceLock<WasmstanOptimizer> = OnceLock::new();
    OPTIMIZER.get_or_init(WasmstanOptimizer::new)
}

/// Stan MAP optimizer that remembers its last estimate.
///
/// Clones share the record, so keep one clone and hand the other to the model.
#[derive(Debug, Clone)]
pub struct StanOptimizer {
    inner: WasmstanOptimizer,
    record: Arc<Mutex<Option<FitRecord>>>,
}

impl Default for StanOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl StanOptimizer {
    pub fn new() -> Self {
        Self {
            inner: shared_wasmstan().clone(),
            record: Arc::default(),
        }
    }

    /// Estimate of the last successful run, if any.
    pub fn take_record(&self) -> Option<FitRecord> {
        self.record.lock().ok()?.take()
    }
}

impl Optimizer for StanOptimizer {
    fn optimize(
        &self,
        init: &InitialParams,
        data: &Data,
        opts: &OptimizeOpts,
    ) -> Result<OptimizedParams, optimizer::Error> {
        let params = self.inner.optimize(init, data, opts)?;
        let record = FitRecord {
            params: MapParams::from(&params),
            changepoints_t: data.t_change.clone(),
        };
        let mut slot = self
            .record
            .lock()
            .map_err(|_| optimizer::Error::static_str("fit record lock poisoned"))?;
        *slot = Some(record);
        Ok(params)
    }
}

/// Returns a recorded estimate instead of optimizing.
#[derive(Debug, Clone)]
pub struct ReplayOptimizer {
    record: FitRecord,
}

impl ReplayOptimizer {
    pub fn new(record: FitRecord) -> Self {
        Self { record }
    }
}

impl Optimizer for ReplayOptimizer {
    fn optimize(
        &self,
        _init: &InitialParams,
        data: &Data,
        _opts: &OptimizeOpts,
    ) -> Result<OptimizedParams, optimizer::Error> {
        self.record.check_against(data).map_err(optimizer::Error::string)?;
        self.record.params.to_optimized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use augurs_prophet::TrendIndicator;

    fn positive(v: f64) -> PositiveFloat {
        PositiveFloat::try_new(v).unwrap()
    }

    fn data(n: usize, k: usize, t_change: Vec<f64>) -> Data {
        Data {
            T: n as i32,
            y: vec![0.5; n],
            t: (0..n).map(|i| i as f64 / (n - 1) as f64).collect(),
            cap: vec![0.0; n],
            S: t_change.len() as i32,
            t_change,
            trend_indicator: TrendIndicator::Linear,
            K: k as i32,
            s_a: vec![1; k],
            s_m: vec![0; k],
            X: vec![0.0; n * k],
            sigmas: vec![positive(10.0); k],
            tau: positive(0.05),
        }
    }

    fn record(n: usize, k: usize, t_change: Vec<f64>) -> FitRecord {
        FitRecord {
            params: MapParams {
                k: 0.3,
                m: 0.4,
                sigma_obs: 0.02,
                delta: vec![0.0; t_change.len()],
                beta: vec![0.1; k],
                trend: vec![0.5; n],
            },
            changepoints_t: t_change,
        }
    }

    fn init(d: &Data) -> InitialParams {
        InitialParams {
            k: 0.0,
            m: 0.0,
            delta: vec![0.0; d.t_change.len()],
            beta: vec![0.0; d.K as usize],
            sigma_obs: positive(1.0),
        }
    }

    #[test]
    fn replay_returns_the_recorded_estimate() {
        let d = data(12, 6, vec![0.25, 0.5]);
        let replay = ReplayOptimizer::new(record(12, 6, vec![0.25, 0.5]));
        let p = replay.optimize(&init(&d), &d, &OptimizeOpts::default()).unwrap();
        assert_eq!(MapParams::from(&p), record(12, 6, vec![0.25, 0.5]).params);
    }

    #[test]
    fn replay_rejects_a_different_feature_count() {
        let d = data(12, 10, vec![0.25, 0.5]);
        let replay = ReplayOptimizer::new(record(12, 6, vec![0.25, 0.5]));
        let err = replay.optimize(&init(&d), &d, &OptimizeOpts::default()).unwrap_err();
        assert!(err.to_string().contains("coefficients"), "{err}");
    }

    #[test]
    fn replay_rejects_moved_changepoints() {
        let d = data(12, 6, vec![0.25, 0.5]);
        let replay = ReplayOptimizer::new(record(12, 6, vec![0.25, 0.75]));
        assert!(replay.optimize(&init(&d), &d, &OptimizeOpts::default()).is_err());

        let fewer = ReplayOptimizer::new(record(12, 6, vec![0.25]));
        assert!(fewer.optimize(&init(&d), &d, &OptimizeOpts::default()).is_err());
    }

    #[test]
    fn replay_rejects_non_positive_noise() {
        let d = data(12, 6, vec![0.5]);
        let mut rec = record(12, 6, vec![0.5]);
        rec.params.sigma_obs = 0.0;
        let replay = ReplayOptimizer::new(rec);
        assert!(replay.optimize(&init(&d), &d, &OptimizeOpts::default()).is_err());
    }
}
