//! Training boundary types and the local linear baseline model.
//!
//! The remote trainer is opaque: it receives a [`TrainRequest`] and answers
//! with a [`TrainResponse`]. [`fit_linear_baseline`] produces a response of
//! the same shape locally by fitting `dX/dt = X·B`.

use crate::recording::Recording;
use crate::sample::{Axes, Point3, Sample, Trajectory};
use anyhow::{anyhow, bail, Result};
use nalgebra::{DMatrix, Matrix3};
use serde::{Deserialize, Serialize};

pub const MIN_TRAIN_SAMPLES: usize = 5;
/// Coefficients at or below this magnitude count as inactive.
pub const ACTIVE_THRESHOLD: f64 = 1e-8;
/// Candidate time channels, in order of preference.
pub const TIME_KEYS: [&str; 4] = ["t", "time", "timestamp", "T"];
/// Sampling interval assumed when neither a time channel nor a duration is usable.
pub const FALLBACK_DT: f64 = 0.01;

const STATE_NAMES: [&str; 3] = ["x", "y", "z"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainRequest {
    pub recording: Recording,
    #[serde(default)]
    pub axes: Axes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureInfo {
    pub name: String,
    pub coefficient: f64,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub mse: f64,
    pub r2: f64,
    pub sparsity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_features: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_features: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainResponse {
    pub run_id: String,
    pub metrics: Metrics,
    pub equations: Vec<String>,
    /// Predicted states as `{x, y, z, t}` samples aligned with the input.
    pub prediction: Trajectory,
    /// Per-equation coefficient table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<Vec<FeatureInfo>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionMetrics {
    pub mse: f64,
    pub r2: f64,
}

/// MSE and coefficient of determination over the common prefix of two
/// state sequences. R² is zero when the truth has (almost) no variance, and
/// both are zero for empty input.
pub fn prediction_metrics(truth: &[Point3], prediction: &[Point3]) -> PredictionMetrics {
    let n = truth.len().min(prediction.len());
    if n == 0 {
        return PredictionMetrics { mse: 0.0, r2: 0.0 };
    }
    let truth = &truth[..n];
    let prediction = &prediction[..n];

    let mean = truth.iter().fold(Point3::zeros(), |acc, p| acc + p) / n as f64;
    let ss_res: f64 = truth
        .iter()
        .zip(prediction)
        .map(|(a, b)| (a - b).norm_squared())
        .sum();
    let ss_tot: f64 = truth.iter().map(|p| (p - mean).norm_squared()).sum();

    let mse = ss_res / (3 * n) as f64;
    let r2 = if ss_tot > 1e-12 { 1.0 - ss_res / ss_tot } else { 0.0 };
    PredictionMetrics { mse, r2 }
}

/// Time stamps for a recording: the first candidate key present on every
/// sample and strictly increasing, otherwise a uniform grid spanning the
/// recorded duration.
pub fn time_base(recording: &Recording) -> Vec<f64> {
    let data = &recording.data;
    for key in TIME_KEYS {
        let values: Option<Vec<f64>> = data.iter().map(|s| s.lookup(key)).collect();
        if let Some(values) = values {
            if values.windows(2).all(|w| w[1] > w[0]) {
                return values;
            }
        }
    }

    let n = data.len();
    let dt = if recording.duration.is_finite() && recording.duration > 0.0 && n > 1 {
        recording.duration / (n - 1) as f64
    } else {
        FALLBACK_DT
    };
    (0..n).map(|i| i as f64 * dt).collect()
}

/// Second-order finite differences on a possibly non-uniform grid,
/// one-sided at both ends.
fn gradient(states: &[Point3], t: &[f64]) -> Vec<Point3> {
    let n = states.len();
    let mut out = Vec::with_capacity(n);
    out.push((states[1] - states[0]) / (t[1] - t[0]));
    for i in 1..n - 1 {
        let hs = t[i] - t[i - 1];
        let hd = t[i + 1] - t[i];
        let numerator =
            states[i + 1] * (hs * hs) + states[i] * (hd * hd - hs * hs) - states[i - 1] * (hd * hd);
        out.push(numerator / (hs * hd * (hd + hs)));
    }
    out.push((states[n - 1] - states[n - 2]) / (t[n - 1] - t[n - 2]));
    out
}

/// Minimum-norm least-squares `B` with `states · B ≈ derivatives`.
fn least_squares(states: &[Point3], derivatives: &[Point3]) -> Result<Matrix3<f64>> {
    let n = states.len();
    let x = DMatrix::from_fn(n, 3, |r, c| states[r][c]);
    let y = DMatrix::from_fn(n, 3, |r, c| derivatives[r][c]);
    let svd = x.svd(true, true);
    let eps = svd.singular_values.max() * f64::EPSILON * n as f64;
    let b = svd
        .solve(&y, eps)
        .map_err(|err| anyhow!("Least-squares solve failed: {err}"))?;
    Ok(Matrix3::from_fn(|r, c| b[(r, c)]))
}

fn format_equations(b: &Matrix3<f64>) -> Vec<String> {
    (0..3)
        .map(|j| {
            let terms: Vec<String> = (0..3)
                .map(|k| format!("{:+.6}*{}", b[(k, j)], STATE_NAMES[k]))
                .collect();
            format!("d{}/dt = {}", STATE_NAMES[j], terms.join(" "))
        })
        .collect()
}

fn feature_table(b: &Matrix3<f64>) -> Vec<Vec<FeatureInfo>> {
    (0..3)
        .map(|j| {
            (0..3)
                .map(|k| FeatureInfo {
                    name: STATE_NAMES[k].to_string(),
                    coefficient: b[(k, j)],
                    active: b[(k, j)].abs() > ACTIVE_THRESHOLD,
                })
                .collect()
        })
        .collect()
}

/// Fits a linear vector field to the projected recording and rolls it out
/// with forward Euler from the first state.
pub fn fit_linear_baseline(request: &TrainRequest) -> Result<TrainResponse> {
    let recording = &request.recording;
    let n = recording.data.len();
    if n < MIN_TRAIN_SAMPLES {
        bail!("Need at least {MIN_TRAIN_SAMPLES} samples to fit a model, got {n}.");
    }

    let states = request.axes.project_all(&recording.data);
    if states.iter().any(|p| !p.iter().all(|v| v.is_finite())) {
        bail!("Recording contains non-finite states.");
    }
    let t = time_base(recording);
    let derivatives = gradient(&states, &t);
    let b = least_squares(&states, &derivatives)?;

    let mut simulated = Vec::with_capacity(n);
    simulated.push(states[0]);
    for i in 1..n {
        let prev = simulated[i - 1];
        simulated.push(prev + b.tr_mul(&prev) * (t[i] - t[i - 1]));
    }

    let fit = prediction_metrics(&states, &simulated);
    let features = feature_table(&b);
    let total = features.iter().map(Vec::len).sum::<usize>();
    let active = features.iter().flatten().filter(|f| f.active).count();
    let sparsity = b.iter().filter(|c| c.abs() < ACTIVE_THRESHOLD).count() as f64 / 9.0;

    let prediction = simulated
        .iter()
        .zip(&t)
        .map(|(p, &time)| Sample::from_xyz(p.x, p.y, p.z).with_time(time))
        .collect();

    log::debug!(
        "linear baseline for `{}`: mse {:.3e}, r2 {:.4}",
        recording.id,
        fit.mse,
        fit.r2
    );

    Ok(TrainResponse {
        run_id: format!("linear_{}", recording.id),
        metrics: Metrics {
            mse: fit.mse,
            r2: fit.r2,
            sparsity,
            active_features: Some(active),
            total_features: Some(total),
        },
        equations: format_equations(&b),
        prediction,
        features: Some(features),
    })
}
