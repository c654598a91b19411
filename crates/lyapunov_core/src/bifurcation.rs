//! Bifurcation diagram assembly from `(parameter, observable)` pairs.

use crate::error::{LabError, LabResult};
use crate::sample::Sample;
use crate::simulate::{simulate_lorenz, Lorenz, SimulationConfig};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Series shorter than this produce an empty diagram.
pub const MIN_BIFURCATION_SAMPLES: usize = 50;
/// Upper bound accepted for `numBins`.
pub const MAX_BINS: usize = 100_000;
/// Decimal places beyond this exceed `f64` resolution.
pub const MAX_PRECISION: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BifurcationSample {
    pub param: f64,
    pub observable: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BinningConfig {
    pub num_bins: usize,
    /// Decimal places kept when deduplicating observables within a bin.
    pub precision: u32,
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self {
            num_bins: 200,
            precision: 2,
        }
    }
}

impl BinningConfig {
    pub fn validate(&self) -> LabResult<()> {
        if self.num_bins == 0 || self.num_bins > MAX_BINS {
            return Err(LabError::Settings(format!(
                "numBins must be between 1 and {MAX_BINS}, got {}",
                self.num_bins
            )));
        }
        if self.precision > MAX_PRECISION {
            return Err(LabError::Settings(format!(
                "precision must be at most {MAX_PRECISION}, got {}",
                self.precision
            )));
        }
        Ok(())
    }
}

/// Rounds to `scale` steps, leaving the value as is when the scaled value
/// is not representable.
fn round_to(value: f64, scale: f64) -> f64 {
    let scaled = value * scale;
    if !scaled.is_finite() {
        return value;
    }
    let rounded = scaled.round() / scale;
    // `+ 0.0` folds -0.0 into 0.0 so both share a key.
    if rounded.is_finite() {
        rounded + 0.0
    } else {
        value
    }
}

/// Bins the series by parameter and emits one point per distinct rounded
/// observable per bin, placed at the bin center.
///
/// Samples with a non-finite parameter or observable are ignored. When all
/// parameters are equal each sample passes through unchanged. Only occupied
/// bins are materialized, so the bin count does not drive allocation.
pub fn bin_bifurcation(series: &[BifurcationSample], config: BinningConfig) -> Vec<ScatterPoint> {
    if series.len() < MIN_BIFURCATION_SAMPLES {
        return Vec::new();
    }
    let finite: Vec<BifurcationSample> = series
        .iter()
        .copied()
        .filter(|s| s.param.is_finite() && s.observable.is_finite())
        .collect();
    if finite.is_empty() {
        return Vec::new();
    }

    let (min, max) = finite.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
        (lo.min(s.param), hi.max(s.param))
    });
    let range = max - min;
    if range == 0.0 {
        return finite
            .iter()
            .map(|s| ScatterPoint {
                x: s.param,
                y: s.observable,
            })
            .collect();
    }

    let num_bins = config.num_bins.max(1);
    let width = range / num_bins as f64;
    let scale = 10f64.powi(config.precision.min(MAX_PRECISION) as i32);

    // Per occupied bin: rounded values in first-seen order plus their bit
    // patterns for dedup.
    let mut bins: BTreeMap<usize, (Vec<f64>, HashSet<u64>)> = BTreeMap::new();
    for s in &finite {
        let bin = (((s.param - min) / width).floor() as usize).min(num_bins - 1);
        let value = round_to(s.observable, scale);
        let (order, seen) = bins.entry(bin).or_default();
        if seen.insert(value.to_bits()) {
            order.push(value);
        }
    }

    let mut points = Vec::new();
    for (b, (order, _)) in &bins {
        let center = min + (*b as f64 + 0.5) * width;
        points.extend(order.iter().map(|&y| ScatterPoint { x: center, y }));
    }
    points
}

/// Pairs two channels of a recorded trajectory.
pub fn pairs_from_trajectory(
    trajectory: &[Sample],
    param_channel: &str,
    observable_channel: &str,
) -> Vec<BifurcationSample> {
    trajectory
        .iter()
        .map(|s| BifurcationSample {
            param: s.get(param_channel),
            observable: s.get(observable_channel),
        })
        .collect()
}

/// Strict interior local maxima of a scalar series.
pub fn local_maxima(values: &[f64]) -> Vec<f64> {
    values
        .windows(3)
        .filter(|w| w[1] > w[0] && w[1] > w[2])
        .map(|w| w[1])
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LorenzSweep {
    pub base: Lorenz,
    pub rho_min: f64,
    pub rho_max: f64,
    pub param_steps: usize,
    pub initial: [f64; 3],
    pub dt: f64,
    /// Integration steps discarded before maxima are collected.
    pub transient: usize,
    pub samples: usize,
}

impl Default for LorenzSweep {
    fn default() -> Self {
        Self {
            base: Lorenz::default(),
            rho_min: 20.0,
            rho_max: 200.0,
            param_steps: 180,
            initial: [1.0, 1.0, 1.0],
            dt: 0.01,
            transient: 2000,
            samples: 3000,
        }
    }
}

/// Sweeps `rho` and records the local maxima of `z` after the transient for
/// each parameter value, producing the input of [`bin_bifurcation`].
pub fn sweep_lorenz_maxima(sweep: &LorenzSweep) -> Result<Vec<BifurcationSample>> {
    if sweep.param_steps == 0 {
        bail!("Sweep requires at least one parameter value.");
    }
    if !sweep.rho_min.is_finite() || !sweep.rho_max.is_finite() || sweep.rho_max < sweep.rho_min {
        bail!("Sweep range must be finite with rho_max >= rho_min.");
    }
    if sweep.samples < 3 {
        bail!("Sweep needs at least three samples per parameter value.");
    }

    let span = sweep.rho_max - sweep.rho_min;
    let divisions = sweep.param_steps.saturating_sub(1).max(1) as f64;
    let config = SimulationConfig {
        dt: sweep.dt,
        steps: sweep.transient + sweep.samples,
        base_time: 0.0,
    };

    let mut series = Vec::new();
    for k in 0..sweep.param_steps {
        let rho = sweep.rho_min + span * k as f64 / divisions;
        let trajectory = simulate_lorenz(sweep.base.with_rho(rho), sweep.initial, config)?;
        let z: Vec<f64> = trajectory[sweep.transient..]
            .iter()
            .map(|s| s.get("z"))
            .collect();
        series.extend(local_maxima(&z).into_iter().map(|observable| BifurcationSample {
            param: rho,
            observable,
        }));
    }
    log::debug!(
        "lorenz sweep over rho [{}, {}] produced {} maxima",
        sweep.rho_min,
        sweep.rho_max,
        series.len()
    );
    Ok(series)
}
