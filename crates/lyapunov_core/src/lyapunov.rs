//! Windowed largest-Lyapunov-exponent proxy.
//!
//! The estimate is the mean of `ln|x[i+1] - x[i]|` over the interior of the
//! window. It is a local expansion-rate heuristic: there is no reference
//! trajectory and no renormalization, so it is only meaningful relative to
//! the regime thresholds in [`crate::regime`].

use crate::sample::Sample;
use std::collections::VecDeque;

/// Minimum window length before an estimate is attempted.
pub const MIN_SAMPLES: usize = 100;
/// Samples ignored at each end of the window.
pub const EDGE_MARGIN: usize = 10;
/// Consecutive differences at or below this are skipped.
pub const DELTA_FLOOR: f64 = 1e-10;

pub fn estimate_lyapunov(samples: &[Sample], channel: &str) -> Option<f64> {
    if samples.len() < MIN_SAMPLES {
        return None;
    }

    let mut sum = 0.0;
    let mut count = 0usize;
    for i in EDGE_MARGIN..samples.len() - EDGE_MARGIN {
        let delta = (samples[i + 1].get(channel) - samples[i].get(channel)).abs();
        if delta > DELTA_FLOOR {
            sum += delta.ln();
            count += 1;
        }
    }

    if count == 0 {
        return None;
    }
    Some(sum / count as f64)
}

/// Bounded history of determined estimates, oldest first.
#[derive(Debug, Clone)]
pub struct LyapunovHistory {
    values: VecDeque<f64>,
    capacity: usize,
}

impl LyapunovHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Records an estimate; undetermined or non-finite values are ignored.
    pub fn record(&mut self, estimate: Option<f64>) {
        let Some(value) = estimate.filter(|v| v.is_finite()) else {
            return;
        };
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn latest(&self) -> Option<f64> {
        self.values.back().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }
}
