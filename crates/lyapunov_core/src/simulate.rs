//! Lorenz system integration used for demo streams and parameter sweeps.

use crate::sample::{Sample, Trajectory};
use crate::solvers::RK4;
use crate::stream::SampleBatch;
use crate::traits::{BatchSource, DynamicalSystem, Steppable};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lorenz {
    pub sigma: f64,
    pub rho: f64,
    pub beta: f64,
}

impl Default for Lorenz {
    fn default() -> Self {
        Self {
            sigma: 10.0,
            rho: 28.0,
            beta: 8.0 / 3.0,
        }
    }
}

impl Lorenz {
    pub fn with_rho(self, rho: f64) -> Self {
        Self { rho, ..self }
    }

    /// Parameter map in the shape stored on a recording.
    pub fn parameters(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("sigma".to_string(), self.sigma),
            ("rho".to_string(), self.rho),
            ("beta".to_string(), self.beta),
        ])
    }
}

impl DynamicalSystem<f64> for Lorenz {
    fn dimension(&self) -> usize {
        3
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        out[0] = self.sigma * (x[1] - x[0]);
        out[1] = x[0] * (self.rho - x[2]) - x[1];
        out[2] = x[0] * x[1] - self.beta * x[2];
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfig {
    pub dt: f64,
    pub steps: usize,
    pub base_time: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: 0.01,
            steps: 5000,
            base_time: 0.0,
        }
    }
}

fn validate(initial: &[f64; 3], dt: f64) -> Result<()> {
    if dt <= 0.0 || !dt.is_finite() {
        bail!("Step size dt must be positive.");
    }
    if initial.iter().any(|v| !v.is_finite()) {
        bail!("Initial state must be finite.");
    }
    Ok(())
}

fn state_sample(state: &[f64; 3], t: f64) -> Sample {
    Sample::from_xyz(state[0], state[1], state[2]).with_time(t)
}

/// Integrates the Lorenz system with RK4 and returns `config.steps` samples,
/// the first being the initial state, with `t = base_time + i * dt`.
pub fn simulate_lorenz(
    system: Lorenz,
    initial: [f64; 3],
    config: SimulationConfig,
) -> Result<Trajectory> {
    validate(&initial, config.dt)?;
    if config.steps == 0 {
        bail!("Simulation requires at least one step.");
    }

    let mut solver = RK4::new(3);
    let mut state = initial;
    let mut t = 0.0;
    let mut trajectory = Vec::with_capacity(config.steps);
    for i in 0..config.steps {
        if i > 0 {
            solver.step(&system, &mut t, &mut state, config.dt);
        }
        trajectory.push(state_sample(&state, config.base_time + i as f64 * config.dt));
    }
    Ok(trajectory)
}

/// Endless (or bounded) stream of simulated batches, standing in for the
/// device when no hardware is attached.
pub struct SimulatedSource {
    system: Lorenz,
    solver: RK4<f64>,
    state: [f64; 3],
    t: f64,
    dt: f64,
    batch_size: usize,
    remaining: Option<usize>,
}

impl SimulatedSource {
    pub fn new(system: Lorenz, initial: [f64; 3], dt: f64, batch_size: usize) -> Result<Self> {
        validate(&initial, dt)?;
        if batch_size == 0 {
            bail!("Batch size must be at least one sample.");
        }
        Ok(Self {
            system,
            solver: RK4::new(3),
            state: initial,
            t: 0.0,
            dt,
            batch_size,
            remaining: None,
        })
    }

    /// Stops the source after `samples` samples in total.
    pub fn limited(mut self, samples: usize) -> Self {
        self.remaining = Some(samples);
        self
    }
}

impl BatchSource for SimulatedSource {
    fn next_batch(&mut self) -> Option<SampleBatch> {
        let count = match self.remaining {
            Some(0) => return None,
            Some(left) => left.min(self.batch_size),
            None => self.batch_size,
        };
        let mut samples = Vec::with_capacity(count);
        for _ in 0..count {
            self.solver.step(&self.system, &mut self.t, &mut self.state, self.dt);
            samples.push(state_sample(&self.state, self.t));
        }
        if let Some(left) = self.remaining.as_mut() {
            *left -= count;
        }
        Some(SampleBatch::new(samples))
    }
}

#[cfg(test)]
mod tests {
    use super::{simulate_lorenz, Lorenz, SimulatedSource, SimulationConfig};
    use crate::traits::BatchSource;

    #[test]
    fn rejects_invalid_configuration() {
        let bad_dt = SimulationConfig {
            dt: 0.0,
            ..SimulationConfig::default()
        };
        assert!(simulate_lorenz(Lorenz::default(), [1.0, 1.0, 1.0], bad_dt).is_err());
        let no_steps = SimulationConfig {
            steps: 0,
            ..SimulationConfig::default()
        };
        assert!(simulate_lorenz(Lorenz::default(), [1.0, 1.0, 1.0], no_steps).is_err());
        assert!(simulate_lorenz(
            Lorenz::default(),
            [f64::NAN, 0.0, 0.0],
            SimulationConfig::default()
        )
        .is_err());
    }

    #[test]
    fn trajectory_has_synthesized_times_and_stays_bounded() {
        let config = SimulationConfig {
            dt: 0.01,
            steps: 2000,
            base_time: 5.0,
        };
        let trajectory =
            simulate_lorenz(Lorenz::default(), [1.0, 1.0, 1.0], config).expect("simulate");
        assert_eq!(trajectory.len(), 2000);
        assert_eq!(trajectory[0].get("x"), 1.0);
        assert_eq!(trajectory[0].t, Some(5.0));
        assert!((trajectory[10].t.unwrap() - 5.1).abs() < 1e-12);
        for sample in &trajectory {
            assert!(sample.get("x").abs() < 30.0);
            assert!(sample.get("z") > -1.0 && sample.get("z") < 60.0);
        }
    }

    #[test]
    fn origin_is_a_fixed_point() {
        let config = SimulationConfig {
            steps: 50,
            ..SimulationConfig::default()
        };
        let trajectory =
            simulate_lorenz(Lorenz::default(), [0.0, 0.0, 0.0], config).expect("simulate");
        assert!(trajectory.iter().all(|s| s.get("x") == 0.0 && s.get("z") == 0.0));
    }

    #[test]
    fn limited_source_stops_after_budget() {
        let mut source = SimulatedSource::new(Lorenz::default(), [1.0, 1.0, 1.0], 0.01, 5)
            .expect("source")
            .limited(12);
        let sizes: Vec<usize> = std::iter::from_fn(|| source.next_batch())
            .map(|b| b.len())
            .collect();
        assert_eq!(sizes, vec![5, 5, 2]);
        assert!(SimulatedSource::new(Lorenz::default(), [1.0, 1.0, 1.0], 0.01, 0).is_err());
    }

    #[test]
    fn parameters_are_named() {
        let params = Lorenz::default().with_rho(14.0).parameters();
        assert_eq!(params["rho"], 14.0);
        assert_eq!(params["sigma"], 10.0);
    }
}
