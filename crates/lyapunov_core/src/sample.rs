//! Samples, trajectories and projection into 3D points.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A point in render space, projected from three channels of a [`Sample`].
pub type Point3 = Vector3<f64>;

/// Ordered, index-stable sequence of samples. Index `i` is the identity used
/// for hit-testing and playback seeking.
pub type Trajectory = Vec<Sample>;

/// One multichannel observation.
///
/// Serializes as a flat object (`{"x":1.0,"y":2.0,"z":3.0,"t":0.01}`), which
/// is the shape used by the stream, the recording store and the training
/// boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<f64>,
    #[serde(flatten)]
    pub channels: BTreeMap<String, f64>,
}

impl Sample {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_xyz(x: f64, y: f64, z: f64) -> Self {
        Self::new()
            .with_channel("x", x)
            .with_channel("y", y)
            .with_channel("z", z)
    }

    pub fn with_channel(mut self, name: &str, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn with_time(mut self, t: f64) -> Self {
        self.t = Some(t);
        self
    }

    pub fn insert(&mut self, name: &str, value: f64) {
        self.channels.insert(name.to_string(), value);
    }

    /// Value of a channel, `None` when absent. `"t"` resolves to the time value.
    pub fn lookup(&self, name: &str) -> Option<f64> {
        if name == "t" {
            return self.t.or_else(|| self.channels.get(name).copied());
        }
        self.channels.get(name).copied()
    }

    /// Value of a channel with the default-zero convention for absent keys.
    pub fn get(&self, name: &str) -> f64 {
        self.lookup(name).unwrap_or(0.0)
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }
}

/// Channel names mapped onto the three render axes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Axes {
    pub x_key: String,
    pub y_key: String,
    pub z_key: String,
}

impl Default for Axes {
    fn default() -> Self {
        Self::new("x", "y", "z")
    }
}

impl Axes {
    pub fn new(x_key: &str, y_key: &str, z_key: &str) -> Self {
        Self {
            x_key: x_key.to_string(),
            y_key: y_key.to_string(),
            z_key: z_key.to_string(),
        }
    }

    pub fn keys(&self) -> [&str; 3] {
        [&self.x_key, &self.y_key, &self.z_key]
    }

    pub fn project(&self, sample: &Sample) -> Point3 {
        self.project_masked(sample, [true; 3])
    }

    /// Projects a sample, zero-filling axes whose toggle is off.
    pub fn project_masked(&self, sample: &Sample, enabled: [bool; 3]) -> Point3 {
        let keys = self.keys();
        Point3::from_fn(|i, _| if enabled[i] { sample.get(keys[i]) } else { 0.0 })
    }

    pub fn project_all(&self, samples: &[Sample]) -> Vec<Point3> {
        samples.iter().map(|s| self.project(s)).collect()
    }
}

/// Arithmetic mean of one channel over a slice, `None` for an empty slice.
pub fn channel_mean(samples: &[Sample], channel: &str) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let sum: f64 = samples.iter().map(|s| s.get(channel)).sum();
    Some(sum / samples.len() as f64)
}

/// Flattens points into `[x0, y0, z0, x1, ...]` for typed-array transfer.
pub fn flatten_points(points: &[Point3]) -> Vec<f64> {
    let mut out = Vec::with_capacity(points.len() * 3);
    for p in points {
        out.extend_from_slice(&[p.x, p.y, p.z]);
    }
    out
}
