//! Poincaré section extraction from a sampled trajectory.

use crate::sample::{Axes, Point3, Sample};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossingDirection {
    Positive,
    Negative,
    #[default]
    Both,
}

impl CrossingDirection {
    fn accepts(self, crossing: CrossingDirection) -> bool {
        self == CrossingDirection::Both || self == crossing
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SectionConfig {
    /// Channel whose value defines the section plane.
    pub channel: String,
    pub value: f64,
    pub direction: CrossingDirection,
    /// Leading samples that never produce a crossing.
    pub transient: usize,
}

impl Default for SectionConfig {
    fn default() -> Self {
        Self {
            channel: "z".to_string(),
            value: 27.0,
            direction: CrossingDirection::Both,
            transient: 0,
        }
    }
}

/// A trajectory sample at which the section plane was crossed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionCrossing {
    /// Index into the source trajectory.
    pub index: usize,
    pub direction: CrossingDirection,
    pub sample: Sample,
}

impl SectionCrossing {
    pub fn project(&self, axes: &Axes) -> Point3 {
        axes.project(&self.sample)
    }
}

/// Scans consecutive samples for sign changes of `channel - value`.
///
/// A crossing is either an upward move with `last < value <= current` or a
/// downward move with `last > value >= current`. Its direction is positive
/// when `current >= value`, so a downward move landing exactly on the plane
/// reports positive. The previous value is tracked through the transient
/// prefix so the first sample after it can already register a crossing.
pub fn extract_section(trajectory: &[Sample], config: &SectionConfig) -> Vec<SectionCrossing> {
    let Some(first) = trajectory.first() else {
        return Vec::new();
    };
    let v = config.value;
    let mut last = first.get(&config.channel);
    let mut crossings = Vec::new();

    for (index, sample) in trajectory.iter().enumerate().skip(1) {
        let current = sample.get(&config.channel);
        let crossed = (last < v && current >= v) || (last > v && current <= v);
        let crossing = crossed.then(|| {
            if current >= v {
                CrossingDirection::Positive
            } else {
                CrossingDirection::Negative
            }
        });
        last = current;

        if index < config.transient {
            continue;
        }
        if let Some(direction) = crossing.filter(|&d| config.direction.accepts(d)) {
            crossings.push(SectionCrossing {
                index,
                direction,
                sample: sample.clone(),
            });
        }
    }
    crossings
}
