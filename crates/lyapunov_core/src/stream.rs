//! Decoding of transport payloads into sample batches.
//!
//! Three payload shapes reach the dashboard:
//! - `{"timestamp": 1.7e9, "samples": [{"x": 1.0, "y": 2.0, "z": 3.0}, ...]}`
//! - a bare list of channel maps, as relayed from the UDP device simulator
//! - `{"source": "10.0.0.2", "samples": [[u16, u16, u16], ...]}` from the
//!   binary forwarder, carrying raw ADC counts
//!
//! plus raw binary frames of little-endian interleaved `u16` triples.

use crate::error::{LabError, LabResult};
use crate::sample::Sample;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const RAW_CHANNELS: usize = 3;
pub const RAW_CHANNEL_NAMES: [&str; RAW_CHANNELS] = ["x", "y", "z"];
/// Physical range the raw 16-bit counts are mapped onto.
pub const RAW_MIN: f64 = -25.0;
pub const RAW_MAX: f64 = 25.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleBatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    pub samples: Vec<Sample>,
}

impl SampleBatch {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self {
            timestamp: None,
            samples,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Fills in missing `t` values as `base + i * dt`, where `base` is the
    /// batch timestamp when present and `fallback_base` otherwise.
    pub fn stamp_times(&mut self, fallback_base: f64, dt: f64) {
        let base = self.timestamp.unwrap_or(fallback_base);
        for (i, sample) in self.samples.iter_mut().enumerate() {
            if sample.t.is_none() {
                sample.t = Some(base + i as f64 * dt);
            }
        }
    }
}

/// Maps a raw 16-bit count onto `[RAW_MIN, RAW_MAX]`.
pub fn denormalize(raw: u16) -> f64 {
    raw as f64 / u16::MAX as f64 * (RAW_MAX - RAW_MIN) + RAW_MIN
}

pub fn decode_json_batch(payload: &str) -> LabResult<SampleBatch> {
    let value: Value = serde_json::from_str(payload)?;
    match value {
        Value::Array(rows) => Ok(SampleBatch::new(decode_rows(&rows)?)),
        Value::Object(map) => decode_envelope(&map),
        other => Err(LabError::MalformedBatch(format!(
            "expected an object or a list, got {}",
            json_kind(&other)
        ))),
    }
}

fn decode_envelope(map: &Map<String, Value>) -> LabResult<SampleBatch> {
    let rows = match map.get("samples") {
        Some(Value::Array(rows)) => rows,
        Some(other) => {
            return Err(LabError::MalformedBatch(format!(
                "`samples` must be a list, got {}",
                json_kind(other)
            )))
        }
        None => return Err(LabError::MalformedBatch("missing `samples`".into())),
    };
    let timestamp = match map.get("timestamp") {
        None | Some(Value::Null) => None,
        Some(value) => Some(value.as_f64().ok_or_else(|| {
            LabError::MalformedBatch("`timestamp` must be a number".into())
        })?),
    };
    Ok(SampleBatch {
        timestamp,
        samples: decode_rows(rows)?,
    })
}

fn decode_rows(rows: &[Value]) -> LabResult<Vec<Sample>> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| match row {
            Value::Object(channels) => decode_channel_map(channels),
            Value::Array(raw) => decode_raw_row(raw),
            other => Err(LabError::MalformedBatch(format!(
                "sample {i} is {}, expected an object or a list",
                json_kind(other)
            ))),
        })
        .collect()
}

fn decode_channel_map(channels: &Map<String, Value>) -> LabResult<Sample> {
    let mut sample = Sample::new();
    for (name, value) in channels {
        let number = value.as_f64().ok_or_else(|| {
            LabError::MalformedBatch(format!("channel `{name}` is not numeric"))
        })?;
        if name == "t" {
            sample.t = Some(number);
        } else {
            sample.insert(name, number);
        }
    }
    Ok(sample)
}

fn decode_raw_row(raw: &[Value]) -> LabResult<Sample> {
    if raw.len() != RAW_CHANNELS {
        return Err(LabError::MalformedBatch(format!(
            "raw sample has {} values, expected {RAW_CHANNELS}",
            raw.len()
        )));
    }
    let mut sample = Sample::new();
    for (name, value) in RAW_CHANNEL_NAMES.iter().zip(raw) {
        let count = value
            .as_u64()
            .and_then(|v| u16::try_from(v).ok())
            .ok_or_else(|| LabError::MalformedBatch(format!("raw value {value} is not a u16")))?;
        sample.insert(name, denormalize(count));
    }
    Ok(sample)
}

/// Decodes a frame of interleaved little-endian `u16` channel triples.
pub fn decode_binary_frame(bytes: &[u8]) -> LabResult<Vec<Sample>> {
    let stride = RAW_CHANNELS * 2;
    if bytes.len() % stride != 0 {
        return Err(LabError::FrameLength(bytes.len(), stride));
    }
    let samples = bytes
        .chunks_exact(stride)
        .map(|chunk| {
            let mut sample = Sample::new();
            for (c, name) in RAW_CHANNEL_NAMES.iter().enumerate() {
                let raw = u16::from_le_bytes([chunk[2 * c], chunk[2 * c + 1]]);
                sample.insert(name, denormalize(raw));
            }
            sample
        })
        .collect();
    Ok(samples)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
