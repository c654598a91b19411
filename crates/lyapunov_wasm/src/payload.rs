//! Serializable shapes handed to JavaScript and the conversions feeding them.

use lyapunov_core::bifurcation::ScatterPoint;
use lyapunov_core::poincare::{CrossingDirection, SectionCrossing};
use lyapunov_core::resample::{ResampleMethod, Resampled};
use lyapunov_core::sample::{flatten_points, Axes, Point3};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, Serializer};
use wasm_bindgen::prelude::*;

/// Serializes into plain JSON-compatible values. Maps, including samples
/// with flattened channels, become objects rather than ES2015 `Map`s.
pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Deserializes an argument; `undefined` and `null` yield the default.
pub(crate) fn from_js_or_default<T: DeserializeOwned + Default>(
    value: JsValue,
    what: &str,
) -> Result<T, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    from_js(value, what)
}

pub(crate) fn from_js<T: DeserializeOwned>(value: JsValue, what: &str) -> Result<T, JsValue> {
    from_value(value).map_err(|e| JsValue::from_str(&format!("Invalid {}: {}", what, e)))
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResampledPayload {
    /// Flattened `[x0, y0, z0, x1, ...]`.
    pub points: Vec<f64>,
    pub index_map: Vec<usize>,
}

impl From<Resampled> for ResampledPayload {
    fn from(resampled: Resampled) -> Self {
        Self {
            points: flatten_points(&resampled.points),
            index_map: resampled.index_map,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct CrossingPayload {
    pub index: usize,
    pub direction: CrossingDirection,
    pub point: [f64; 3],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t: Option<f64>,
}

pub(crate) fn crossing_payloads(crossings: &[SectionCrossing], axes: &Axes) -> Vec<CrossingPayload> {
    crossings
        .iter()
        .map(|c| {
            let p = c.project(axes);
            CrossingPayload {
                index: c.index,
                direction: c.direction,
                point: [p.x, p.y, p.z],
                t: c.sample.t,
            }
        })
        .collect()
}

/// Column layout for scatter plotting.
#[derive(Debug, Default, Serialize, PartialEq)]
pub(crate) struct ScatterPayload {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
}

impl From<&[ScatterPoint]> for ScatterPayload {
    fn from(points: &[ScatterPoint]) -> Self {
        Self {
            xs: points.iter().map(|p| p.x).collect(),
            ys: points.iter().map(|p| p.y).collect(),
        }
    }
}

pub(crate) fn parse_method(name: &str) -> Result<ResampleMethod, String> {
    match name {
        "none" => Ok(ResampleMethod::None),
        "linear" => Ok(ResampleMethod::Linear),
        "spline" => Ok(ResampleMethod::Spline),
        other => Err(format!("Unknown resample method: {}", other)),
    }
}

pub(crate) fn unflatten_points(flat: &[f64]) -> Result<Vec<Point3>, String> {
    if flat.len() % 3 != 0 {
        return Err(format!(
            "Point buffer length {} is not a multiple of three.",
            flat.len()
        ));
    }
    Ok(flat
        .chunks_exact(3)
        .map(|c| Point3::new(c[0], c[1], c[2]))
        .collect())
}
