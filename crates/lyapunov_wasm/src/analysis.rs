//! Stateless analysis entry points.

use crate::payload::{from_js, from_js_or_default, parse_method, to_js, unflatten_points, ResampledPayload, ScatterPayload};
use lyapunov_core::bifurcation::{bin_bifurcation, sweep_lorenz_maxima, BinningConfig, LorenzSweep};
use lyapunov_core::regime::classify;
use lyapunov_core::resample::resample;
use lyapunov_core::simulate::{simulate_lorenz, Lorenz, SimulationConfig};
use lyapunov_core::training::{fit_linear_baseline, TrainRequest};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn simulate_lorenz_trajectory(
    system_val: JsValue,
    initial: Vec<f64>,
    config_val: JsValue,
) -> Result<JsValue, JsValue> {
    let system: Lorenz = from_js_or_default(system_val, "Lorenz parameters")?;
    let config: SimulationConfig = from_js_or_default(config_val, "simulation config")?;
    let initial: [f64; 3] = initial
        .as_slice()
        .try_into()
        .map_err(|_| JsValue::from_str("Initial state must have three components."))?;
    let trajectory = simulate_lorenz(system, initial, config)
        .map_err(|e| JsValue::from_str(&format!("Simulation failed: {}", e)))?;
    to_js(&trajectory)
}

#[wasm_bindgen]
pub fn lorenz_bifurcation(sweep_val: JsValue, binning_val: JsValue) -> Result<JsValue, JsValue> {
    let sweep: LorenzSweep = from_js_or_default(sweep_val, "bifurcation sweep")?;
    let binning: BinningConfig = from_js_or_default(binning_val, "binning config")?;
    binning
        .validate()
        .map_err(|e| JsValue::from_str(&format!("Invalid binning config: {}", e)))?;
    let series = sweep_lorenz_maxima(&sweep)
        .map_err(|e| JsValue::from_str(&format!("Bifurcation sweep failed: {}", e)))?;
    let points = bin_bifurcation(&series, binning);
    to_js(&ScatterPayload::from(points.as_slice()))
}

#[wasm_bindgen]
pub fn resample_points(points: &[f64], method: &str, segments_per_edge: usize) -> Result<JsValue, JsValue> {
    let method = parse_method(method).map_err(|e| JsValue::from_str(&e))?;
    let points = unflatten_points(points).map_err(|e| JsValue::from_str(&e))?;
    to_js(&ResampledPayload::from(resample(&points, method, segments_per_edge)))
}

#[wasm_bindgen]
pub fn classify_lyapunov(value: Option<f64>) -> Result<JsValue, JsValue> {
    to_js(&classify(value))
}

/// Local linear stand-in for the remote trainer; answers with the same
/// response shape.
#[wasm_bindgen]
pub fn train_linear_baseline(request_val: JsValue) -> Result<JsValue, JsValue> {
    let request: TrainRequest = from_js(request_val, "training request")?;
    let response = fit_linear_baseline(&request)
        .map_err(|e| JsValue::from_str(&format!("Baseline fit failed: {}", e)))?;
    to_js(&response)
}
