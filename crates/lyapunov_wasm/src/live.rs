//! Live buffer and playback wrappers.

use crate::logging::ensure_initialized;
use crate::payload::{crossing_payloads, from_js, from_js_or_default, to_js, ResampledPayload, ScatterPayload};
use js_sys::Float64Array;
use lyapunov_core::live::LiveBuffer;
use lyapunov_core::playback::PlaybackSource;
use lyapunov_core::recording::Recording;
use lyapunov_core::sample::{flatten_points, Axes};
use lyapunov_core::settings::AnalysisSettings;
use lyapunov_core::traits::BatchSource;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmLiveBuffer {
    inner: LiveBuffer,
}

fn parse_settings(settings_val: JsValue) -> Result<AnalysisSettings, JsValue> {
    let settings: AnalysisSettings = from_js_or_default(settings_val, "analysis settings")?;
    settings
        .validate()
        .map_err(|e| JsValue::from_str(&format!("Invalid analysis settings: {}", e)))?;
    Ok(settings)
}

#[wasm_bindgen]
impl WasmLiveBuffer {
    #[wasm_bindgen(constructor)]
    pub fn new(settings_val: JsValue) -> Result<WasmLiveBuffer, JsValue> {
        ensure_initialized();
        let settings = parse_settings(settings_val)?;
        Ok(WasmLiveBuffer {
            inner: LiveBuffer::new(settings, Axes::default()),
        })
    }

    pub fn set_settings(&mut self, settings_val: JsValue) -> Result<(), JsValue> {
        let settings = parse_settings(settings_val)?;
        self.inner.set_settings(settings);
        Ok(())
    }

    pub fn set_axes(&mut self, x_key: &str, y_key: &str, z_key: &str) {
        self.inner.set_axes(Axes::new(x_key, y_key, z_key));
    }

    /// Returns the number of samples appended; malformed payloads append none.
    pub fn ingest_json(&mut self, payload: &str) -> usize {
        self.inner.ingest_json(payload)
    }

    pub fn ingest_binary(&mut self, frame: &[u8]) -> usize {
        self.inner.ingest_binary(frame)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn generation(&self) -> f64 {
        self.inner.generation() as f64
    }

    /// Normalized render window as `[x0, y0, z0, x1, ...]`.
    pub fn render_points(&self, x_on: bool, y_on: bool, z_on: bool) -> Float64Array {
        let points = self.inner.normalized_window_masked([x_on, y_on, z_on]);
        Float64Array::from(flatten_points(&points).as_slice())
    }

    pub fn resampled_points(&self, x_on: bool, y_on: bool, z_on: bool) -> Result<JsValue, JsValue> {
        let payload = ResampledPayload::from(self.inner.resampled_window([x_on, y_on, z_on]));
        to_js(&payload)
    }

    pub fn analyze(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.analyze())
    }

    pub fn lyapunov_history(&self) -> Float64Array {
        Float64Array::from(self.inner.history().to_vec().as_slice())
    }

    pub fn set_baseline(&mut self) -> bool {
        self.inner.set_baseline()
    }

    pub fn clear_baseline(&mut self) {
        self.inner.clear_baseline();
    }

    pub fn poincare_section(&self) -> Result<JsValue, JsValue> {
        to_js(&crossing_payloads(&self.inner.section(), self.inner.axes()))
    }

    pub fn bifurcation(&self, param_channel: &str, observable_channel: &str) -> Result<JsValue, JsValue> {
        let points = self.inner.bifurcation(param_channel, observable_channel);
        to_js(&ScatterPayload::from(points.as_slice()))
    }

    pub fn start_capture(&mut self) {
        self.inner.start_capture();
    }

    pub fn is_capturing(&self) -> bool {
        self.inner.is_capturing()
    }

    /// The captured recording, or `null` when no capture was running.
    pub fn finish_capture(&mut self, id: String, name: String, timestamp: f64) -> Result<JsValue, JsValue> {
        to_js(&self.inner.finish_capture(id, name, timestamp))
    }

    /// Replaces the buffer contents with a whole recording.
    pub fn load_recording(&mut self, recording_val: JsValue) -> Result<usize, JsValue> {
        let recording: Recording = from_js(recording_val, "recording")?;
        self.inner.reset();
        Ok(self.inner.drain(&mut PlaybackSource::from_recording(&recording)))
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }
}

/// Incremental replay of a recording into a live buffer.
#[wasm_bindgen]
pub struct WasmPlayback {
    source: PlaybackSource,
}

#[wasm_bindgen]
impl WasmPlayback {
    #[wasm_bindgen(constructor)]
    pub fn new(recording_val: JsValue, chunk: usize) -> Result<WasmPlayback, JsValue> {
        ensure_initialized();
        let recording: Recording = from_js(recording_val, "recording")?;
        Ok(WasmPlayback {
            source: PlaybackSource::new(recording.data, chunk),
        })
    }

    pub fn seek(&mut self, index: usize) {
        self.source.seek(index);
    }

    pub fn position(&self) -> usize {
        self.source.position()
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_finished(&self) -> bool {
        self.source.is_finished()
    }

    /// Feeds the next chunk into `buffer`; returns how many samples moved.
    pub fn advance(&mut self, buffer: &mut WasmLiveBuffer) -> usize {
        match self.source.next_batch() {
            Some(batch) => buffer.inner.ingest(batch),
            None => 0,
        }
    }
}
