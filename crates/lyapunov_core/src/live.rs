//! Live sample buffer and the analytics derived from it.
//!
//! `LiveBuffer` is the single state object the dashboard feeds: the
//! transport (or a playback/simulation source) hands it batches, and the
//! renderer and analysis panels read windows and snapshots back out of it.

use crate::anomaly::anomaly_score;
use crate::bifurcation::{bin_bifurcation, pairs_from_trajectory, ScatterPoint};
use crate::lyapunov::{estimate_lyapunov, LyapunovHistory};
use crate::poincare::{extract_section, SectionCrossing};
use crate::recording::Recording;
use crate::regime::{classify, detect_regime_change, RegimeClassification};
use crate::resample::{resample, Resampled};
use crate::sample::{Axes, Point3, Sample, Trajectory};
use crate::settings::AnalysisSettings;
use crate::stream::{decode_binary_frame, decode_json_batch, SampleBatch};
use crate::traits::BatchSource;
use serde::Serialize;

/// Running per-axis minimum and maximum over everything observed since the
/// last reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtremaTracker {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Default for ExtremaTracker {
    fn default() -> Self {
        Self {
            min: [f64::INFINITY; 3],
            max: [f64::NEG_INFINITY; 3],
        }
    }
}

impl ExtremaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Widens the bounds; non-finite components are ignored.
    pub fn observe(&mut self, point: &Point3) {
        for i in 0..3 {
            let v = point[i];
            if v.is_finite() {
                self.min[i] = self.min[i].min(v);
                self.max[i] = self.max[i].max(v);
            }
        }
    }

    /// `(v - min) / (max - min)`, or 0.5 when the axis has no extent.
    pub fn normalize_component(&self, value: f64, axis: usize) -> f64 {
        let range = self.max[axis] - self.min[axis];
        if !range.is_finite() || range <= 0.0 || !value.is_finite() {
            return 0.5;
        }
        (value - self.min[axis]) / range
    }

    pub fn normalize(&self, point: &Point3, factor: f64) -> Point3 {
        Point3::from_fn(|i, _| self.normalize_component(point[i], i) * factor)
    }
}

/// Derived analytics for the current buffer contents.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSnapshot {
    /// Incremented by every reset; snapshots from older generations are stale.
    pub generation: u64,
    pub sample_count: usize,
    pub lyapunov: Option<f64>,
    pub classification: RegimeClassification,
    pub regime_changed: bool,
    pub anomaly_score: f64,
}

pub struct LiveBuffer {
    settings: AnalysisSettings,
    axes: Axes,
    trajectory: Trajectory,
    extrema: ExtremaTracker,
    history: LyapunovHistory,
    estimate: Option<f64>,
    baseline: Option<Trajectory>,
    capture_start: Option<usize>,
    generation: u64,
}

impl Default for LiveBuffer {
    fn default() -> Self {
        Self::new(AnalysisSettings::default(), Axes::default())
    }
}

impl LiveBuffer {
    pub fn new(settings: AnalysisSettings, axes: Axes) -> Self {
        let history = LyapunovHistory::new(settings.history_capacity);
        Self {
            settings,
            axes,
            trajectory: Vec::new(),
            extrema: ExtremaTracker::new(),
            history,
            estimate: None,
            baseline: None,
            capture_start: None,
            generation: 0,
        }
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Replaces the settings, keeping buffered data and recomputing the estimate.
    pub fn set_settings(&mut self, settings: AnalysisSettings) {
        let mut history = LyapunovHistory::new(settings.history_capacity);
        for value in self.history.to_vec() {
            history.record(Some(value));
        }
        self.history = history;
        self.settings = settings;
        self.estimate = estimate_lyapunov(self.render_window(), &self.settings.lyapunov_channel);
    }

    pub fn axes(&self) -> &Axes {
        &self.axes
    }

    /// Switches the projected channels and rebuilds the extrema from the
    /// full trajectory.
    pub fn set_axes(&mut self, axes: Axes) {
        self.axes = axes;
        self.extrema.reset();
        for sample in &self.trajectory {
            self.extrema.observe(&self.axes.project(sample));
        }
    }

    pub fn trajectory(&self) -> &[Sample] {
        &self.trajectory
    }

    pub fn len(&self) -> usize {
        self.trajectory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectory.is_empty()
    }

    pub fn extrema(&self) -> &ExtremaTracker {
        &self.extrema
    }

    pub fn history(&self) -> &LyapunovHistory {
        &self.history
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Appends a batch and refreshes the Lyapunov estimate. Returns the
    /// number of samples appended; an empty batch changes nothing.
    pub fn ingest(&mut self, mut batch: SampleBatch) -> usize {
        if batch.is_empty() {
            return 0;
        }
        let dt = self.settings.sample_dt;
        let fallback_base = self
            .trajectory
            .last()
            .and_then(|s| s.t)
            .map_or(0.0, |t| t + dt);
        batch.stamp_times(fallback_base, dt);

        let appended = batch.samples.len();
        for sample in batch.samples {
            self.extrema.observe(&self.axes.project(&sample));
            self.trajectory.push(sample);
        }

        self.estimate = estimate_lyapunov(self.render_window(), &self.settings.lyapunov_channel);
        self.history.record(self.estimate);
        log::trace!(
            "ingested {} samples ({} total), lyapunov estimate {:?}",
            appended,
            self.trajectory.len(),
            self.estimate
        );
        appended
    }

    /// Decodes and ingests a JSON payload. Malformed payloads are logged and
    /// dropped without touching the buffer.
    pub fn ingest_json(&mut self, payload: &str) -> usize {
        match decode_json_batch(payload) {
            Ok(batch) => self.ingest(batch),
            Err(err) => {
                log::warn!("dropping sample batch: {}", err);
                0
            }
        }
    }

    pub fn ingest_binary(&mut self, frame: &[u8]) -> usize {
        match decode_binary_frame(frame) {
            Ok(samples) => self.ingest(SampleBatch::new(samples)),
            Err(err) => {
                log::warn!("dropping binary frame: {}", err);
                0
            }
        }
    }

    /// Pulls every remaining batch out of a source.
    pub fn drain(&mut self, source: &mut impl BatchSource) -> usize {
        let mut total = 0;
        while let Some(batch) = source.next_batch() {
            total += self.ingest(batch);
        }
        total
    }

    /// Index of the first sample in the render window.
    pub fn window_start(&self) -> usize {
        self.trajectory
            .len()
            .saturating_sub(self.settings.buffer_capacity)
    }

    /// The most recent `buffer_capacity` samples.
    pub fn render_window(&self) -> &[Sample] {
        &self.trajectory[self.window_start()..]
    }

    /// Render window projected through the axes and normalized by the
    /// extrema into `[0, normalize_factor]`.
    pub fn normalized_window(&self) -> Vec<Point3> {
        self.normalized_window_masked([true; 3])
    }

    /// Like [`Self::normalized_window`], with disabled axes pinned to zero.
    pub fn normalized_window_masked(&self, enabled: [bool; 3]) -> Vec<Point3> {
        let factor = self.settings.normalize_factor;
        self.render_window()
            .iter()
            .map(|s| {
                let n = self.extrema.normalize(&self.axes.project(s), factor);
                Point3::from_fn(|i, _| if enabled[i] { n[i] } else { 0.0 })
            })
            .collect()
    }

    /// Densified render window. Index map entries are trajectory indices.
    pub fn resampled_window(&self, enabled: [bool; 3]) -> Resampled {
        let offset = self.window_start();
        let resample_settings = self.settings.resample;
        let mut out = resample(
            &self.normalized_window_masked(enabled),
            resample_settings.method,
            resample_settings.segments_per_edge,
        );
        for index in &mut out.index_map {
            *index += offset;
        }
        out
    }

    pub fn analyze(&self) -> AnalysisSnapshot {
        let anomaly = anomaly_score(
            self.render_window(),
            self.baseline.as_deref(),
            &self.settings.anomaly_channel,
        );
        AnalysisSnapshot {
            generation: self.generation,
            sample_count: self.trajectory.len(),
            lyapunov: self.estimate,
            classification: classify(self.estimate),
            regime_changed: detect_regime_change(&self.history.to_vec()),
            anomaly_score: anomaly,
        }
    }

    /// Stores the current render window as the anomaly baseline.
    pub fn set_baseline(&mut self) -> bool {
        if self.trajectory.is_empty() {
            return false;
        }
        let window = self.render_window().to_vec();
        log::debug!("captured anomaly baseline of {} samples", window.len());
        self.baseline = Some(window);
        true
    }

    pub fn clear_baseline(&mut self) {
        self.baseline = None;
    }

    pub fn has_baseline(&self) -> bool {
        self.baseline.is_some()
    }

    pub fn section(&self) -> Vec<SectionCrossing> {
        extract_section(&self.trajectory, &self.settings.section)
    }

    pub fn bifurcation(&self, param_channel: &str, observable_channel: &str) -> Vec<ScatterPoint> {
        let pairs = pairs_from_trajectory(&self.trajectory, param_channel, observable_channel);
        bin_bifurcation(&pairs, self.settings.binning)
    }

    pub fn start_capture(&mut self) {
        self.capture_start = Some(self.trajectory.len());
    }

    pub fn is_capturing(&self) -> bool {
        self.capture_start.is_some()
    }

    /// Ends the active capture and packages everything ingested since it
    /// started. `None` when no capture was running.
    pub fn finish_capture(&mut self, id: String, name: String, timestamp: f64) -> Option<Recording> {
        let start = self.capture_start.take()?;
        let data = self.trajectory[start.min(self.trajectory.len())..].to_vec();
        Some(Recording::new(id, name, timestamp, data, self.settings.sample_dt))
    }

    /// Returns the buffer to its initial empty state. Snapshots taken before
    /// the reset carry an older generation.
    pub fn reset(&mut self) {
        self.trajectory.clear();
        self.extrema.reset();
        self.history.clear();
        self.estimate = None;
        self.baseline = None;
        self.capture_start = None;
        self.generation += 1;
        log::debug!("live buffer reset (generation {})", self.generation);
    }
}

#[cfg(test)]
mod tests {
    use super::{ExtremaTracker, LiveBuffer};
    use crate::regime::Regime;
    use crate::resample::ResampleMethod;
    use crate::sample::{Axes, Point3, Sample};
    use crate::settings::AnalysisSettings;
    use crate::stream::SampleBatch;

    fn ramp(start: usize, n: usize) -> SampleBatch {
        SampleBatch::new(
            (start..start + n)
                .map(|i| Sample::from_xyz(i as f64, (i as f64 * 0.3).sin(), 2.0))
                .collect(),
        )
    }

    fn small_settings() -> AnalysisSettings {
        AnalysisSettings {
            buffer_capacity: 150,
            ..AnalysisSettings::default()
        }
    }

    #[test]
    fn extrema_normalization_and_constant_fallback() {
        let mut tracker = ExtremaTracker::new();
        assert_eq!(tracker.normalize(&Point3::new(1.0, 2.0, 3.0), 2.0), Point3::new(1.0, 1.0, 1.0));
        tracker.observe(&Point3::new(0.0, 5.0, 1.0));
        tracker.observe(&Point3::new(10.0, 5.0, f64::NAN));
        let n = tracker.normalize(&Point3::new(2.5, 5.0, 1.0), 1.0);
        assert_eq!(n, Point3::new(0.25, 0.5, 0.5));
        tracker.reset();
        assert_eq!(tracker.min, [f64::INFINITY; 3]);
        assert_eq!(tracker.max, [f64::NEG_INFINITY; 3]);
    }

    #[test]
    fn ingest_stamps_times_and_tracks_extrema() {
        let mut live = LiveBuffer::default();
        assert_eq!(live.ingest(ramp(0, 3)), 3);
        assert_eq!(live.ingest(ramp(3, 2)), 2);
        let times: Vec<f64> = live.trajectory().iter().map(|s| s.t.unwrap()).collect();
        for (i, t) in times.iter().enumerate() {
            assert!((t - i as f64 * 0.01).abs() < 1e-12);
        }
        assert_eq!(live.extrema().min[0], 0.0);
        assert_eq!(live.extrema().max[0], 4.0);
        assert_eq!(live.ingest(SampleBatch::default()), 0);
        assert_eq!(live.len(), 5);
    }

    #[test]
    fn render_window_keeps_the_newest_samples() {
        let mut live = LiveBuffer::new(small_settings(), Axes::default());
        live.ingest(ramp(0, 400));
        assert_eq!(live.window_start(), 250);
        let window = live.render_window();
        assert_eq!(window.len(), 150);
        assert_eq!(window[0].get("x"), 250.0);
        // Extrema still cover the whole history.
        assert_eq!(live.extrema().min[0], 0.0);
        let normalized = live.normalized_window();
        assert!((normalized[0].x - 250.0 / 399.0).abs() < 1e-12);
        assert_eq!(normalized[0].z, 0.5);
    }

    #[test]
    fn resampled_window_maps_to_trajectory_indices() {
        let mut settings = small_settings();
        settings.resample.method = ResampleMethod::Linear;
        settings.resample.segments_per_edge = 3;
        let mut live = LiveBuffer::new(settings, Axes::default());
        live.ingest(ramp(0, 200));
        let out = live.resampled_window([true, true, false]);
        assert_eq!(out.points.len(), 149 * 3 + 1);
        assert!(out.points.iter().all(|p| p.z == 0.0));
        assert_eq!(out.index_map[0], 50);
        assert_eq!(*out.index_map.last().unwrap(), 199);
    }

    #[test]
    fn malformed_payloads_leave_buffer_untouched() {
        let mut live = LiveBuffer::default();
        live.ingest(ramp(0, 10));
        assert_eq!(live.ingest_json("{broken"), 0);
        assert_eq!(live.ingest_binary(&[1, 2, 3]), 0);
        assert_eq!(live.len(), 10);
        assert_eq!(live.ingest_json(r#"{"samples": [{"x": 1}, {"x": 2}]}"#), 2);
        assert_eq!(live.ingest_binary(&[0, 0, 0, 0, 0, 0]), 1);
        assert_eq!(live.len(), 13);
    }

    #[test]
    fn analysis_snapshot_and_reset() {
        let mut live = LiveBuffer::new(small_settings(), Axes::default());
        let before = live.analyze();
        assert_eq!(before.lyapunov, None);
        assert_eq!(before.classification.regime, Regime::Unknown);
        assert_eq!(before.anomaly_score, 0.0);

        live.ingest(ramp(0, 120));
        let snapshot = live.analyze();
        // Unit steps on x give ln(1) = 0.
        assert!(snapshot.lyapunov.expect("estimate").abs() < 1e-12);
        assert_eq!(snapshot.classification.regime, Regime::PeriodicLimitCycle);
        assert_eq!(live.history().len(), 1);

        assert!(live.set_baseline());
        live.ingest(ramp(120, 60));
        assert!(live.analyze().anomaly_score > 0.0);

        live.reset();
        let after = live.analyze();
        assert!(after.generation > snapshot.generation);
        assert_eq!(after.sample_count, 0);
        assert_eq!(after.lyapunov, None);
        assert!(!live.has_baseline());
        assert!(live.history().is_empty());
        assert_eq!(live.extrema().min, [f64::INFINITY; 3]);
    }

    #[test]
    fn capture_packages_samples_since_start() {
        let mut live = LiveBuffer::default();
        assert!(live.finish_capture("a".into(), "a".into(), 0.0).is_none());
        live.ingest(ramp(0, 10));
        live.start_capture();
        assert!(live.is_capturing());
        live.ingest(ramp(10, 25));
        let recording = live
            .finish_capture("rec_1".into(), "lorenz".into(), 1234.0)
            .expect("recording");
        assert!(!live.is_capturing());
        assert_eq!(recording.sample_count(), 25);
        assert_eq!(recording.data[0].get("x"), 10.0);
        assert!((recording.duration - 0.25).abs() < 1e-12);
    }

    #[test]
    fn changing_axes_rebuilds_extrema() {
        let mut live = LiveBuffer::default();
        live.ingest(ramp(0, 20));
        live.set_axes(Axes::new("z", "y", "x"));
        assert_eq!(live.extrema().min[0], 2.0);
        assert_eq!(live.extrema().max[2], 19.0);
    }

    #[test]
    fn section_uses_configured_plane() {
        let mut settings = AnalysisSettings::default();
        settings.section.channel = "y".into();
        settings.section.value = 0.0;
        let mut live = LiveBuffer::new(settings, Axes::default());
        live.ingest(ramp(0, 50));
        let crossings = live.section();
        assert!(!crossings.is_empty());
        assert!(crossings.windows(2).all(|w| w[0].index < w[1].index));
    }
}
