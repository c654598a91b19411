//! Analysis settings shared by the live buffer and the dashboard state.

use crate::bifurcation::BinningConfig;
use crate::error::{LabError, LabResult};
use crate::poincare::SectionConfig;
use crate::resample::ResampleMethod;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResampleSettings {
    pub method: ResampleMethod,
    pub segments_per_edge: usize,
}

impl Default for ResampleSettings {
    fn default() -> Self {
        Self {
            method: ResampleMethod::Linear,
            segments_per_edge: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisSettings {
    /// Length of the render window suffix.
    pub buffer_capacity: usize,
    /// Scale applied after min/max normalization.
    pub normalize_factor: f64,
    /// Assumed sampling interval in seconds.
    pub sample_dt: f64,
    pub lyapunov_channel: String,
    pub anomaly_channel: String,
    pub history_capacity: usize,
    pub resample: ResampleSettings,
    pub section: SectionConfig,
    pub binning: BinningConfig,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            buffer_capacity: 1000,
            normalize_factor: 1.0,
            sample_dt: 0.01,
            lyapunov_channel: "x".to_string(),
            anomaly_channel: "x".to_string(),
            history_capacity: 200,
            resample: ResampleSettings::default(),
            section: SectionConfig::default(),
            binning: BinningConfig::default(),
        }
    }
}

impl AnalysisSettings {
    /// Parses a (possibly partial) JSON document over the defaults.
    pub fn from_json(raw: &str) -> LabResult<Self> {
        let settings: Self = serde_json::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> LabResult<()> {
        if self.buffer_capacity == 0 {
            return Err(LabError::Settings("bufferCapacity must be positive".into()));
        }
        if self.history_capacity == 0 {
            return Err(LabError::Settings("historyCapacity must be positive".into()));
        }
        if !(self.sample_dt.is_finite() && self.sample_dt > 0.0) {
            return Err(LabError::Settings("sampleDt must be a positive number".into()));
        }
        if !self.normalize_factor.is_finite() {
            return Err(LabError::Settings("normalizeFactor must be finite".into()));
        }
        if !self.section.value.is_finite() {
            return Err(LabError::Settings("section value must be finite".into()));
        }
        self.binning.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::AnalysisSettings;
    use crate::error::LabError;
    use crate::poincare::CrossingDirection;
    use crate::resample::ResampleMethod;

    #[test]
    fn defaults_are_valid() {
        let settings = AnalysisSettings::default();
        settings.validate().expect("defaults validate");
        assert_eq!(settings.buffer_capacity, 1000);
        assert_eq!(settings.binning.precision, 2);
    }

    #[test]
    fn partial_documents_fill_defaults() {
        let settings = AnalysisSettings::from_json(
            r#"{
                "bufferCapacity": 250,
                "anomalyChannel": "y",
                "resample": {"method": "spline", "segmentsPerEdge": 8},
                "section": {"channel": "x", "value": 0.0, "direction": "negative", "transient": 100}
            }"#,
        )
        .expect("settings");
        assert_eq!(settings.buffer_capacity, 250);
        assert_eq!(settings.anomaly_channel, "y");
        assert_eq!(settings.lyapunov_channel, "x");
        assert_eq!(settings.resample.method, ResampleMethod::Spline);
        assert_eq!(settings.section.direction, CrossingDirection::Negative);
        assert_eq!(settings.section.transient, 100);
        assert_eq!(settings.binning.num_bins, 200);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            AnalysisSettings::from_json(r#"{"bufferCapacity": 0}"#),
            Err(LabError::Settings(_))
        ));
        assert!(matches!(
            AnalysisSettings::from_json(r#"{"sampleDt": -0.1}"#),
            Err(LabError::Settings(_))
        ));
        assert!(matches!(
            AnalysisSettings::from_json(r#"{"bufferCapacity": "big"}"#),
            Err(LabError::Json(_))
        ));
    }

    #[test]
    fn rejects_unbounded_binning() {
        assert!(matches!(
            AnalysisSettings::from_json(r#"{"binning": {"numBins": 1000000000000}}"#),
            Err(LabError::Settings(_))
        ));
        assert!(matches!(
            AnalysisSettings::from_json(r#"{"binning": {"precision": 17}}"#),
            Err(LabError::Settings(_))
        ));
        let settings = AnalysisSettings::from_json(r#"{"binning": {"numBins": 50, "precision": 4}}"#)
            .expect("settings");
        assert_eq!(settings.binning.num_bins, 50);
    }
}
