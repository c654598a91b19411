use crate::sample::{channel_mean, Sample};

/// Trailing window compared between the live buffer and the baseline.
pub const ANOMALY_WINDOW: usize = 50;
/// Below this many samples on either side the score is zero.
pub const MIN_ANOMALY_SAMPLES: usize = 10;

/// Relative deviation of the recent channel mean from a stored baseline.
///
/// Returns `|current - baseline| / |baseline|`, dividing by one instead when
/// the baseline mean is exactly zero.
pub fn anomaly_score(current: &[Sample], baseline: Option<&[Sample]>, channel: &str) -> f64 {
    let Some(baseline) = baseline else {
        return 0.0;
    };
    if current.len() < MIN_ANOMALY_SAMPLES || baseline.len() < MIN_ANOMALY_SAMPLES {
        return 0.0;
    }

    let current_mean = channel_mean(trailing(current), channel).unwrap_or(0.0);
    let baseline_mean = channel_mean(trailing(baseline), channel).unwrap_or(0.0);
    let scale = if baseline_mean == 0.0 {
        1.0
    } else {
        baseline_mean.abs()
    };
    let score = (current_mean - baseline_mean).abs() / scale;
    if score.is_finite() {
        score
    } else {
        0.0
    }
}

fn trailing(samples: &[Sample]) -> &[Sample] {
    &samples[samples.len().saturating_sub(ANOMALY_WINDOW)..]
}
