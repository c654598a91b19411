use serde::{Deserialize, Serialize};

/// Qualitative dynamical regime inferred from a Lyapunov estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    Unknown,
    StableFixedPoint,
    Stable,
    PeriodicLimitCycle,
    QuasiPeriodic,
    Chaotic,
}

impl Regime {
    pub fn label(self) -> &'static str {
        match self {
            Regime::Unknown => "Unknown",
            Regime::StableFixedPoint => "Stable (Fixed Point)",
            Regime::Stable => "Stable",
            Regime::PeriodicLimitCycle => "Periodic (Limit Cycle)",
            Regime::QuasiPeriodic => "Quasi-periodic",
            Regime::Chaotic => "Chaotic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeClassification {
    pub regime: Regime,
    pub confidence: f64,
}

/// Maps an estimate onto a regime. Thresholds are strict upper bounds
/// checked in ascending order.
pub fn classify(lyapunov: Option<f64>) -> RegimeClassification {
    let (regime, confidence) = match lyapunov {
        None => (Regime::Unknown, 0.0),
        Some(l) if l.is_nan() => (Regime::Unknown, 0.0),
        Some(l) if l < -0.05 => (Regime::StableFixedPoint, 0.9),
        Some(l) if l < -0.01 => (Regime::Stable, 0.7),
        Some(l) if l < 0.01 => (Regime::PeriodicLimitCycle, 0.8),
        Some(l) if l < 0.1 => (Regime::QuasiPeriodic, 0.7),
        Some(_) => (Regime::Chaotic, 0.85),
    };
    RegimeClassification { regime, confidence }
}

/// Number of estimates in each of the two compared sub-windows.
pub const CHANGE_WINDOW: usize = 10;
pub const CHANGE_THRESHOLD: f64 = 0.1;

/// Flags a transition when the mean of the last ten estimates moves more
/// than 0.1 away from the mean of the ten before them.
pub fn detect_regime_change(history: &[f64]) -> bool {
    if history.len() < 2 * CHANGE_WINDOW {
        return false;
    }
    let n = history.len();
    let recent = &history[n - CHANGE_WINDOW..];
    let older = &history[n - 2 * CHANGE_WINDOW..n - CHANGE_WINDOW];
    let mean = |w: &[f64]| w.iter().sum::<f64>() / w.len() as f64;
    (mean(recent) - mean(older)).abs() > CHANGE_THRESHOLD
}
