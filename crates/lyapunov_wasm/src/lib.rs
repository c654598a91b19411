//! Browser bindings for the Lyapunov Lab analysis core.

mod analysis;
mod dashboard;
mod library;
mod live;
mod logging;
mod payload;

pub use analysis::{
    classify_lyapunov, lorenz_bifurcation, resample_points, simulate_lorenz_trajectory,
    train_linear_baseline,
};
pub use dashboard::WasmDashboard;
pub use library::WasmRecordingLibrary;
pub use live::{WasmLiveBuffer, WasmPlayback};
pub use logging::init_logging;
