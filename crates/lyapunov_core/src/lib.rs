pub mod anomaly;
pub mod bifurcation;
pub mod error;
pub mod live;
pub mod lyapunov;
pub mod playback;
pub mod poincare;
pub mod recording;
pub mod regime;
pub mod resample;
pub mod sample;
pub mod settings;
pub mod simulate;
pub mod solvers;
pub mod store;
pub mod stream;
pub mod training;
/// The `lyapunov_core` crate holds the analysis engine behind the Lyapunov Lab
/// dashboard. It turns streamed multichannel samples of a chaotic system into
/// render geometry and derived analytics, independent of any UI or transport.
///
/// Key components:
/// - **Live state**: `LiveBuffer` (trajectory, extrema, estimate history) and the observable `Store`.
/// - **Analytics**: Lyapunov proxy and regime classification, anomaly score, Poincaré sections, bifurcation binning.
/// - **Geometry**: axis projection, normalization and linear/Catmull-Rom resampling.
/// - **Interfaces**: stream decoding, the recording library, the training boundary and a local linear baseline.
/// - **Sources**: `BatchSource` implementations for playback and RK4 Lorenz simulation.
pub mod traits;

pub use error::{LabError, LabResult};
pub use live::{AnalysisSnapshot, LiveBuffer};
pub use sample::{Axes, Point3, Sample, Trajectory};
pub use settings::AnalysisSettings;
