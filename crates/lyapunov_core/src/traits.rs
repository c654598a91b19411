use crate::stream::SampleBatch;
use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// Numeric types the integrators can run on.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// A continuous-time vector field `dx/dt = f(t, x)`.
pub trait DynamicalSystem<T: Scalar> {
    fn dimension(&self) -> usize;

    /// Writes `f(t, x)` into `out`.
    fn apply(&self, t: T, x: &[T], out: &mut [T]);
}

/// Advances a state by one fixed step.
pub trait Steppable<T: Scalar> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T);
}

/// Anything that delivers sample batches to the live buffer: a decoded
/// transport stream, a recording being played back, or a simulator.
pub trait BatchSource {
    /// Next batch, or `None` once the source is exhausted.
    fn next_batch(&mut self) -> Option<SampleBatch>;
}
