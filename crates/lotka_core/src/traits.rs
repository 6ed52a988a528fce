use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// Numeric type the models and steppers are generic over (`f32`, `f64`).
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// An autonomous or time-dependent flow dx/dt = f(t, x).
///
/// Implementors write the derivative into a caller-owned buffer so steppers can
/// reuse their stage storage across steps.
pub trait DynamicalSystem<T: Scalar> {
    /// Number of state components.
    fn dimension(&self) -> usize;

    /// Writes f(t, x) into `out`. `x` and `out` have length `dimension()`.
    fn apply(&self, t: T, x: &[T], out: &mut [T]);

    /// Allocating convenience wrapper around [`DynamicalSystem::apply`].
    fn evaluate(&self, t: T, x: &[T]) -> Vec<T> {
        let mut out = vec![T::zero(); self.dimension()];
        self.apply(t, x, &mut out);
        out
    }

    /// Whether every component keeps its sign along exact solutions. Adaptive
    /// drivers reject steps whose result changes the sign of a component.
    fn preserves_sign(&self) -> bool {
        false
    }
}

/// Steppers that advance a state by an externally chosen step `dt`.
pub trait Steppable<T: Scalar> {
    /// Advances `state` from `t` to `t + dt` in place and updates `t`.
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T);
}
