//! The Lotka-Volterra vector field and its data types.
//!
//!   dx1/dt =  alpha x1 - beta x1 x2
//!   dx2/dt = -gamma x2 + delta x1 x2
//!
//! x1 is the prey population and x2 the predator population.

use crate::error::SimulationError;
use crate::traits::{DynamicalSystem, Scalar};
use serde::{Deserialize, Serialize};

/// The four rate coefficients of the model.
///
/// No sign checks are made: zero or negative rates are valid inputs and give the
/// dynamics the equations imply.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// Prey growth rate.
    pub alpha: f64,
    /// Predation rate.
    pub beta: f64,
    /// Predator mortality rate.
    pub gamma: f64,
    /// Conversion efficiency.
    pub delta: f64,
}

impl Parameters {
    pub fn new(alpha: f64, beta: f64, gamma: f64, delta: f64) -> Self {
        Self {
            alpha,
            beta,
            gamma,
            delta,
        }
    }

    pub(crate) fn ensure_finite(&self) -> Result<(), SimulationError> {
        for (name, value) in [
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("gamma", self.gamma),
            ("delta", self.delta),
        ] {
            if !value.is_finite() {
                return Err(SimulationError::NonFiniteInput { name, value });
            }
        }
        Ok(())
    }
}

impl Default for Parameters {
    /// The reference parameter set used throughout the notebooks.
    fn default() -> Self {
        Self::new(6.0, 2.0, 2.0, 3.0)
    }
}

/// A point in population space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct State {
    /// x1
    pub prey: f64,
    /// x2
    pub predator: f64,
}

impl State {
    pub fn new(prey: f64, predator: f64) -> Self {
        Self { prey, predator }
    }

    pub fn to_array(self) -> [f64; 2] {
        [self.prey, self.predator]
    }

    pub fn is_finite(&self) -> bool {
        self.prey.is_finite() && self.predator.is_finite()
    }

    /// Euclidean distance in population space.
    pub fn distance(&self, other: &State) -> f64 {
        (self.prey - other.prey).hypot(self.predator - other.predator)
    }

    pub(crate) fn ensure_finite(&self) -> Result<(), SimulationError> {
        if !self.prey.is_finite() {
            return Err(SimulationError::NonFiniteInput {
                name: "x1_0",
                value: self.prey,
            });
        }
        if !self.predator.is_finite() {
            return Err(SimulationError::NonFiniteInput {
                name: "x2_0",
                value: self.predator,
            });
        }
        Ok(())
    }
}

impl From<[f64; 2]> for State {
    fn from(value: [f64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<(f64, f64)> for State {
    fn from(value: (f64, f64)) -> Self {
        Self::new(value.0, value.1)
    }
}

impl From<State> for (f64, f64) {
    fn from(value: State) -> Self {
        (value.prey, value.predator)
    }
}

impl TryFrom<&[f64]> for State {
    type Error = SimulationError;

    fn try_from(value: &[f64]) -> Result<Self, Self::Error> {
        match value {
            [prey, predator] => Ok(Self::new(*prey, *predator)),
            _ => Err(SimulationError::DimensionMismatch {
                expected: 2,
                actual: value.len(),
            }),
        }
    }
}

/// Evaluates the predator-prey derivative at `state`.
///
/// `_t` is ignored since the system is autonomous; it is accepted so the function
/// has the usual `f(t, y, ...)` shape expected by generic ODE code. Negative or zero
/// populations are evaluated like any other value.
pub fn vector_field<T: Scalar>(
    _t: T,
    state: (T, T),
    alpha: T,
    beta: T,
    gamma: T,
    delta: T,
) -> (T, T) {
    let (x1, x2) = state;
    let dx1 = alpha * x1 - beta * x1 * x2;
    let dx2 = -gamma * x2 + delta * x1 * x2;
    (dx1, dx2)
}

/// Lotka-Volterra as a [`DynamicalSystem`] of dimension 2.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LotkaVolterra<T: Scalar = f64> {
    pub alpha: T,
    pub beta: T,
    pub gamma: T,
    pub delta: T,
}

impl<T: Scalar> LotkaVolterra<T> {
    pub fn new(alpha: T, beta: T, gamma: T, delta: T) -> Self {
        Self {
            alpha,
            beta,
            gamma,
            delta,
        }
    }
}

impl From<Parameters> for LotkaVolterra<f64> {
    fn from(p: Parameters) -> Self {
        Self::new(p.alpha, p.beta, p.gamma, p.delta)
    }
}

impl<T: Scalar> DynamicalSystem<T> for LotkaVolterra<T> {
    fn dimension(&self) -> usize {
        2
    }

    fn apply(&self, t: T, x: &[T], out: &mut [T]) {
        let (dx1, dx2) = vector_field(
            t,
            (x[0], x[1]),
            self.alpha,
            self.beta,
            self.gamma,
            self.delta,
        );
        out[0] = dx1;
        out[1] = dx2;
    }

    // Both axes are invariant, so populations never change sign.
    fn preserves_sign(&self) -> bool {
        true
    }
}

/// Row-major Jacobian of the vector field at `state`.
pub fn jacobian(params: &Parameters, state: State) -> [f64; 4] {
    let Parameters {
        alpha,
        beta,
        gamma,
        delta,
    } = *params;
    let State { prey, predator } = state;
    [
        alpha - beta * predator,
        -beta * prey,
        delta * predator,
        -gamma + delta * prey,
    ]
}

/// First integral V = delta x1 - gamma ln x1 + beta x2 - alpha ln x2.
///
/// Constant along exact orbits with positive populations; NaN or infinite
/// otherwise.
pub fn conserved_quantity(params: &Parameters, state: State) -> f64 {
    params.delta * state.prey - params.gamma * state.prey.ln() + params.beta * state.predator
        - params.alpha * state.predator.ln()
}
