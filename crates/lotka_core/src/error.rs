//! Error types shared by the integrator, the simulation entry points and the
//! equilibrium solver.

use thiserror::Error;

/// Failures of a simulation request.
///
/// Integration is deterministic, so every variant is either a contract violation
/// by the caller or an inherent numerical limit of the requested problem.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("n_points must be at least 2, got {0}")]
    InvalidSampleCount(usize),

    #[error("t_max must be positive and finite, got {0}")]
    InvalidHorizon(f64),

    #[error("{name} must be finite, got {value}")]
    NonFiniteInput { name: &'static str, value: f64 },

    #[error("invalid integrator settings: {0}")]
    InvalidSettings(&'static str),

    #[error("state dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("step size {step:e} fell below the minimum {min_step:e} at t = {t}")]
    StepSizeTooSmall { t: f64, step: f64, min_step: f64 },

    #[error("integration exceeded {max_steps} steps at t = {t}")]
    TooManySteps { t: f64, max_steps: usize },

    #[error("solution became non-finite at t = {t}")]
    NonFiniteState { t: f64 },
}

/// Algebraic failures of the closed-form equilibrium.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum DomainError {
    #[error("equilibrium is undefined for beta = 0 (division by zero)")]
    ZeroPredation,

    #[error("equilibrium is undefined for delta = 0 (division by zero)")]
    ZeroConversion,
}
