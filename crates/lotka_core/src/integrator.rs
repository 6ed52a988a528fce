//! Adaptive initial value problem driver.
//!
//! Marches a [`DynamicalSystem`] forward with [`DormandPrince45`] under local error
//! control and samples the solution at caller-chosen times through the dense
//! output of each accepted step. Output times are independent of the internal
//! step boundaries. For systems that report [`DynamicalSystem::preserves_sign`],
//! a step whose end state or samples flip the sign of a component is retried
//! with half the step.

use crate::error::SimulationError;
use crate::solvers::{DormandPrince45, StepSizeController};
use crate::traits::DynamicalSystem;
use serde::{Deserialize, Serialize};

/// Tolerances and limits for the adaptive integrator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorSettings {
    /// Relative tolerance on the local error.
    pub rtol: f64,
    /// Absolute tolerance on the local error.
    pub atol: f64,
    /// Upper bound on the internal step.
    pub max_step: f64,
    /// Initial step; chosen automatically when `None`.
    pub first_step: Option<f64>,
    /// Budget of accepted steps before giving up.
    pub max_steps: usize,
}

impl Default for IntegratorSettings {
    fn default() -> Self {
        Self {
            rtol: 1e-3,
            atol: 1e-6,
            max_step: f64::INFINITY,
            first_step: None,
            max_steps: 1_000_000,
        }
    }
}

impl IntegratorSettings {
    pub fn with_tolerances(rtol: f64, atol: f64) -> Self {
        Self {
            rtol,
            atol,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if !(self.rtol.is_finite() && self.rtol > 0.0) {
            return Err(SimulationError::InvalidSettings("rtol must be positive"));
        }
        if !(self.atol.is_finite() && self.atol > 0.0) {
            return Err(SimulationError::InvalidSettings("atol must be positive"));
        }
        if self.max_step.is_nan() || self.max_step <= 0.0 {
            return Err(SimulationError::InvalidSettings("max_step must be positive"));
        }
        if let Some(h) = self.first_step {
            if !(h.is_finite() && h > 0.0) {
                return Err(SimulationError::InvalidSettings(
                    "first_step must be positive",
                ));
            }
        }
        if self.max_steps == 0 {
            return Err(SimulationError::InvalidSettings(
                "max_steps must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Work counters of one integration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveStats {
    pub accepted_steps: usize,
    pub rejected_steps: usize,
    pub rhs_evaluations: usize,
}

/// Solution sampled at the requested times.
#[derive(Debug, Clone)]
pub struct IvpSolution {
    pub times: Vec<f64>,
    /// Row-major, `dimension` values per sample.
    pub states: Vec<f64>,
    pub dimension: usize,
    pub stats: SolveStats,
}

impl IvpSolution {
    pub fn state(&self, index: usize) -> &[f64] {
        let start = index * self.dimension;
        &self.states[start..start + self.dimension]
    }
}

/// Solves dy/dt = f(t, y), y(t_eval[0]) = y0 on `[t_eval[0], t_eval[last]]` and
/// returns the solution at every entry of `t_eval`.
///
/// `t_eval` must be strictly increasing with at least two entries. The first
/// returned state is `y0` unchanged and the last is taken at exactly the end of
/// the span.
pub fn solve_ivp<S: DynamicalSystem<f64>>(
    system: &S,
    y0: &[f64],
    t_eval: &[f64],
    settings: &IntegratorSettings,
) -> Result<IvpSolution, SimulationError> {
    settings.validate()?;
    let dim = system.dimension();
    if y0.len() != dim {
        return Err(SimulationError::DimensionMismatch {
            expected: dim,
            actual: y0.len(),
        });
    }
    if t_eval.len() < 2 {
        return Err(SimulationError::InvalidSampleCount(t_eval.len()));
    }
    if t_eval.iter().any(|t| !t.is_finite()) || t_eval.windows(2).any(|w| w[1] <= w[0]) {
        return Err(SimulationError::InvalidSettings(
            "sample times must be finite and strictly increasing",
        ));
    }
    if let Some(value) = y0.iter().find(|v| !v.is_finite()) {
        return Err(SimulationError::NonFiniteInput {
            name: "initial state",
            value: *value,
        });
    }

    let t_start = t_eval[0];
    let t_bound = t_eval[t_eval.len() - 1];
    let controller = StepSizeController::default();
    let mut stepper = DormandPrince45::new(dim);
    let mut stats = SolveStats::default();

    let mut t = t_start;
    let mut y = y0.to_vec();
    stepper.prime(system, t, &y);
    stats.rhs_evaluations += 1;

    let mut h_abs = match settings.first_step {
        Some(h) => h.min(t_bound - t_start),
        None => {
            stats.rhs_evaluations += 1;
            select_initial_step(system, t, &y, stepper.derivative(), t_bound, settings)
        }
    };

    let mut states = Vec::with_capacity(t_eval.len() * dim);
    let mut pending = Vec::new();
    let mut next_sample = 0usize;

    while t < t_bound {
        if stats.accepted_steps >= settings.max_steps {
            log::warn!(
                "integration stopped after {} steps at t = {}",
                settings.max_steps,
                t
            );
            return Err(SimulationError::TooManySteps {
                t,
                max_steps: settings.max_steps,
            });
        }

        let min_step = 10.0 * spacing(t);
        h_abs = h_abs.clamp(min_step, settings.max_step.max(min_step));

        let mut rejected = false;
        let t_new = loop {
            if h_abs < min_step {
                log::warn!(
                    "step size {:e} below minimum {:e} at t = {}",
                    h_abs,
                    min_step,
                    t
                );
                return Err(SimulationError::StepSizeTooSmall {
                    t,
                    step: h_abs,
                    min_step,
                });
            }

            let t_new = (t + h_abs).min(t_bound);
            let h = t_new - t;
            h_abs = h.abs();

            stepper.attempt(system, t, &y, h);
            stats.rhs_evaluations += 6;

            let error_norm = stepper.error_norm(&y, h, settings.rtol, settings.atol);
            if error_norm < 1.0 {
                pending.clear();
                let mut upcoming = next_sample;
                if upcoming < t_eval.len() && t_eval[upcoming] <= t_new {
                    let segment = stepper.dense_segment(t, &y, h);
                    let mut out = vec![0.0; dim];
                    while upcoming < t_eval.len() && t_eval[upcoming] <= t_new {
                        segment.evaluate(t_eval[upcoming], &mut out);
                        pending.extend_from_slice(&out);
                        upcoming += 1;
                    }
                }

                if system.preserves_sign()
                    && (crosses_zero(&y, stepper.solution())
                        || pending.chunks_exact(dim).any(|s| crosses_zero(&y, s)))
                {
                    log::trace!("rejected step h = {:e} at t = {} (sign change)", h, t);
                    h_abs *= 0.5;
                    rejected = true;
                    stats.rejected_steps += 1;
                    continue;
                }

                h_abs *= controller.accepted_factor(error_norm, rejected);
                next_sample = upcoming;
                break t_new;
            }

            log::trace!("rejected step h = {:e} at t = {} (error {})", h, t, error_norm);
            h_abs *= controller.rejected_factor(error_norm);
            rejected = true;
            stats.rejected_steps += 1;
        };

        if stepper.solution().iter().any(|v| !v.is_finite()) {
            log::warn!("solution became non-finite at t = {}", t_new);
            return Err(SimulationError::NonFiniteState { t: t_new });
        }
        states.extend_from_slice(&pending);

        y.copy_from_slice(stepper.solution());
        stepper.accept();
        t = t_new;
        stats.accepted_steps += 1;
    }

    log::debug!(
        "integrated [{}, {}] in {} steps ({} rejected, {} RHS evaluations)",
        t_start,
        t_bound,
        stats.accepted_steps,
        stats.rejected_steps,
        stats.rhs_evaluations
    );

    Ok(IvpSolution {
        times: t_eval.to_vec(),
        states,
        dimension: dim,
        stats,
    })
}

/// Initial step estimate from Hairer, Norsett & Wanner, section II.4.
fn select_initial_step<S: DynamicalSystem<f64>>(
    system: &S,
    t0: f64,
    y0: &[f64],
    f0: &[f64],
    t_bound: f64,
    settings: &IntegratorSettings,
) -> f64 {
    let interval = (t_bound - t0).abs();
    let scale: Vec<f64> = y0
        .iter()
        .map(|y| settings.atol + y.abs() * settings.rtol)
        .collect();

    let d0 = rms_scaled(y0, &scale);
    let d1 = rms_scaled(f0, &scale);
    let h0 = if d0 < 1e-5 || d1 < 1e-5 {
        1e-6
    } else {
        0.01 * d0 / d1
    };
    let h0 = h0.min(interval);

    let y1: Vec<f64> = y0.iter().zip(f0).map(|(y, f)| y + h0 * f).collect();
    let f1 = system.evaluate(t0 + h0, &y1);
    let diff: Vec<f64> = f1.iter().zip(f0).map(|(a, b)| a - b).collect();
    let d2 = rms_scaled(&diff, &scale) / h0;

    let order = DormandPrince45::ERROR_ORDER as f64;
    let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
        (h0 * 1e-3).max(1e-6)
    } else {
        (0.01 / d1.max(d2)).powf(1.0 / (order + 1.0))
    };

    (100.0 * h0).min(h1).min(interval).min(settings.max_step)
}

/// True when some component is strictly positive in `from` and strictly negative
/// in `to`, or the other way round.
fn crosses_zero(from: &[f64], to: &[f64]) -> bool {
    from.iter()
        .zip(to)
        .any(|(&a, &b)| (a > 0.0 && b < 0.0) || (a < 0.0 && b > 0.0))
}

fn rms_scaled(values: &[f64], scale: &[f64]) -> f64 {
    let sum: f64 = values
        .iter()
        .zip(scale)
        .map(|(v, s)| (v / s) * (v / s))
        .sum();
    (sum / values.len() as f64).sqrt()
}

/// Distance from `t` to the next representable float above it.
fn spacing(t: f64) -> f64 {
    let next = if t >= 0.0 {
        f64::from_bits(t.to_bits() + 1)
    } else {
        f64::from_bits(t.to_bits() - 1)
    };
    (next - t).abs()
}
