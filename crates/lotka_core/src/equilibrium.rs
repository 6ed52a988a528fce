use crate::{
    error::DomainError,
    model::{jacobian, Parameters, State},
};
use anyhow::{bail, Result};
use nalgebra::{Complex, Matrix2};
use serde::{Deserialize, Serialize};

/// Non-trivial fixed point (gamma / delta, alpha / beta).
///
/// beta = 0 or delta = 0 make the quotient undefined and are reported instead of
/// being replaced by a substitute value.
pub fn equilibrium(
    alpha: f64,
    beta: f64,
    gamma: f64,
    delta: f64,
) -> Result<(f64, f64), DomainError> {
    coexistence(&Parameters::new(alpha, beta, gamma, delta)).map(Into::into)
}

/// [`equilibrium`] for a parameter set.
pub fn coexistence(params: &Parameters) -> Result<State, DomainError> {
    if params.delta == 0.0 {
        return Err(DomainError::ZeroConversion);
    }
    if params.beta == 0.0 {
        return Err(DomainError::ZeroPredation);
    }
    Ok(State::new(
        params.gamma / params.delta,
        params.alpha / params.beta,
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixedPoint {
    Extinction,
    Coexistence,
}

/// Linear stability type from the Jacobian eigenvalues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquilibriumKind {
    Saddle,
    Center,
    StableNode,
    UnstableNode,
    StableFocus,
    UnstableFocus,
    Degenerate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquilibriumResult {
    pub point: FixedPoint,
    pub state: State,
    /// Row-major 2x2.
    pub jacobian: Vec<f64>,
    pub eigenvalues: Vec<Complex<f64>>,
    pub kind: EquilibriumKind,
}

/// Both fixed points; extinction first.
pub fn equilibria(params: &Parameters) -> Result<Vec<(FixedPoint, State)>, DomainError> {
    Ok(vec![
        (FixedPoint::Extinction, State::new(0.0, 0.0)),
        (FixedPoint::Coexistence, coexistence(params)?),
    ])
}

/// Jacobian, eigenvalues and stability type at each fixed point.
pub fn analyze_equilibria(params: &Parameters) -> Result<Vec<EquilibriumResult>> {
    let mut results = Vec::with_capacity(2);
    for (point, state) in equilibria(params)? {
        let j = jacobian(params, state);
        let eigenvalues = Matrix2::from_row_slice(&j).complex_eigenvalues();
        let eigenvalues: Vec<Complex<f64>> = eigenvalues.iter().copied().collect();
        let kind = classify(&eigenvalues);
        log::debug!("{:?} at {:?}: {:?}", point, state, kind);
        results.push(EquilibriumResult {
            point,
            state,
            jacobian: j.to_vec(),
            eigenvalues,
            kind,
        });
    }
    Ok(results)
}

/// Small-amplitude oscillation period around the coexistence point,
/// 2 pi / sqrt(alpha gamma).
pub fn linearized_period(params: &Parameters) -> Result<f64> {
    let product = params.alpha * params.gamma;
    if !(product.is_finite() && product > 0.0) {
        bail!(
            "alpha * gamma must be positive for oscillations, got {}",
            product
        );
    }
    Ok(2.0 * std::f64::consts::PI / product.sqrt())
}

fn classify(eigenvalues: &[Complex<f64>]) -> EquilibriumKind {
    let tol = 1e-12;
    let scale = eigenvalues
        .iter()
        .map(|l| l.norm())
        .fold(0.0f64, f64::max)
        .max(1.0);
    let tol = tol * scale;

    if eigenvalues.iter().any(|l| l.norm() <= tol) {
        return EquilibriumKind::Degenerate;
    }

    let complex = eigenvalues.iter().any(|l| l.im.abs() > tol);
    if complex {
        let re = eigenvalues[0].re;
        return if re.abs() <= tol {
            EquilibriumKind::Center
        } else if re < 0.0 {
            EquilibriumKind::StableFocus
        } else {
            EquilibriumKind::UnstableFocus
        };
    }

    let negative = eigenvalues.iter().filter(|l| l.re < 0.0).count();
    match negative {
        0 => EquilibriumKind::UnstableNode,
        n if n == eigenvalues.len() => EquilibriumKind::StableNode,
        _ => EquilibriumKind::Saddle,
    }
}
