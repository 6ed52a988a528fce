//! Compositions of [`simulate_with`] used by the notebooks: parameter sweeps,
//! initial condition comparisons and restarts from a perturbed state.
//!
//! Every run here is an independent call; nothing is shared between them.

use crate::{
    error::SimulationError,
    model::{Parameters, State},
    simulation::{simulate_with, SimulationRequest, Trajectory},
};
use serde::{Deserialize, Serialize};

/// Which rate coefficient a sweep varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterAxis {
    Alpha,
    Beta,
    Gamma,
    Delta,
}

impl ParameterAxis {
    pub fn apply(self, params: Parameters, value: f64) -> Parameters {
        let mut params = params;
        match self {
            ParameterAxis::Alpha => params.alpha = value,
            ParameterAxis::Beta => params.beta = value,
            ParameterAxis::Gamma => params.gamma = value,
            ParameterAxis::Delta => params.delta = value,
        }
        params
    }
}

/// One run per value of `axis`, everything else taken from `base`.
pub fn sensitivity_sweep(
    base: &SimulationRequest,
    axis: ParameterAxis,
    values: &[f64],
) -> Result<Vec<Trajectory>, SimulationError> {
    values
        .iter()
        .map(|&value| {
            let request = base.with_params(axis.apply(base.params, value));
            simulate_with(&request)
        })
        .collect()
}

/// One run per initial state.
pub fn initial_condition_sweep(
    base: &SimulationRequest,
    initial_states: &[State],
) -> Result<Vec<Trajectory>, SimulationError> {
    initial_states
        .iter()
        .map(|&initial| simulate_with(&base.with_initial(initial)))
        .collect()
}

/// Instantaneous removal (or addition) of a fraction of each population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Harvest {
    pub prey_factor: f64,
    pub predator_factor: f64,
}

impl Harvest {
    /// Keeps `1 - fraction` of the predators.
    pub fn predators(fraction: f64) -> Self {
        Self {
            prey_factor: 1.0,
            predator_factor: 1.0 - fraction,
        }
    }

    pub fn apply(&self, state: State) -> State {
        State::new(
            state.prey * self.prey_factor,
            state.predator * self.predator_factor,
        )
    }
}

/// The two legs of a run interrupted at `t_switch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerturbedRun {
    /// [0, t_switch]
    pub before: Trajectory,
    /// [t_switch, t_max] in absolute time, starting from the perturbed state.
    pub after: Trajectory,
    pub restart_state: State,
}

/// Runs `base` up to `t_switch`, applies `perturb` to the final state and runs
/// again from there until `base.t_max`. Each leg uses `base.n_points` samples.
pub fn perturbed_restart<F>(
    base: &SimulationRequest,
    t_switch: f64,
    perturb: F,
) -> Result<PerturbedRun, SimulationError>
where
    F: FnOnce(State) -> State,
{
    if !(t_switch > 0.0 && t_switch < base.t_max) {
        return Err(SimulationError::InvalidHorizon(t_switch));
    }

    let before = simulate_with(&base.with_horizon(t_switch))?;
    let end = before
        .last()
        .ok_or(SimulationError::InvalidSampleCount(0))?
        .state;
    let restart_state = perturb(end);
    log::debug!(
        "restarting at t = {} from {:?} (was {:?})",
        t_switch,
        restart_state,
        end
    );

    let after = simulate_with(
        &base
            .with_initial(restart_state)
            .with_horizon(base.t_max - t_switch),
    )?
    .shifted(t_switch);

    Ok(PerturbedRun {
        before,
        after,
        restart_state,
    })
}
