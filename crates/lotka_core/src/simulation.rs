//! Public simulation entry points.

use crate::error::SimulationError;
use crate::integrator::{solve_ivp, IntegratorSettings, SolveStats};
use crate::model::{LotkaVolterra, Parameters, State};
use serde::{Deserialize, Serialize};

pub const DEFAULT_T_MAX: f64 = 50.0;
pub const DEFAULT_N_POINTS: usize = 1000;

/// Everything one simulation run needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationRequest {
    pub params: Parameters,
    pub initial: State,
    pub t_max: f64,
    pub n_points: usize,
    pub settings: IntegratorSettings,
}

impl Default for SimulationRequest {
    fn default() -> Self {
        Self {
            params: Parameters::default(),
            initial: State::new(1.0, 1.0),
            t_max: DEFAULT_T_MAX,
            n_points: DEFAULT_N_POINTS,
            settings: IntegratorSettings::default(),
        }
    }
}

impl SimulationRequest {
    pub fn new(params: Parameters, initial: State) -> Self {
        Self {
            params,
            initial,
            ..Self::default()
        }
    }

    pub fn with_params(mut self, params: Parameters) -> Self {
        self.params = params;
        self
    }

    pub fn with_initial(mut self, initial: State) -> Self {
        self.initial = initial;
        self
    }

    pub fn with_horizon(mut self, t_max: f64) -> Self {
        self.t_max = t_max;
        self
    }

    pub fn with_points(mut self, n_points: usize) -> Self {
        self.n_points = n_points;
        self
    }

    pub fn with_settings(mut self, settings: IntegratorSettings) -> Self {
        self.settings = settings;
        self
    }

    fn validate(&self) -> Result<(), SimulationError> {
        if self.n_points < 2 {
            return Err(SimulationError::InvalidSampleCount(self.n_points));
        }
        if !(self.t_max.is_finite() && self.t_max > 0.0) {
            return Err(SimulationError::InvalidHorizon(self.t_max));
        }
        self.params.ensure_finite()?;
        self.initial.ensure_finite()?;
        self.settings.validate()
    }

    /// `n_points` evenly spaced times from 0 to `t_max`, both ends exact.
    pub fn sample_times(&self) -> Vec<f64> {
        let last = self.n_points.saturating_sub(1).max(1) as f64;
        let mut times: Vec<f64> = (0..self.n_points)
            .map(|i| self.t_max * i as f64 / last)
            .collect();
        if let Some(end) = times.last_mut() {
            *end = self.t_max;
        }
        times
    }
}

/// One sampled point of a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub t: f64,
    pub state: State,
}

/// Evenly sampled solution of one run, stored column-wise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub times: Vec<f64>,
    pub prey: Vec<f64>,
    pub predator: Vec<f64>,
    #[serde(default)]
    pub stats: SolveStats,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn sample(&self, index: usize) -> Option<Sample> {
        Some(Sample {
            t: *self.times.get(index)?,
            state: State::new(self.prey[index], self.predator[index]),
        })
    }

    pub fn first(&self) -> Option<Sample> {
        self.sample(0)
    }

    pub fn last(&self) -> Option<Sample> {
        self.sample(self.len().checked_sub(1)?)
    }

    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        (0..self.len()).filter_map(move |i| self.sample(i))
    }

    pub fn states(&self) -> impl Iterator<Item = State> + '_ {
        self.prey
            .iter()
            .zip(&self.predator)
            .map(|(&x1, &x2)| State::new(x1, x2))
    }

    pub fn is_finite(&self) -> bool {
        self.times.iter().all(|v| v.is_finite())
            && self.prey.iter().all(|v| v.is_finite())
            && self.predator.iter().all(|v| v.is_finite())
    }

    /// Shifts every sample time by `offset`.
    pub fn shifted(mut self, offset: f64) -> Self {
        for t in &mut self.times {
            *t += offset;
        }
        self
    }

    /// `(times, x1_series, x2_series)`
    pub fn into_series(self) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        (self.times, self.prey, self.predator)
    }
}

/// Integrates the model described by `request`.
pub fn simulate_with(request: &SimulationRequest) -> Result<Trajectory, SimulationError> {
    request.validate()?;

    let system = LotkaVolterra::from(request.params);
    let times = request.sample_times();
    let solution = solve_ivp(
        &system,
        &request.initial.to_array(),
        &times,
        &request.settings,
    )?;

    let mut prey = Vec::with_capacity(times.len());
    let mut predator = Vec::with_capacity(times.len());
    for pair in solution.states.chunks_exact(2) {
        prey.push(pair[0]);
        predator.push(pair[1]);
    }

    Ok(Trajectory {
        times: solution.times,
        prey,
        predator,
        stats: solution.stats,
    })
}

/// Integrates from `(x1_0, x2_0)` at t = 0 to `t_max` and returns
/// `(times, x1_series, x2_series)` with `n_points` entries each.
///
/// Pass [`DEFAULT_T_MAX`] and [`DEFAULT_N_POINTS`] for the usual horizon.
#[allow(clippy::too_many_arguments)]
pub fn simulate(
    alpha: f64,
    beta: f64,
    gamma: f64,
    delta: f64,
    x1_0: f64,
    x2_0: f64,
    t_max: f64,
    n_points: usize,
) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>), SimulationError> {
    let request = SimulationRequest::new(
        Parameters::new(alpha, beta, gamma, delta),
        State::new(x1_0, x2_0),
    )
    .with_horizon(t_max)
    .with_points(n_points);
    simulate_with(&request).map(Trajectory::into_series)
}
