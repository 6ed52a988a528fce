use crate::{
    model::{conserved_quantity, Parameters},
    simulation::Trajectory,
};
use anyhow::{bail, Result};
use rustfft::{num_complex::Complex, FftPlanner};
use serde::Serialize;

/// Extremes of both populations over a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PopulationSummary {
    pub prey_min: f64,
    pub prey_max: f64,
    pub predator_min: f64,
    pub predator_max: f64,
    /// Sample index of the first prey maximum.
    pub prey_peak_index: usize,
    /// Sample index of the first predator maximum.
    pub predator_peak_index: usize,
}

pub fn summarize(trajectory: &Trajectory) -> Result<PopulationSummary> {
    if trajectory.is_empty() {
        bail!("Cannot summarize an empty trajectory.");
    }
    let (prey_peak_index, prey_max) = argmax(&trajectory.prey);
    let (predator_peak_index, predator_max) = argmax(&trajectory.predator);
    Ok(PopulationSummary {
        prey_min: trajectory.prey.iter().copied().fold(f64::INFINITY, f64::min),
        prey_max,
        predator_min: trajectory
            .predator
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min),
        predator_max,
        prey_peak_index,
        predator_peak_index,
    })
}

/// Time of the predator maximum minus time of the prey maximum, both taken over
/// the first `window` samples. Positive when predators peak after prey.
pub fn peak_lag(trajectory: &Trajectory, window: usize) -> Result<f64> {
    let window = window.min(trajectory.len());
    if window == 0 {
        bail!("Peak lag requires at least one sample.");
    }
    let (prey_idx, _) = argmax(&trajectory.prey[..window]);
    let (predator_idx, _) = argmax(&trajectory.predator[..window]);
    Ok(trajectory.times[predator_idx] - trajectory.times[prey_idx])
}

/// First sample index at which the trajectory is back within `radius` of its
/// initial state after having left that neighbourhood.
pub fn orbit_return_index(trajectory: &Trajectory, radius: f64) -> Option<usize> {
    let start = trajectory.first()?.state;
    let mut left = false;
    for (idx, state) in trajectory.states().enumerate() {
        let distance = state.distance(&start);
        if !left {
            left = distance > radius;
        } else if distance < radius {
            return Some(idx);
        }
    }
    None
}

/// Largest deviation of the first integral from its initial value.
///
/// Requires strictly positive populations throughout.
pub fn invariant_drift(params: &Parameters, trajectory: &Trajectory) -> Result<f64> {
    let Some(first) = trajectory.first() else {
        bail!("Cannot measure drift of an empty trajectory.");
    };
    if trajectory.states().any(|s| s.prey <= 0.0 || s.predator <= 0.0) {
        bail!("The first integral is only defined for positive populations.");
    }
    let v0 = conserved_quantity(params, first.state);
    Ok(trajectory
        .states()
        .map(|s| (conserved_quantity(params, s) - v0).abs())
        .fold(0.0, f64::max))
}

/// Estimated oscillation period of the prey series.
///
/// Takes the strongest non-constant FFT bin of the mean-removed series and
/// refines it by fitting a parabola through the bin and its neighbours.
pub fn dominant_period(trajectory: &Trajectory) -> Result<f64> {
    let n = trajectory.len();
    if n < 4 {
        bail!("Period estimation needs at least 4 samples, got {}.", n);
    }
    let dt = trajectory.times[1] - trajectory.times[0];
    if !(dt.is_finite() && dt > 0.0) {
        bail!("Sample spacing must be positive.");
    }

    let mean = trajectory.prey.iter().sum::<f64>() / n as f64;
    let mut buffer: Vec<Complex<f64>> = trajectory
        .prey
        .iter()
        .map(|&x| Complex::new(x - mean, 0.0))
        .collect();
    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(n).process(&mut buffer);

    let magnitudes: Vec<f64> = buffer[..n / 2 + 1].iter().map(|c| c.norm()).collect();
    let (offset_idx, peak) = argmax(&magnitudes[1..]);
    let k = offset_idx + 1;
    if !(peak.is_finite() && peak > 1e-12 * n as f64) {
        bail!("Series has no oscillating component.");
    }

    let mut refined = k as f64;
    if k + 1 < magnitudes.len() {
        let (a, b, c) = (magnitudes[k - 1], magnitudes[k], magnitudes[k + 1]);
        let denom = a - 2.0 * b + c;
        if denom.abs() > f64::EPSILON {
            refined += 0.5 * (a - c) / denom;
        }
    }

    let frequency = refined / (n as f64 * dt);
    Ok(1.0 / frequency)
}

/// Index and value of the first maximum. NaN entries are skipped.
fn argmax(values: &[f64]) -> (usize, f64) {
    let mut best = (0, f64::NEG_INFINITY);
    for (idx, &v) in values.iter().enumerate() {
        if v > best.1 {
            best = (idx, v);
        }
    }
    best
}
