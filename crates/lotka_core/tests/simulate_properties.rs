use approx::assert_relative_eq;
use lotka_core::analysis::{
    dominant_period, invariant_drift, orbit_return_index, peak_lag, summarize,
};
use lotka_core::model::conserved_quantity;
use lotka_core::scenario::{perturbed_restart, Harvest};
use lotka_core::{
    equilibrium, simulate, simulate_with, IntegratorSettings, Parameters, SimulationError,
    SimulationRequest, State, Trajectory,
};

fn reference() -> SimulationRequest {
    SimulationRequest::new(Parameters::new(6.0, 2.0, 2.0, 3.0), State::new(1.0, 1.0))
}

fn run(request: SimulationRequest) -> Trajectory {
    simulate_with(&request).expect("simulation should succeed")
}

fn local_maxima(times: &[f64], values: &[f64]) -> Vec<f64> {
    (1..values.len() - 1)
        .filter(|&i| values[i] > values[i - 1] && values[i] >= values[i + 1])
        .map(|i| times[i])
        .collect()
}

#[test]
fn output_shape_and_endpoints() {
    for (t_max, n_points) in [(0.01, 2), (1.0, 10), (15.0, 1000), (50.0, 5000)] {
        let (t, x1, x2) = simulate(6.0, 2.0, 2.0, 3.0, 1.0, 1.0, t_max, n_points).expect("simulate");
        assert_eq!(t.len(), n_points);
        assert_eq!(x1.len(), n_points);
        assert_eq!(x2.len(), n_points);
        assert_eq!(t[0], 0.0);
        assert_relative_eq!(t[n_points - 1], t_max, epsilon = 1e-9);
        assert_relative_eq!(x1[0], 1.0, max_relative = 1e-5);
        assert_relative_eq!(x2[0], 1.0, max_relative = 1e-5);
    }
}

#[test]
fn absent_prey_gives_exponential_predator_decline() {
    let trajectory = run(reference().with_initial(State::new(0.0, 1.0)));
    for sample in trajectory.samples() {
        assert_eq!(sample.state.prey, 0.0);
        let expected = (-2.0 * sample.t).exp();
        assert!(
            (sample.state.predator - expected).abs() < 1e-3,
            "t = {}: {} vs {}",
            sample.t,
            sample.state.predator,
            expected
        );
    }
}

#[test]
fn absent_predators_give_exponential_prey_growth() {
    let trajectory = run(
        reference()
            .with_initial(State::new(0.5, 0.0))
            .with_horizon(1.0)
            .with_points(100),
    );
    for sample in trajectory.samples() {
        assert_eq!(sample.state.predator, 0.0);
        let expected = 0.5 * (6.0 * sample.t).exp();
        assert_relative_eq!(sample.state.prey, expected, max_relative = 1e-2);
    }
}

#[test]
fn equilibrium_start_stays_put() {
    let (x1_eq, x2_eq) = equilibrium(6.0, 2.0, 2.0, 3.0).expect("equilibrium");
    let start = State::new(x1_eq, x2_eq);
    let trajectory = run(reference().with_initial(start));
    assert_eq!(trajectory.last().expect("last").t, 50.0);
    for state in trajectory.states() {
        assert!(state.distance(&start) < 1e-3);
    }
}

#[test]
fn populations_oscillate_with_predators_lagging() {
    let trajectory = run(reference().with_horizon(20.0).with_points(2000));

    let summary = summarize(&trajectory).expect("summary");
    assert!(summary.prey_max > 1.0 && summary.prey_min < 1.0);
    assert!(summary.predator_max - summary.predator_min > 0.5);

    let lag = peak_lag(&trajectory, 1000).expect("lag");
    assert!(lag > 0.0, "predator peak should follow prey peak, lag = {lag}");
}

#[test]
fn orbit_closes_over_long_horizon() {
    let trajectory = run(reference().with_points(5000));
    let idx = orbit_return_index(&trajectory, 0.1).expect("orbit should return");
    assert!(idx > 1);
}

#[test]
fn populations_stay_positive() {
    for initial in [
        State::new(1.0, 1.0),
        State::new(0.5, 0.5),
        State::new(2.0, 2.0),
        State::new(1.0, 5.0),
    ] {
        let trajectory = run(reference().with_initial(initial));
        assert!(trajectory.is_finite());
        assert!(trajectory.states().all(|s| s.prey > 0.0 && s.predator > 0.0));
    }
}

#[test]
fn stiff_parameters_remain_finite() {
    let trajectory = run(
        SimulationRequest::new(
            Parameters::new(100.0, 50.0, 50.0, 100.0),
            State::new(1.0, 1.0),
        )
        .with_horizon(1.0)
        .with_points(200),
    );
    assert!(trajectory.is_finite());
}

#[test]
fn measured_period_matches_peak_spacing() {
    let trajectory = run(reference());
    let peaks = local_maxima(&trajectory.times, &trajectory.prey);
    assert!(peaks.len() > 10);
    let spacing = (peaks[peaks.len() - 1] - peaks[0]) / (peaks.len() - 1) as f64;
    let period = dominant_period(&trajectory).expect("period");
    assert_relative_eq!(period, spacing, max_relative = 0.03);
}

#[test]
fn tighter_tolerances_conserve_the_first_integral() {
    let params = Parameters::new(6.0, 2.0, 2.0, 3.0);
    let base = reference().with_horizon(20.0).with_points(500);

    let loose = run(base);
    let tight = run(base.with_settings(IntegratorSettings::with_tolerances(1e-6, 1e-9)));

    let loose_drift = invariant_drift(&params, &loose).expect("drift");
    let tight_drift = invariant_drift(&params, &tight).expect("drift");
    assert!(tight_drift < 1e-3, "drift = {tight_drift}");
    assert!(tight_drift * 100.0 < loose_drift);
    assert!(tight.stats.accepted_steps > loose.stats.accepted_steps);
}

#[test]
fn hunting_moves_the_orbit() {
    let params = Parameters::new(6.0, 2.0, 2.0, 3.0);
    let base = reference()
        .with_horizon(20.0)
        .with_points(1000)
        .with_settings(IntegratorSettings::with_tolerances(1e-8, 1e-10));
    let hunt = Harvest::predators(0.3);
    let outcome = perturbed_restart(&base, 10.0, |s| hunt.apply(s)).expect("restart");

    assert!(outcome.after.is_finite());
    assert!(outcome.after.states().all(|s| s.prey > 0.0 && s.predator > 0.0));

    let before_level = conserved_quantity(&params, outcome.before.first().expect("before").state);
    let after_level = conserved_quantity(&params, outcome.restart_state);
    assert!((before_level - after_level).abs() > 1e-3);
    for state in outcome.after.states() {
        assert_relative_eq!(
            conserved_quantity(&params, state),
            after_level,
            max_relative = 1e-4
        );
    }
}

#[test]
fn invalid_requests_are_rejected() {
    assert!(simulate(6.0, 2.0, 2.0, 3.0, 1.0, 1.0, 10.0, 1).is_err());
    assert!(simulate(6.0, 2.0, 2.0, 3.0, 1.0, 1.0, -1.0, 10).is_err());
    assert!(simulate(f64::NAN, 2.0, 2.0, 3.0, 1.0, 1.0, 10.0, 10).is_err());
    assert!(simulate(6.0, 2.0, 2.0, 3.0, f64::INFINITY, 1.0, 10.0, 10).is_err());
}

#[test]
fn other_parameter_sets_stay_finite_and_non_negative() {
    for (alpha, beta, gamma, delta) in [
        (3.0, 1.0, 1.0, 1.5),
        (10.0, 3.0, 4.0, 5.0),
        (1.0, 0.5, 0.5, 1.0),
        (1.0, 1.0, 1.0, 1.0),
        (0.1, 0.1, 0.1, 0.1),
    ] {
        let (x1_eq, x2_eq) = equilibrium(alpha, beta, gamma, delta).expect("equilibrium");
        assert!(x1_eq > 0.0 && x2_eq > 0.0);

        let (_, x1, x2) =
            simulate(alpha, beta, gamma, delta, 1.0, 1.0, 10.0, 1000).expect("simulate");
        assert!(x1.iter().chain(&x2).all(|v| v.is_finite() && *v >= 0.0));
    }
}

#[test]
fn parameter_grid_gives_finite_non_negative_output() {
    let values = [0.1, 1.0, 10.0, 100.0];
    for &alpha in &values {
        for &beta in &values {
            for &gamma in &values {
                for &delta in &values {
                    for t_max in [0.01, 1.0, 50.0] {
                        let (t, x1, x2) =
                            simulate(alpha, beta, gamma, delta, 1.0, 1.0, t_max, 50)
                                .unwrap_or_else(|e| {
                                    panic!("({alpha}, {beta}, {gamma}, {delta}), t_max {t_max}: {e}")
                                });
                        assert!(
                            t.iter().chain(&x1).chain(&x2).all(|v| v.is_finite()),
                            "non-finite output for ({alpha}, {beta}, {gamma}, {delta}), t_max {t_max}"
                        );
                        assert!(
                            x1.iter().chain(&x2).all(|v| *v >= 0.0),
                            "negative population for ({alpha}, {beta}, {gamma}, {delta}), t_max {t_max}"
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn deep_troughs_do_not_cross_zero() {
    // Each orbit dips many orders of magnitude below the default atol.
    for (alpha, beta, gamma, delta) in [(10.0, 1.0, 100.0, 0.1), (10.0, 100.0, 1.0, 1.0)] {
        let trajectory = run(
            SimulationRequest::new(
                Parameters::new(alpha, beta, gamma, delta),
                State::new(1.0, 1.0),
            )
            .with_horizon(50.0)
            .with_points(1000),
        );
        assert!(trajectory.is_finite());
        assert!(
            trajectory.states().all(|s| s.prey >= 0.0 && s.predator >= 0.0),
            "negative population for ({alpha}, {beta}, {gamma}, {delta})"
        );
    }
}

#[test]
fn zero_atol_is_rejected() {
    let request = reference()
        .with_initial(State::new(0.0, 1.0))
        .with_settings(IntegratorSettings::with_tolerances(1e-6, 0.0));
    assert_eq!(
        simulate_with(&request),
        Err(SimulationError::InvalidSettings("atol must be positive"))
    );
}

#[test]
fn single_population_runs_are_monotone() {
    let (_, x1, x2) = simulate(6.0, 2.0, 2.0, 3.0, 0.0, 1.0, 10.0, 1000).expect("simulate");
    assert!(x1.iter().all(|v| *v == 0.0));
    assert!(x2.iter().all(|v| *v <= 1.0));

    let (_, x1, x2) = simulate(6.0, 2.0, 2.0, 3.0, 1.0, 0.0, 10.0, 1000).expect("simulate");
    assert!(x2.iter().all(|v| *v == 0.0));
    assert!(x1.iter().all(|v| *v >= 1.0 && v.is_finite()));
}
