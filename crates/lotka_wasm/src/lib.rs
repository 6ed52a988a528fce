//! Browser bindings for `lotka_core`.

mod simulation;
mod system;

pub use system::WasmLotkaVolterra;

use anyhow::Context;
use lotka_core::model::State;
use lotka_core::{simulate_with, Parameters, SimulationRequest};
use serde::Serialize;
use simulation::{js_error, parse_settings};
use wasm_bindgen::prelude::*;

/// Plain column payload of [`simulate`].
#[derive(Serialize)]
struct Series {
    t: Vec<f64>,
    x1: Vec<f64>,
    x2: Vec<f64>,
}

/// `[dx1/dt, dx2/dt]` at `(x1, x2)`.
#[wasm_bindgen]
pub fn vector_field(
    t: f64,
    x1: f64,
    x2: f64,
    alpha: f64,
    beta: f64,
    gamma: f64,
    delta: f64,
) -> Vec<f64> {
    let (dx1, dx2) = lotka_core::vector_field(t, (x1, x2), alpha, beta, gamma, delta);
    vec![dx1, dx2]
}

/// `{ t, x1, x2 }` sampled at `n_points` evenly spaced times in [0, t_max].
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn simulate(
    alpha: f64,
    beta: f64,
    gamma: f64,
    delta: f64,
    x1_0: f64,
    x2_0: f64,
    t_max: f64,
    n_points: u32,
    settings: JsValue,
) -> Result<JsValue, JsValue> {
    let request = SimulationRequest::new(
        Parameters::new(alpha, beta, gamma, delta),
        State::new(x1_0, x2_0),
    )
    .with_horizon(t_max)
    .with_points(n_points as usize)
    .with_settings(parse_settings(settings)?);

    let (t, x1, x2) = simulate_with(&request)
        .context("Simulation failed")
        .map_err(js_error)?
        .into_series();
    serde_wasm_bindgen::to_value(&Series { t, x1, x2 })
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
}

/// `[gamma / delta, alpha / beta]`.
#[wasm_bindgen]
pub fn equilibrium(alpha: f64, beta: f64, gamma: f64, delta: f64) -> Result<Vec<f64>, JsValue> {
    lotka_core::equilibrium(alpha, beta, gamma, delta)
        .map(|(x1, x2)| vec![x1, x2])
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_field_matches_core() {
        assert_eq!(vector_field(0.0, 1.0, 1.0, 6.0, 2.0, 2.0, 3.0), vec![4.0, 1.0]);
        assert_eq!(vector_field(9.0, 0.0, 2.0, 6.0, 2.0, 2.0, 3.0), vec![0.0, -4.0]);
    }

    #[test]
    fn equilibrium_matches_core() {
        assert_eq!(
            equilibrium(6.0, 2.0, 2.0, 3.0).expect("defined"),
            vec![2.0 / 3.0, 3.0]
        );
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::{equilibrium, simulate};
    use lotka_core::IntegratorSettings;
    use wasm_bindgen::JsValue;
    use wasm_bindgen_test::wasm_bindgen_test;

    #[wasm_bindgen_test]
    fn equilibrium_rejects_zero_beta() {
        let message = equilibrium(6.0, 0.0, 2.0, 3.0)
            .expect_err("beta = 0")
            .as_string()
            .expect("string error");
        assert!(message.contains("beta"), "{message}");
    }

    #[wasm_bindgen_test]
    fn simulate_rejects_single_point() {
        let err = simulate(6.0, 2.0, 2.0, 3.0, 1.0, 1.0, 10.0, 1, JsValue::UNDEFINED)
            .expect_err("one point");
        let message = err.as_string().expect("string error");
        assert!(message.starts_with("Simulation failed"), "{message}");
    }

    #[wasm_bindgen_test]
    fn simulate_rejects_zero_atol() {
        let settings = IntegratorSettings::with_tolerances(1e-6, 0.0);
        let value = serde_wasm_bindgen::to_value(&settings).expect("settings");
        let err = simulate(6.0, 2.0, 2.0, 3.0, 0.0, 1.0, 10.0, 10, value).expect_err("atol = 0");
        let message = err.as_string().expect("string error");
        assert!(message.contains("atol"), "{message}");
    }
}
