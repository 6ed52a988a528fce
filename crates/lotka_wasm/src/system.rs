//! Interactive model wrapper: a state, a clock and a stepper the front-end drives
//! frame by frame.

use lotka_core::equilibrium::coexistence;
use lotka_core::model::{jacobian, LotkaVolterra, Parameters, State};
use lotka_core::solvers::{DormandPrince45, RK4};
use lotka_core::traits::{DynamicalSystem, Steppable};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmLotkaVolterra {
    pub(crate) params: Parameters,
    system: LotkaVolterra<f64>,
    pub(crate) state: [f64; 2],
    t: f64,
    solver: SolverType,
}

enum SolverType {
    RK4(RK4<f64>),
    Dopri5(DormandPrince45),
}

impl SolverType {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "rk4" => Some(SolverType::RK4(RK4::new(2))),
            "dopri5" => Some(SolverType::Dopri5(DormandPrince45::new(2))),
            _ => None,
        }
    }
}

#[wasm_bindgen]
impl WasmLotkaVolterra {
    #[wasm_bindgen(constructor)]
    pub fn new(
        alpha: f64,
        beta: f64,
        gamma: f64,
        delta: f64,
        solver_name: &str,
    ) -> Result<WasmLotkaVolterra, JsValue> {
        console_error_panic_hook::set_once();

        let solver = SolverType::from_name(solver_name)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown solver: {solver_name}")))?;
        let params = Parameters::new(alpha, beta, gamma, delta);

        Ok(WasmLotkaVolterra {
            params,
            system: LotkaVolterra::from(params),
            state: [1.0, 1.0],
            t: 0.0,
            solver,
        })
    }

    pub fn set_state(&mut self, state: &[f64]) -> Result<(), JsValue> {
        let state = State::try_from(state).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.state = state.to_array();
        Ok(())
    }

    pub fn get_state(&self) -> Vec<f64> {
        self.state.to_vec()
    }

    pub fn set_t(&mut self, t: f64) {
        self.t = t;
    }

    pub fn get_t(&self) -> f64 {
        self.t
    }

    pub fn step(&mut self, dt: f64) {
        match &mut self.solver {
            SolverType::RK4(s) => s.step(&self.system, &mut self.t, &mut self.state, dt),
            SolverType::Dopri5(s) => s.step(&self.system, &mut self.t, &mut self.state, dt),
        }
    }

    /// Derivative at the current state.
    pub fn vector_field(&self) -> Vec<f64> {
        self.system.evaluate(self.t, &self.state)
    }

    /// Row-major 2x2 Jacobian at the current state.
    pub fn compute_jacobian(&self) -> Vec<f64> {
        jacobian(&self.params, State::from(self.state)).to_vec()
    }

    /// Coexistence point as `[x1, x2]`.
    pub fn equilibrium(&self) -> Result<Vec<f64>, JsValue> {
        coexistence(&self.params)
            .map(|s| s.to_array().to_vec())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::WasmLotkaVolterra;
    use wasm_bindgen_test::wasm_bindgen_test;

    #[wasm_bindgen_test]
    fn rejects_unknown_solver() {
        let err = WasmLotkaVolterra::new(6.0, 2.0, 2.0, 3.0, "euler")
            .err()
            .expect("unknown solver should fail");
        assert_eq!(err.as_string().as_deref(), Some("Unknown solver: euler"));
    }

    #[wasm_bindgen_test]
    fn rejects_wrong_state_length() {
        let mut model = WasmLotkaVolterra::new(6.0, 2.0, 2.0, 3.0, "rk4").expect("model");
        let err = model.set_state(&[1.0]).expect_err("one component");
        let message = err.as_string().expect("string error");
        assert!(message.contains("expected 2, got 1"), "{message}");
        assert_eq!(model.get_state(), vec![1.0, 1.0]);
    }

    #[wasm_bindgen_test]
    fn zero_beta_equilibrium_is_an_error() {
        let model = WasmLotkaVolterra::new(6.0, 0.0, 2.0, 3.0, "rk4").expect("model");
        let message = model
            .equilibrium()
            .expect_err("beta = 0")
            .as_string()
            .expect("string error");
        assert!(message.contains("beta"), "{message}");
    }
}
