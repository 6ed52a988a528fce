//! Whole-run simulation and equilibrium analysis on the interactive wrapper.

use crate::system::WasmLotkaVolterra;
use anyhow::Context;
use js_sys::{Array, Float64Array};
use lotka_core::equilibrium::analyze_equilibria;
use lotka_core::model::State;
use lotka_core::{simulate_with, IntegratorSettings, SimulationRequest, Trajectory};
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

/// `undefined`/`null` select the defaults; anything else must deserialize into
/// [`IntegratorSettings`] (missing fields keep their defaults).
pub(crate) fn parse_settings(settings: JsValue) -> Result<IntegratorSettings, JsValue> {
    if settings.is_undefined() || settings.is_null() {
        return Ok(IntegratorSettings::default());
    }
    from_value(settings).map_err(|e| JsValue::from_str(&format!("Invalid settings: {e}")))
}

pub(crate) fn js_error(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{err:#}"))
}

impl WasmLotkaVolterra {
    /// Runs from the current state over [0, t_max]. The wrapper's own clock is
    /// not used or changed.
    pub(crate) fn run(
        &self,
        t_max: f64,
        n_points: u32,
        settings: IntegratorSettings,
    ) -> anyhow::Result<Trajectory> {
        let request = SimulationRequest::new(self.params, State::from(self.state))
            .with_horizon(t_max)
            .with_points(n_points as usize)
            .with_settings(settings);
        simulate_with(&request).context("Simulation failed")
    }
}

#[wasm_bindgen]
impl WasmLotkaVolterra {
    /// Serialized trajectory `{ times, prey, predator, stats }`.
    pub fn simulate(&self, t_max: f64, n_points: u32, settings: JsValue) -> Result<JsValue, JsValue> {
        let settings = parse_settings(settings)?;
        let trajectory = self.run(t_max, n_points, settings).map_err(js_error)?;
        to_value(&trajectory).map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
    }

    /// `[times, prey, predator]` as typed arrays for direct plotting.
    pub fn simulate_columns(
        &self,
        t_max: f64,
        n_points: u32,
        settings: JsValue,
    ) -> Result<Array, JsValue> {
        let settings = parse_settings(settings)?;
        let (times, prey, predator) = self
            .run(t_max, n_points, settings)
            .map_err(js_error)?
            .into_series();
        let columns = Array::new();
        for column in [times, prey, predator] {
            columns.push(&Float64Array::from(column.as_slice()));
        }
        Ok(columns)
    }

    pub fn analyze_equilibria(&self) -> Result<JsValue, JsValue> {
        let results = analyze_equilibria(&self.params)
            .context("Equilibrium analysis failed")
            .map_err(js_error)?;
        to_value(&results).map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_starts_from_current_state() {
        let mut model = WasmLotkaVolterra::new(6.0, 2.0, 2.0, 3.0, "rk4").expect("model");
        model.set_state(&[0.5, 2.0]).expect("state");
        model.set_t(7.0);

        let trajectory = model
            .run(5.0, 51, IntegratorSettings::default())
            .expect("run");
        assert_eq!(trajectory.len(), 51);
        let first = trajectory.first().expect("first");
        assert_eq!(first.t, 0.0);
        assert_eq!(first.state, State::new(0.5, 2.0));
        assert_eq!(model.get_t(), 7.0);
    }

    #[test]
    fn run_reports_invalid_request() {
        let model = WasmLotkaVolterra::new(6.0, 2.0, 2.0, 3.0, "rk4").expect("model");
        let err = model
            .run(10.0, 1, IntegratorSettings::default())
            .expect_err("one point");
        let message = format!("{err:#}");
        assert!(message.starts_with("Simulation failed"));
        assert!(message.contains("n_points"));
    }
}
