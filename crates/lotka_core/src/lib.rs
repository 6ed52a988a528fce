//! The `lotka_core` crate is the numerical engine behind the predator-prey notebooks.
//! It integrates the Lotka-Volterra system with an adaptive Dormand-Prince pair and
//! exposes the closed-form coexistence equilibrium.
//!
//! Key components:
//! - **Traits**: `Scalar` (numeric type abstraction), `DynamicalSystem` (ODEs), `Steppable` (fixed-step solvers).
//! - **Model**: the vector field, its Jacobian and the conserved quantity.
//! - **Solvers / Integrator**: RK4, Dormand-Prince 5(4) with dense output, and the adaptive driver `solve_ivp`.
//! - **Simulation**: `simulate` and its structured form `simulate_with`.
//! - **Equilibrium**: fixed points and their linear stability.
//! - **Analysis / Scenario**: post-processing of trajectories and composed runs.
pub mod analysis;
pub mod equilibrium;
pub mod error;
pub mod integrator;
pub mod model;
pub mod scenario;
pub mod simulation;
pub mod solvers;
pub mod traits;

pub use equilibrium::equilibrium;
pub use error::{DomainError, SimulationError};
pub use integrator::IntegratorSettings;
pub use model::{vector_field, LotkaVolterra, Parameters, State};
pub use simulation::{simulate, simulate_with, SimulationRequest, Trajectory};
