//! Game-simulation contract for the fuzzy pilot.
//!
//! The pilot core never simulates physics itself. It talks to a [`Simulator`] through the
//! types in this crate:
//!
//! - [`GameSnapshot`] - what a [`Controller`] observes each tick
//! - [`Action`] - what a controller returns each tick
//! - [`Scenario`] / [`ScenarioRegistry`] - named initial conditions
//! - [`ScoreSummary`] - per-team hits, deaths and accuracy once a run stops
//!
//! [`ArenaSimulator`] is a reference implementation used by the CLI and by
//! end-to-end tests.
//!
//! # Example
//!
//! ```
//! use fuzzpilot_engine::{
//!     Action, ArenaSimulator, Controller, GameSnapshot, RunLimits, ScenarioRegistry,
//!     Simulator,
//! };
//!
//! struct Idle;
//!
//! impl Controller for Idle {
//!     fn name(&self) -> &str {
//!         "idle"
//!     }
//!
//!     fn actions(&mut self, _snapshot: &GameSnapshot) -> Action {
//!         Action::neutral()
//!     }
//! }
//!
//! let registry = ScenarioRegistry::builtin();
//! let scenario = registry.get("tracking_test").unwrap();
//! let outcome = ArenaSimulator::default()
//!     .run(scenario, &mut Idle, &RunLimits::unlimited())
//!     .unwrap();
//! assert_eq!(outcome.score.teams[0].shots_fired, 0);
//! ```

pub use self::{
    arena::{ArenaSettings, ArenaSimulator},
    geometry::{MapSize, Vec2},
    scenario::{AsteroidField, AsteroidSpawn, Scenario, ScenarioError, ScenarioRegistry, ShipSpawn},
    score::{PerfData, ScoreSummary, SimulationOutcome, StopReason, TeamScore},
    simulator::{RunLimits, SimulationError, Simulator},
    snapshot::{Action, AsteroidState, Controller, GameSnapshot, ShipState},
};

pub mod arena;
pub mod geometry;
pub mod scenario;
pub mod score;
pub mod simulator;
pub mod snapshot;
