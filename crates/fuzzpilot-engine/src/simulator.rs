use std::time::{Duration, Instant};

use crate::{scenario::Scenario, score::SimulationOutcome, snapshot::Controller};

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::IsVariant)]
pub enum SimulationError {
    #[display("simulation exceeded its wall-clock budget after {frames} frames")]
    Timeout { frames: u64 },
    #[display("invalid scenario {name}: {reason}")]
    InvalidScenario { name: String, reason: String },
}

/// Cooperative limits a simulator checks while running.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunLimits {
    deadline: Option<Instant>,
}

impl RunLimits {
    #[must_use]
    pub const fn unlimited() -> Self {
        Self { deadline: None }
    }

    /// A deadline `timeout` from now.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(timeout),
        }
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Runs one game of `scenario` with `controller` steering the ship.
///
/// Simulators are shared across evaluation threads; all per-run state lives inside
/// `run` and the controller.
pub trait Simulator: Send + Sync {
    fn run(
        &self,
        scenario: &Scenario,
        controller: &mut dyn Controller,
        limits: &RunLimits,
    ) -> Result<SimulationOutcome, SimulationError>;
}
