//! Session evaluation: fitness of a chromosome over whole simulated games.
//!
//! A [`FitnessEvaluator`] decodes a chromosome once, then plays every configured scenario
//! a fixed number of times, each run with a fresh [`FuzzyController`] so no per-tick state
//! leaks between runs. The per-run scores are summed.
//!
//! Repetitions of a randomly generated scenario play different fields: run `n` uses the
//! scenario seed plus `n` (see [`Scenario::repetition`]). Fixed fields repeat as given.
//!
//! # Fitness Functions
//!
//! Every preset has the same shape, applied per team and summed:
//!
//! ```text
//! fitness = hits_term - death_coefficient × deaths^death_exponent
//!
//! where:
//!   hits_term = asteroids_hit                (plain presets)
//!   hits_term = asteroids_hit × accuracy     (accuracy-weighted presets)
//!   accuracy  = bullets_hit / shots_fired
//! ```
//!
//! | preset | formula |
//! |---|---|
//! | [`Cubic`](FitnessPreset::Cubic) (default) | `hits - 10·deaths³` |
//! | [`Quintic`](FitnessPreset::Quintic) | `hits - 3·deaths⁵` |
//! | [`Quadratic`](FitnessPreset::Quadratic) | `hits - 10·deaths²` |
//! | [`AccuracyQuintic`](FitnessPreset::AccuracyQuintic) | `hits·accuracy - 3·deaths⁵` |
//!
//! **Characteristics:**
//!
//! - The first death is cheap, later deaths dominate: a pilot trading one life for many
//!   hits still scores well, a pilot that keeps dying does not
//! - Higher exponents punish reckless play harder
//! - Accuracy weighting discourages spraying bullets
//!
//! # Failures
//!
//! A chromosome that does not decode, a simulator error, a wall-clock timeout or a panic
//! anywhere inside a run all yield [`MIN_FITNESS`] for the whole chromosome, logged at
//! `warn`. One pathological individual never aborts a generation. [`MIN_FITNESS`] is the
//! genetic search's own failure score, so the two can never disagree.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use fuzzpilot_engine::{ArenaSimulator, ScenarioRegistry};
//! use fuzzpilot_evaluator::{schema::ChromosomeSchema, session_evaluator::FitnessEvaluator};
//!
//! let scenarios = ScenarioRegistry::builtin().select(&["random_repeatable"]).unwrap();
//! let evaluator = FitnessEvaluator::new(
//!     Arc::new(ArenaSimulator::default()),
//!     ChromosomeSchema::standard(),
//!     scenarios,
//! )
//! .with_runs(3);
//! let fitness = evaluator.evaluate(&[0.5; 68]);
//! ```

use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    time::Duration,
};

use fuzzpilot_engine::{
    RunLimits, Scenario, ScoreSummary, SimulationError, SimulationOutcome, Simulator,
};
use serde::{Deserialize, Serialize};

use crate::{
    controller::FuzzyController,
    network::{DecodeError, FuzzyNetwork},
    schema::ChromosomeSchema,
};

/// Fitness assigned to chromosomes that cannot be evaluated.
pub use fuzzpilot_training::genetic::MIN_FITNESS;

/// Coefficients of the fitness formula.
///
/// Custom coefficients can be given in JSON; missing fields take the cubic preset's values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessPolicy {
    pub hit_weight: f64,
    /// Multiply hits by shot accuracy.
    pub accuracy_weighted: bool,
    pub death_coefficient: f64,
    pub death_exponent: i32,
}

impl Default for FitnessPolicy {
    fn default() -> Self {
        Self::CUBIC
    }
}

impl FitnessPolicy {
    pub const CUBIC: Self = Self {
        hit_weight: 1.0,
        accuracy_weighted: false,
        death_coefficient: 10.0,
        death_exponent: 3,
    };
    pub const QUINTIC: Self = Self {
        hit_weight: 1.0,
        accuracy_weighted: false,
        death_coefficient: 3.0,
        death_exponent: 5,
    };
    pub const QUADRATIC: Self = Self {
        hit_weight: 1.0,
        accuracy_weighted: false,
        death_coefficient: 10.0,
        death_exponent: 2,
    };
    pub const ACCURACY_QUINTIC: Self = Self {
        hit_weight: 1.0,
        accuracy_weighted: true,
        death_coefficient: 3.0,
        death_exponent: 5,
    };

    /// Scores one finished run.
    ///
    /// ```
    /// # use fuzzpilot_engine::{ScoreSummary, StopReason, TeamScore};
    /// # use fuzzpilot_evaluator::session_evaluator::FitnessPolicy;
    /// let summary = ScoreSummary {
    ///     teams: vec![TeamScore { asteroids_hit: 25, deaths: 2, ..TeamScore::default() }],
    ///     stop_reason: StopReason::TimeExpired,
    ///     sim_time: 60.0,
    ///     frames: 1800,
    /// };
    /// assert_eq!(FitnessPolicy::CUBIC.score(&summary), 25.0 - 80.0);
    /// assert_eq!(FitnessPolicy::QUADRATIC.score(&summary), 25.0 - 40.0);
    /// ```
    #[must_use]
    pub fn score(&self, summary: &ScoreSummary) -> f64 {
        summary
            .teams
            .iter()
            .map(|team| {
                let mut hits = self.hit_weight * f64::from(team.asteroids_hit);
                if self.accuracy_weighted {
                    hits *= team.accuracy();
                }
                hits - self.death_coefficient * f64::from(team.deaths).powi(self.death_exponent)
            })
            .sum()
    }
}

/// Named [`FitnessPolicy`] presets, parsed case-insensitively from their variant names.
///
/// In JSON they are written in `snake_case`, e.g. `"accuracy_quintic"`.
#[derive(
    Default,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    derive_more::Display,
    derive_more::FromStr,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FitnessPreset {
    #[default]
    Cubic,
    Quintic,
    Quadratic,
    AccuracyQuintic,
}

impl FitnessPreset {
    #[must_use]
    pub fn policy(self) -> FitnessPolicy {
        match self {
            Self::Cubic => FitnessPolicy::CUBIC,
            Self::Quintic => FitnessPolicy::QUINTIC,
            Self::Quadratic => FitnessPolicy::QUADRATIC,
            Self::AccuracyQuintic => FitnessPolicy::ACCURACY_QUINTIC,
        }
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::IsVariant)]
pub enum EvaluationError {
    #[display("failed to decode chromosome")]
    Decode(DecodeError),
    #[display("simulation failed")]
    Simulation(SimulationError),
    #[display("simulation panicked: {message}")]
    Panicked { message: String },
}

/// Plays scenarios with a decoded chromosome and reduces the results to a fitness.
#[derive(Clone)]
pub struct FitnessEvaluator {
    simulator: Arc<dyn Simulator>,
    schema: ChromosomeSchema,
    scenarios: Vec<Scenario>,
    runs_per_scenario: usize,
    policy: FitnessPolicy,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for FitnessEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FitnessEvaluator")
            .field("schema", &self.schema)
            .field(
                "scenarios",
                &self.scenarios.iter().map(|s| &s.name).collect::<Vec<_>>(),
            )
            .field("runs_per_scenario", &self.runs_per_scenario)
            .field("policy", &self.policy)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl FitnessEvaluator {
    /// One run per scenario, [`FitnessPolicy::CUBIC`], no timeout.
    #[must_use]
    pub fn new(
        simulator: Arc<dyn Simulator>,
        schema: ChromosomeSchema,
        scenarios: Vec<Scenario>,
    ) -> Self {
        Self {
            simulator,
            schema,
            scenarios,
            runs_per_scenario: 1,
            policy: FitnessPolicy::default(),
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_runs(mut self, runs_per_scenario: usize) -> Self {
        self.runs_per_scenario = runs_per_scenario;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: FitnessPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Wall-clock budget of each single run.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn schema(&self) -> &ChromosomeSchema {
        &self.schema
    }

    #[must_use]
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    #[must_use]
    pub fn policy(&self) -> FitnessPolicy {
        self.policy
    }

    /// Total fitness of `genes` over every scenario and run, or [`MIN_FITNESS`] when any
    /// run fails.
    #[must_use]
    pub fn evaluate(&self, genes: &[f64]) -> f64 {
        match self.try_evaluate(genes) {
            Ok(fitness) => fitness,
            Err(err) => {
                log::warn!("chromosome scored {MIN_FITNESS}: {}", error_chain(&err));
                MIN_FITNESS
            }
        }
    }

    /// Like [`Self::evaluate`], but reports why a chromosome could not be scored.
    pub fn try_evaluate(&self, genes: &[f64]) -> Result<f64, EvaluationError> {
        let network = Arc::new(
            FuzzyNetwork::decode(&self.schema, genes).map_err(EvaluationError::Decode)?,
        );
        let mut fitness = 0.0;
        for scenario in &self.scenarios {
            for run in 0..self.runs_per_scenario {
                let scenario = scenario.repetition(run as u64);
                let outcome = self.run_once(&network, &scenario)?;
                fitness += self.policy.score(&outcome.score);
            }
        }
        Ok(fitness)
    }

    /// Plays `scenario` once with a fresh controller.
    pub fn run_once(
        &self,
        network: &Arc<FuzzyNetwork>,
        scenario: &Scenario,
    ) -> Result<SimulationOutcome, EvaluationError> {
        let mut controller = FuzzyController::new("fuzzpilot", Arc::clone(network));
        let limits = self
            .timeout
            .map_or_else(RunLimits::unlimited, RunLimits::with_timeout);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.simulator.run(scenario, &mut controller, &limits)
        }));
        match result {
            Ok(outcome) => outcome.map_err(EvaluationError::Simulation),
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(ToString::to_string)
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_owned());
                Err(EvaluationError::Panicked { message })
            }
        }
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use fuzzpilot_engine::{
        AsteroidField, Controller, GameSnapshot, MapSize, ScenarioRegistry, ShipState,
        StopReason, TeamScore, Vec2,
    };
    use fuzzpilot_training::genetic;

    use super::*;

    /// Returns a fixed score after letting the controller see one empty frame.
    struct StubSimulator {
        team: TeamScore,
        runs: AtomicUsize,
    }

    impl StubSimulator {
        fn new(asteroids_hit: u32, deaths: u32) -> Self {
            Self {
                team: TeamScore {
                    asteroids_hit,
                    deaths,
                    shots_fired: 4,
                    bullets_hit: 2,
                    ..TeamScore::default()
                },
                runs: AtomicUsize::new(0),
            }
        }
    }

    impl Simulator for StubSimulator {
        fn run(
            &self,
            _scenario: &Scenario,
            controller: &mut dyn Controller,
            _limits: &RunLimits,
        ) -> Result<SimulationOutcome, SimulationError> {
            self.runs.fetch_add(1, Ordering::Relaxed);
            let snapshot = GameSnapshot {
                ship: ShipState {
                    position: Vec2::new(500.0, 400.0),
                    velocity: Vec2::ZERO,
                    heading: 90.0,
                    speed: 0.0,
                    radius: 20.0,
                    lives: 3,
                    can_fire: true,
                    is_respawning: false,
                    thrust_range: (-480.0, 480.0),
                    turn_rate_range: (-180.0, 180.0),
                },
                asteroids: vec![],
                map_size: MapSize::default(),
                time: 0.0,
                delta_time: 1.0 / 30.0,
                frame: 0,
            };
            let _ = controller.actions(&snapshot);
            Ok(SimulationOutcome {
                score: ScoreSummary {
                    teams: vec![TeamScore {
                        name: controller.name().to_owned(),
                        ..self.team.clone()
                    }],
                    stop_reason: StopReason::TimeExpired,
                    sim_time: 1.0,
                    frames: 30,
                },
                perf: Default::default(),
            })
        }
    }

    /// Records the asteroid seed of every random field it is asked to play.
    struct SeedRecorder {
        inner: StubSimulator,
        seeds: Mutex<Vec<u64>>,
    }

    impl Simulator for SeedRecorder {
        fn run(
            &self,
            scenario: &Scenario,
            controller: &mut dyn Controller,
            limits: &RunLimits,
        ) -> Result<SimulationOutcome, SimulationError> {
            if let AsteroidField::Random { seed, .. } = scenario.asteroids {
                self.seeds.lock().unwrap().push(seed);
            }
            self.inner.run(scenario, controller, limits)
        }
    }

    struct FailingSimulator;

    impl Simulator for FailingSimulator {
        fn run(
            &self,
            _scenario: &Scenario,
            _controller: &mut dyn Controller,
            _limits: &RunLimits,
        ) -> Result<SimulationOutcome, SimulationError> {
            Err(SimulationError::Timeout { frames: 12 })
        }
    }

    struct PanickingSimulator;

    impl Simulator for PanickingSimulator {
        fn run(
            &self,
            _scenario: &Scenario,
            _controller: &mut dyn Controller,
            _limits: &RunLimits,
        ) -> Result<SimulationOutcome, SimulationError> {
            panic!("asteroid escaped the map");
        }
    }

    fn scenarios(names: &[&str]) -> Vec<Scenario> {
        ScenarioRegistry::builtin().select(names).unwrap()
    }

    #[test]
    fn test_presets_parse_and_score() {
        assert_eq!("cubic".parse::<FitnessPreset>().unwrap(), FitnessPreset::Cubic);
        assert_eq!(
            "AccuracyQuintic".parse::<FitnessPreset>().unwrap(),
            FitnessPreset::AccuracyQuintic
        );
        assert!("cubes".parse::<FitnessPreset>().is_err());
        assert_eq!(
            serde_json::from_str::<FitnessPreset>(r#""accuracy_quintic""#).unwrap(),
            FitnessPreset::AccuracyQuintic
        );
        assert_eq!(FitnessPreset::default().policy(), FitnessPolicy::CUBIC);

        let summary = ScoreSummary {
            teams: vec![TeamScore {
                asteroids_hit: 20,
                deaths: 1,
                shots_fired: 40,
                bullets_hit: 10,
                ..TeamScore::default()
            }],
            stop_reason: StopReason::NoAsteroids,
            sim_time: 10.0,
            frames: 300,
        };
        assert_eq!(FitnessPreset::Quintic.policy().score(&summary), 17.0);
        assert_eq!(FitnessPreset::AccuracyQuintic.policy().score(&summary), 2.0);
    }

    #[test]
    fn test_sums_over_scenarios_and_runs() {
        let simulator = Arc::new(StubSimulator::new(30, 1));
        let evaluator = FitnessEvaluator::new(
            Arc::clone(&simulator) as Arc<dyn Simulator>,
            ChromosomeSchema::standard(),
            scenarios(&["one_asteroid", "cross"]),
        )
        .with_runs(3);
        assert_eq!(evaluator.evaluate(&[0.5; 68]), 6.0 * 20.0);
        assert_eq!(simulator.runs.load(Ordering::Relaxed), 6);
    }

    #[test]
    fn test_repeated_runs_play_fresh_random_fields() {
        let simulator = Arc::new(SeedRecorder {
            inner: StubSimulator::new(10, 0),
            seeds: Mutex::new(vec![]),
        });
        let evaluator = FitnessEvaluator::new(
            Arc::clone(&simulator) as Arc<dyn Simulator>,
            ChromosomeSchema::standard(),
            scenarios(&["random_repeatable", "one_asteroid"]),
        )
        .with_runs(3);
        assert_eq!(evaluator.evaluate(&[0.5; 68]), 6.0 * 10.0);
        assert_eq!(*simulator.seeds.lock().unwrap(), [1, 2, 3]);
        assert_eq!(simulator.inner.runs.load(Ordering::Relaxed), 6);

        // A second evaluation replays the same fields.
        simulator.seeds.lock().unwrap().clear();
        let _ = evaluator.evaluate(&[0.5; 68]);
        assert_eq!(*simulator.seeds.lock().unwrap(), [1, 2, 3]);
    }

    #[test]
    fn test_failure_score_matches_genetic_search() {
        let evaluator = FitnessEvaluator::new(
            Arc::new(FailingSimulator),
            ChromosomeSchema::standard(),
            scenarios(&["one_asteroid"]),
        );
        assert_eq!(evaluator.evaluate(&[0.5; 68]), genetic::MIN_FITNESS);
    }

    #[test]
    fn test_custom_policy_from_json() {
        let policy: FitnessPolicy =
            serde_json::from_str(r#"{ "death_coefficient": 50.0, "death_exponent": 1 }"#)
                .unwrap();
        assert_eq!(
            policy,
            FitnessPolicy {
                death_coefficient: 50.0,
                death_exponent: 1,
                ..FitnessPolicy::CUBIC
            }
        );
        let summary = ScoreSummary {
            teams: vec![TeamScore {
                asteroids_hit: 80,
                deaths: 1,
                ..TeamScore::default()
            }],
            stop_reason: StopReason::TimeExpired,
            sim_time: 60.0,
            frames: 1800,
        };
        assert_eq!(policy.score(&summary), 30.0);
    }

    #[test]
    fn test_decode_failure_scores_minimum() {
        let simulator = Arc::new(StubSimulator::new(30, 0));
        let evaluator = FitnessEvaluator::new(
            Arc::clone(&simulator) as Arc<dyn Simulator>,
            ChromosomeSchema::standard(),
            scenarios(&["one_asteroid"]),
        );
        assert_eq!(evaluator.evaluate(&[0.5; 67]), MIN_FITNESS);
        assert!(evaluator.try_evaluate(&[0.5; 69]).unwrap_err().is_decode());
        assert_eq!(simulator.runs.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_simulation_failure_scores_minimum() {
        let evaluator = FitnessEvaluator::new(
            Arc::new(FailingSimulator),
            ChromosomeSchema::standard(),
            scenarios(&["one_asteroid"]),
        );
        assert_eq!(evaluator.evaluate(&[0.5; 68]), MIN_FITNESS);
        assert!(evaluator.try_evaluate(&[0.5; 68]).unwrap_err().is_simulation());
    }

    #[test]
    fn test_panic_scores_minimum() {
        let evaluator = FitnessEvaluator::new(
            Arc::new(PanickingSimulator),
            ChromosomeSchema::standard(),
            scenarios(&["one_asteroid"]),
        );
        assert_eq!(evaluator.evaluate(&[0.5; 68]), MIN_FITNESS);
        match evaluator.try_evaluate(&[0.5; 68]) {
            Err(EvaluationError::Panicked { message }) => {
                assert_eq!(message, "asteroid escaped the map");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_arena_end_to_end() {
        let short: Vec<Scenario> = scenarios(&["tracking_test", "one_asteroid"])
            .into_iter()
            .map(|s| Scenario {
                time_limit: 3.0,
                ..s
            })
            .collect();
        let evaluator = FitnessEvaluator::new(
            Arc::new(fuzzpilot_engine::ArenaSimulator::default()),
            ChromosomeSchema::standard(),
            short,
        )
        .with_policy(FitnessPolicy::QUADRATIC)
        .with_timeout(Some(Duration::from_secs(60)));
        let genes = [0.5; 68];
        let a = evaluator.try_evaluate(&genes).unwrap();
        let b = evaluator.try_evaluate(&genes).unwrap();
        assert!(a.is_finite());
        assert!(a > MIN_FITNESS);
        assert_eq!(a, b);
    }
}
