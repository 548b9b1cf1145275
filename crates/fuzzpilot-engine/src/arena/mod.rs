//! A small deterministic asteroids arena.
//!
//! The arena implements [`Simulator`] with Kessler-like rules: a toroidal map, a single
//! ship steered through [`Action`](crate::Action) commands, asteroids that split when
//! destroyed, and a post-death invulnerability window. Everything random is derived from
//! the scenario seed, so the same scenario and controller always produce the same score.
//!
//! # Tick order
//!
//! 1. Apply the controller's clamped thrust and turn, fire if allowed
//! 2. Move asteroids and bullets, expire old bullets
//! 3. Resolve bullet hits, then the ship collision
//!
//! The run stops on the scenario time limit, when the field is cleared, when the ship is
//! out of lives, or (if the scenario asks for it) when ammo runs out.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use self::world::World;
use crate::{
    scenario::Scenario,
    score::{PerfData, ScoreSummary, SimulationOutcome, StopReason, TeamScore},
    simulator::{RunLimits, SimulationError, Simulator},
    snapshot::Controller,
};

mod world;

/// Physical constants of the arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaSettings {
    pub tick_rate: u32,
    pub ship_radius: f64,
    pub thrust_range: (f64, f64),
    pub turn_rate_range: (f64, f64),
    pub max_speed: f64,
    /// Speed lost per second while coasting.
    pub drag: f64,
    pub bullet_speed: f64,
    /// Seconds a bullet stays alive.
    pub bullet_lifetime: f64,
    pub fire_cooldown: f64,
    pub respawn_time: f64,
    pub asteroid_radius_per_size: f64,
    /// Children leave at `±split_angle` degrees from the parent's heading.
    pub split_angle: f64,
    pub split_speed_factor: f64,
    pub random_speed_range: (f64, f64),
    /// Minimum distance between the ship and a randomly placed asteroid.
    pub spawn_clearance: f64,
}

impl Default for ArenaSettings {
    fn default() -> Self {
        Self {
            tick_rate: 30,
            ship_radius: 20.0,
            thrust_range: (-480.0, 480.0),
            turn_rate_range: (-180.0, 180.0),
            max_speed: 240.0,
            drag: 80.0,
            bullet_speed: 800.0,
            bullet_lifetime: 1.0,
            fire_cooldown: 0.1,
            respawn_time: 3.0,
            asteroid_radius_per_size: 8.0,
            split_angle: 15.0,
            split_speed_factor: 1.2,
            random_speed_range: (30.0, 120.0),
            spawn_clearance: 150.0,
        }
    }
}

impl ArenaSettings {
    #[must_use]
    pub fn asteroid_radius(&self, size: u8) -> f64 {
        f64::from(size) * self.asteroid_radius_per_size
    }

    #[must_use]
    pub fn delta_time(&self) -> f64 {
        1.0 / f64::from(self.tick_rate.max(1))
    }
}

#[derive(Debug, Default, Clone)]
pub struct ArenaSimulator {
    settings: ArenaSettings,
}

impl ArenaSimulator {
    #[must_use]
    pub fn new(settings: ArenaSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn settings(&self) -> &ArenaSettings {
        &self.settings
    }
}

impl Simulator for ArenaSimulator {
    fn run(
        &self,
        scenario: &Scenario,
        controller: &mut dyn Controller,
        limits: &RunLimits,
    ) -> Result<SimulationOutcome, SimulationError> {
        let start = Instant::now();
        let mut world = World::new(&self.settings, scenario)?;
        let dt = self.settings.delta_time();
        #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let max_frames = (scenario.time_limit / dt).round() as u64;
        let mut eval_time = Duration::ZERO;

        let stop_reason = loop {
            if !world.has_asteroids() {
                break StopReason::NoAsteroids;
            }
            if !world.has_lives() {
                break StopReason::NoLives;
            }
            if scenario.stop_if_no_ammo && world.is_out_of_ammo() {
                break StopReason::NoAmmo;
            }
            if world.frame() >= max_frames {
                break StopReason::TimeExpired;
            }
            if limits.is_expired() {
                log::debug!(
                    "{}: deadline reached at frame {}",
                    scenario.name,
                    world.frame()
                );
                return Err(SimulationError::Timeout {
                    frames: world.frame(),
                });
            }

            let snapshot = world.snapshot(dt);
            let tick = Instant::now();
            let action = controller.actions(&snapshot);
            eval_time += tick.elapsed();
            world.step(&action, dt);
        };

        let frames = world.frame();
        log::debug!(
            "{}: {} stopped ({stop_reason}) after {frames} frames",
            scenario.name,
            controller.name()
        );
        let team = TeamScore {
            name: controller.name().to_owned(),
            ..world.score().clone()
        };
        #[expect(clippy::cast_precision_loss)]
        let sim_time = frames as f64 * dt;
        let mean_eval_time = u32::try_from(frames)
            .ok()
            .and_then(|n| eval_time.checked_div(n))
            .unwrap_or_default();
        Ok(SimulationOutcome {
            score: ScoreSummary {
                teams: vec![team],
                stop_reason,
                sim_time,
                frames,
            },
            perf: PerfData {
                wall_time: start.elapsed(),
                mean_eval_time,
            },
        })
    }
}
