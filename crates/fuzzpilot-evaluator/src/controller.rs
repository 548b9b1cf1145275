//! Per-tick decision logic driven by a decoded [`FuzzyNetwork`].
//!
//! # Tick outline
//!
//! 1. No asteroids: forget tracks and shot memory, return a neutral action
//! 2. Update track identifiers
//! 3. Respawn countdown (3 s): full forward thrust for the first second, hold still for
//!    the second, then normal control
//! 4. Observe every asteroid, nearest first, and score its threat
//! 5. Maintain the shot memory (drop dead ids, cap its length)
//! 6. Re-evaluate the mode when the cooldown has elapsed
//! 7. Act:
//!    - **Offensive**: aim at the highest-threat asteroid not fired at recently, fire
//!      when the intercept heading is reachable this tick, and sum thrust contributions
//!      of asteroids within [`THRUST_RANGE`]
//!    - **Defensive**: if any asteroid within [`AVOIDANCE_RANGE`] scores above
//!      [`AVOIDANCE_THRESHOLD`], turn toward the widest gap between asteroid bearings
//!      without thrust or fire; otherwise behave as Offensive
//!
//! The mode switch uses the proximity threat, the sum of threats of asteroids closer than
//! [`PROXIMITY_RANGE`]. The ship goes Defensive when this exceeds
//! `MODE_THRESHOLD_GAIN × ThreatScale`, or while it is respawning.

use std::{collections::VecDeque, sync::Arc};

use fuzzpilot_engine::{Action, Controller, GameSnapshot, Vec2};

use crate::{
    features::{self, AsteroidFeatures},
    network::FuzzyNetwork,
    tracker::{AsteroidTracker, TrackId},
};

/// Ticks between two mode evaluations.
pub const MODE_COOLDOWN_TICKS: u32 = 30;
pub const PROXIMITY_RANGE: f64 = 400.0;
pub const THRUST_RANGE: f64 = 300.0;
pub const AVOIDANCE_RANGE: f64 = 400.0;
pub const MODE_THRESHOLD_GAIN: f64 = 20.0;
pub const AVOIDANCE_THRESHOLD: f64 = 0.5;
pub const THRUST_GAIN: f64 = 200.0;
/// Seconds of scripted movement after a respawn.
pub const RESPAWN_DURATION: f64 = 3.0;
pub const RESPAWN_THRUST: f64 = 1000.0;
pub const BULLET_SPEED: f64 = 800.0;
pub const SHOT_MEMORY_LIMIT: usize = 20;

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::IsVariant,
)]
pub enum Mode {
    #[default]
    Offensive,
    Defensive,
}

/// Maximum number of remembered targets when `asteroid_count` asteroids are on screen.
///
/// ```
/// # use fuzzpilot_evaluator::controller::shot_memory_limit;
/// assert_eq!(shot_memory_limit(1), 4);
/// assert_eq!(shot_memory_limit(10), 9);
/// assert_eq!(shot_memory_limit(100), 20);
/// ```
#[must_use]
pub fn shot_memory_limit(asteroid_count: usize) -> usize {
    (4 + asteroid_count / 2).min(SHOT_MEMORY_LIMIT)
}

/// Everything the controller carries from one tick to the next.
#[derive(Debug, Default, Clone)]
pub struct ControllerState {
    mode: Mode,
    cooldown: u32,
    shot_memory: VecDeque<TrackId>,
    tracker: AsteroidTracker,
    respawn_countdown: f64,
    elapsed: f64,
}

impl ControllerState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Ticks left before the mode is evaluated again.
    #[must_use]
    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }

    /// Recently targeted asteroids, oldest first.
    #[must_use]
    pub fn shot_memory(&self) -> &VecDeque<TrackId> {
        &self.shot_memory
    }

    #[must_use]
    pub fn tracker(&self) -> &AsteroidTracker {
        &self.tracker
    }

    #[must_use]
    pub fn respawn_countdown(&self) -> f64 {
        self.respawn_countdown
    }

    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

#[derive(Debug, Clone, Copy)]
struct Observation {
    id: TrackId,
    features: AsteroidFeatures,
    velocity: Vec2,
    threat: f64,
}

/// Computes the action for one tick and advances `state`.
#[must_use]
pub fn tick(
    network: &FuzzyNetwork,
    state: &mut ControllerState,
    snapshot: &GameSnapshot,
) -> Action {
    let dt = snapshot.delta_time;
    let ship = &snapshot.ship;
    state.elapsed += dt;

    if snapshot.asteroids.is_empty() {
        state.shot_memory.clear();
        state.tracker.clear();
        return Action::neutral();
    }

    let ids = state
        .tracker
        .update(&snapshot.asteroids, dt, snapshot.map_size);

    if ship.is_respawning {
        if state.respawn_countdown <= 0.0 {
            state.respawn_countdown = RESPAWN_DURATION;
        }
        state.respawn_countdown = (state.respawn_countdown - dt).max(0.0);
        if state.respawn_countdown > 2.0 {
            return Action {
                thrust: RESPAWN_THRUST,
                ..Action::neutral()
            };
        }
        if state.respawn_countdown > 1.0 {
            return Action::neutral();
        }
    } else {
        state.respawn_countdown = 0.0;
    }

    let mut observations: Vec<Observation> = snapshot
        .asteroids
        .iter()
        .zip(ids)
        .map(|(asteroid, id)| {
            let features = AsteroidFeatures::observe(ship, asteroid, snapshot.map_size);
            Observation {
                id,
                features,
                velocity: asteroid.velocity,
                threat: network.threat(&features),
            }
        })
        .collect();
    observations.sort_by(|a, b| a.features.distance.total_cmp(&b.features.distance));

    let proximity_threat: f64 = observations
        .iter()
        .filter(|o| o.features.distance < PROXIMITY_RANGE)
        .map(|o| o.threat)
        .sum();

    state
        .shot_memory
        .retain(|id| observations.iter().any(|o| o.id == *id));
    if observations.len() == 1 && state.elapsed % 1.0 < dt {
        state.shot_memory.clear();
    }
    let limit = shot_memory_limit(observations.len());
    while state.shot_memory.len() > limit {
        state.shot_memory.pop_front();
    }

    if state.cooldown == 0 {
        let threshold = MODE_THRESHOLD_GAIN * network.threat_scale();
        state.mode = if ship.is_respawning || proximity_threat > threshold {
            Mode::Defensive
        } else {
            Mode::Offensive
        };
        state.cooldown = MODE_COOLDOWN_TICKS;
        log::trace!(
            "frame {}: proximity threat {proximity_threat:.3} (threshold {threshold:.3}), mode {}",
            snapshot.frame,
            state.mode
        );
    } else {
        state.cooldown -= 1;
    }

    if state.mode.is_defensive()
        && let Some(action) = evade(network, snapshot, &observations)
    {
        return action;
    }
    attack(network, state, snapshot, &observations)
}

fn evade(
    network: &FuzzyNetwork,
    snapshot: &GameSnapshot,
    observations: &[Observation],
) -> Option<Action> {
    let max_avoidance = observations
        .iter()
        .take_while(|o| o.features.distance <= AVOIDANCE_RANGE)
        .map(|o| network.avoidance(&o.features))
        .max_by(f64::total_cmp)?;
    if max_avoidance <= AVOIDANCE_THRESHOLD {
        return None;
    }

    let headings: Vec<f64> = observations
        .iter()
        .map(|o| o.features.relative_heading)
        .collect();
    let gap = features::largest_gap_center(&headings)?;
    let ship = &snapshot.ship;
    let turn = features::turn_toward(
        ship.heading,
        ship.heading + gap * 360.0,
        ship.turn_rate_range,
        snapshot.delta_time,
    );
    Some(Action {
        turn_rate: turn.turn_rate,
        ..Action::neutral()
    })
}

fn attack(
    network: &FuzzyNetwork,
    state: &mut ControllerState,
    snapshot: &GameSnapshot,
    observations: &[Observation],
) -> Action {
    let ship = &snapshot.ship;
    let mut action = Action::neutral();

    let target = observations
        .iter()
        .filter(|o| !state.shot_memory.contains(&o.id))
        .max_by(|a, b| a.threat.total_cmp(&b.threat));
    if let Some(target) = target {
        let heading = features::intercept_heading(
            target.features.offset,
            target.velocity - ship.velocity,
            BULLET_SPEED,
            snapshot.delta_time,
        );
        let turn = features::turn_toward(
            ship.heading,
            heading,
            ship.turn_rate_range,
            snapshot.delta_time,
        );
        action.turn_rate = turn.turn_rate;
        if turn.on_target && ship.can_fire {
            action.fire = true;
            state.shot_memory.push_back(target.id);
        }
    }

    let thrust: f64 = observations
        .iter()
        .take_while(|o| o.features.distance <= THRUST_RANGE)
        .map(|o| network.thrust_contribution(&o.features) - 0.5)
        .sum();
    action.thrust = thrust * THRUST_GAIN * network.thrust_scale();
    action
}

/// A [`Controller`] backed by a shared network and its own private state.
#[derive(Debug, Clone)]
pub struct FuzzyController {
    name: String,
    network: Arc<FuzzyNetwork>,
    state: ControllerState,
}

impl FuzzyController {
    #[must_use]
    pub fn new(name: impl Into<String>, network: Arc<FuzzyNetwork>) -> Self {
        Self {
            name: name.into(),
            network,
            state: ControllerState::new(),
        }
    }

    #[must_use]
    pub fn network(&self) -> &Arc<FuzzyNetwork> {
        &self.network
    }

    #[must_use]
    pub fn state(&self) -> &ControllerState {
        &self.state
    }
}

impl Controller for FuzzyController {
    fn name(&self) -> &str {
        &self.name
    }

    fn actions(&mut self, snapshot: &GameSnapshot) -> Action {
        tick(&self.network, &mut self.state, snapshot)
    }
}

#[cfg(test)]
mod tests {
    use fuzzpilot_engine::{AsteroidState, MapSize, ShipState};

    use super::*;
    use crate::{
        network::tests::uniform_genes,
        schema::{ChromosomeSchema, SlotName},
    };

    const DT: f64 = 1.0 / 30.0;

    /// Threat and avoidance are `threat`/`avoid` everywhere, thrust blocks add `thrust - 0.5`
    /// per close asteroid.
    fn network(threat: f64, avoid: f64, thrust: f64) -> FuzzyNetwork {
        let schema = ChromosomeSchema::standard();
        let genes = uniform_genes(
            &schema,
            |_| 0.5,
            |name| match name {
                SlotName::ThreatCombined => threat,
                SlotName::AvoidDecision => avoid,
                SlotName::Thrust => thrust,
                _ => 0.5,
            },
        );
        FuzzyNetwork::decode(&schema, &genes).unwrap()
    }

    fn ship() -> ShipState {
        ShipState {
            position: Vec2::new(500.0, 400.0),
            velocity: Vec2::ZERO,
            heading: 0.0,
            speed: 0.0,
            radius: 20.0,
            lives: 3,
            can_fire: true,
            is_respawning: false,
            thrust_range: (-480.0, 480.0),
            turn_rate_range: (-180.0, 180.0),
        }
    }

    fn asteroid(x: f64, y: f64) -> AsteroidState {
        AsteroidState {
            position: Vec2::new(x, y),
            velocity: Vec2::ZERO,
            size: 2,
            radius: 16.0,
        }
    }

    fn snapshot(ship: ShipState, asteroids: Vec<AsteroidState>, frame: u64) -> GameSnapshot {
        #[expect(clippy::cast_precision_loss)]
        let time = frame as f64 * DT;
        GameSnapshot {
            ship,
            asteroids,
            map_size: MapSize::default(),
            time,
            delta_time: DT,
            frame,
        }
    }

    #[test]
    fn test_no_asteroids_is_neutral() {
        let network = network(0.5, 0.5, 0.5);
        let mut state = ControllerState::new();
        let _ = tick(&network, &mut state, &snapshot(ship(), vec![asteroid(700.0, 400.0)], 0));
        assert_eq!(state.tracker().len(), 1);

        let action = tick(&network, &mut state, &snapshot(ship(), vec![], 1));
        assert_eq!(action, Action::neutral());
        assert!(state.tracker().is_empty());
        assert!(state.shot_memory().is_empty());
    }

    #[test]
    fn test_respawn_phases() {
        let network = network(0.5, 0.5, 0.5);
        let mut state = ControllerState::new();
        let respawning = ShipState {
            is_respawning: true,
            can_fire: false,
            ..ship()
        };
        let mut actions = Vec::new();
        for frame in 0..90 {
            let s = snapshot(respawning.clone(), vec![asteroid(800.0, 400.0)], frame);
            actions.push(tick(&network, &mut state, &s));
        }
        assert_eq!(actions[10].thrust, RESPAWN_THRUST);
        assert_eq!(actions[45], Action::neutral());
        assert_ne!(actions[75].thrust, RESPAWN_THRUST);
        assert!(state.respawn_countdown() <= 1.0);
        // Respawning forces defensive mode once control resumes.
        assert!(state.mode().is_defensive());

        let _ = tick(&network, &mut state, &snapshot(ship(), vec![asteroid(800.0, 400.0)], 90));
        assert_eq!(state.respawn_countdown(), 0.0);
    }

    #[test]
    fn test_fires_at_target_ahead_and_remembers_it() {
        let network = network(0.5, 0.5, 0.5);
        let mut state = ControllerState::new();
        let action = tick(&network, &mut state, &snapshot(ship(), vec![asteroid(700.0, 400.0)], 0));
        assert!(action.fire);
        assert!(action.turn_rate.abs() < 1e-6);
        assert_eq!(state.shot_memory().len(), 1);
        assert_eq!(state.mode(), Mode::Offensive);

        // The only asteroid is remembered, so nothing else is targeted next tick.
        let action = tick(&network, &mut state, &snapshot(ship(), vec![asteroid(700.0, 400.0)], 1));
        assert!(!action.fire);
        assert_eq!(action.turn_rate, 0.0);
    }

    #[test]
    fn test_turns_toward_target_off_axis() {
        let network = network(0.5, 0.5, 0.5);
        let mut state = ControllerState::new();
        let action = tick(&network, &mut state, &snapshot(ship(), vec![asteroid(500.0, 600.0)], 0));
        assert!(!action.fire);
        assert_eq!(action.turn_rate, 180.0);
        assert!(state.shot_memory().is_empty());
    }

    #[test]
    fn test_thrust_sums_close_asteroids() {
        let network = network(0.5, 0.5, 0.8);
        let mut state = ControllerState::new();
        let asteroids = vec![
            asteroid(600.0, 400.0),
            asteroid(500.0, 250.0),
            // Outside the thrust range.
            asteroid(500.0, 50.0),
        ];
        let action = tick(&network, &mut state, &snapshot(ship(), asteroids, 0));
        let expected = 2.0 * (0.8 - 0.5) * THRUST_GAIN * 0.5;
        assert!((action.thrust - expected).abs() < 1e-6, "{}", action.thrust);
    }

    #[test]
    fn test_defensive_steers_into_largest_gap() {
        // Threat 1.0 per asteroid against a threshold of 20 × 0.5: twelve close asteroids
        // switch the ship to defensive.
        let network = network(1.0, 0.9, 0.5);
        let mut state = ControllerState::new();
        let asteroids: Vec<_> = (0..12)
            .map(|i| {
                // Bearings spread over 0..165 degrees, leaving the gap behind-right.
                let p = Vec2::new(500.0, 400.0) + Vec2::from_polar(f64::from(i) * 15.0, 150.0);
                asteroid(p.x, p.y)
            })
            .collect();
        let action = tick(&network, &mut state, &snapshot(ship(), asteroids, 0));
        assert_eq!(state.mode(), Mode::Defensive);
        assert!(!action.fire);
        assert_eq!(action.thrust, 0.0);
        // The gap center is at 262.5 degrees, reached fastest clockwise.
        assert_eq!(action.turn_rate, -180.0);
    }

    #[test]
    fn test_defensive_falls_back_to_attack() {
        let network = network(1.0, 0.2, 0.5);
        let mut state = ControllerState::new();
        let asteroids: Vec<_> = (0..12)
            .map(|i| {
                let p = Vec2::new(500.0, 400.0) + Vec2::from_polar(f64::from(i) * 15.0, 150.0);
                asteroid(p.x, p.y)
            })
            .collect();
        let action = tick(&network, &mut state, &snapshot(ship(), asteroids, 0));
        assert_eq!(state.mode(), Mode::Defensive);
        // Every threat is equal, so any asteroid may be the target.
        assert!(action.turn_rate.abs() <= 180.0);
        assert!(action.thrust.abs() < 1e-6);
    }

    #[test]
    fn test_mode_cooldown_suppresses_switch() {
        let calm = network(0.0, 0.9, 0.5);
        let mut state = ControllerState::new();
        let far = vec![asteroid(900.0, 700.0)];
        let _ = tick(&calm, &mut state, &snapshot(ship(), far.clone(), 0));
        assert_eq!(state.mode(), Mode::Offensive);
        assert_eq!(state.cooldown(), MODE_COOLDOWN_TICKS);

        let scared = network(1.0, 0.9, 0.5);
        let crowd: Vec<_> = (0..12).map(|i| asteroid(550.0 + f64::from(i), 300.0)).collect();
        for frame in 1..=u64::from(MODE_COOLDOWN_TICKS) {
            let _ = tick(&scared, &mut state, &snapshot(ship(), crowd.clone(), frame));
            assert_eq!(state.mode(), Mode::Offensive);
        }
        assert_eq!(state.cooldown(), 0);
        let _ = tick(&scared, &mut state, &snapshot(ship(), crowd, 31));
        assert_eq!(state.mode(), Mode::Defensive);
    }

    #[test]
    fn test_shot_memory_is_capped_and_pruned() {
        let network = network(0.5, 0.5, 0.5);
        let mut state = ControllerState::new();
        state.shot_memory.extend(100..110);
        let asteroids = vec![asteroid(700.0, 400.0), asteroid(200.0, 100.0)];
        let _ = tick(&network, &mut state, &snapshot(ship(), asteroids, 0));
        // Stale ids are gone; at most the new target remains.
        assert!(state.shot_memory().iter().all(|id| *id < 100));
        assert!(state.shot_memory().len() <= shot_memory_limit(2));
    }

    #[test]
    fn test_controllers_share_network_not_state() {
        let network = Arc::new(network(0.5, 0.5, 0.5));
        let mut a = FuzzyController::new("a", Arc::clone(&network));
        let b = FuzzyController::new("b", Arc::clone(&network));
        let _ = a.actions(&snapshot(ship(), vec![asteroid(700.0, 400.0)], 0));
        assert_eq!(a.state().shot_memory().len(), 1);
        assert!(b.state().shot_memory().is_empty());
        assert_eq!(a.name(), "a");
        assert!(Arc::ptr_eq(a.network(), b.network()));
    }
}
