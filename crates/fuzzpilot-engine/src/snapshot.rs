use crate::geometry::{MapSize, Vec2};

/// The controlled ship as seen by its controller.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipState {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Facing in degrees, counter-clockwise from +x.
    pub heading: f64,
    /// Signed speed along `heading`.
    pub speed: f64,
    pub radius: f64,
    pub lives: u32,
    pub can_fire: bool,
    /// The ship is inside its post-death invulnerability window.
    pub is_respawning: bool,
    pub thrust_range: (f64, f64),
    /// Bounds on the turn command, in degrees per second.
    pub turn_rate_range: (f64, f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AsteroidState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: u8,
    pub radius: f64,
}

/// Everything a controller observes on one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    pub ship: ShipState,
    pub asteroids: Vec<AsteroidState>,
    pub map_size: MapSize,
    /// Simulated time since the start of the run, in seconds.
    pub time: f64,
    /// Simulated time since the previous tick, in seconds.
    pub delta_time: f64,
    pub frame: u64,
}

/// What a controller asks the ship to do on one tick.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Action {
    pub thrust: f64,
    /// Degrees per second, positive is counter-clockwise.
    pub turn_rate: f64,
    pub fire: bool,
    pub deploy_mine: bool,
}

impl Action {
    /// No thrust, no turn, no fire.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            thrust: 0.0,
            turn_rate: 0.0,
            fire: false,
            deploy_mine: false,
        }
    }
}

/// An agent steering a ship.
///
/// The simulator calls [`Controller::actions`] once per tick. Implementations own their
/// per-run state, so one instance must never be shared between concurrent runs.
pub trait Controller: Send {
    fn name(&self) -> &str;

    fn actions(&mut self, snapshot: &GameSnapshot) -> Action;
}
