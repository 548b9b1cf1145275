//! Situational geometry shared by the controller.
//!
//! Raw quantities (offsets, closure rates, bearings) are computed here in world units;
//! [`AsteroidFeatures`] additionally carries the unit-interval values fed to the fuzzy
//! blocks.

use fuzzpilot_engine::{AsteroidState, MapSize, ShipState, Vec2};
use fuzzpilot_fuzzy::normalize::{linear_unit, saturating_ratio};

/// Distance at which the proximity input saturates to 1.
pub const PROXIMITY_SCALE: f64 = 50.0;
/// Closure rates are mapped from this range onto `[0, 1]`.
pub const CLOSURE_RANGE: (f64, f64) = (-200.0, 200.0);
pub const MAX_ASTEROID_SIZE: f64 = 4.0;

/// One asteroid as seen from the ship.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AsteroidFeatures {
    /// Shortest toroidal offset from the ship to the asteroid.
    pub offset: Vec2,
    pub distance: f64,
    /// `min(50 / distance, 1)`.
    pub proximity: f64,
    /// Closure rate mapped onto `[0, 1]`, `0.5` when the range is constant.
    pub closure: f64,
    /// Bearing relative to the ship's heading, as a fraction of a turn in `[0, 1)`.
    pub relative_heading: f64,
    /// Size class over the largest size class.
    pub size: f64,
}

impl AsteroidFeatures {
    #[must_use]
    pub fn observe(ship: &ShipState, asteroid: &AsteroidState, map: MapSize) -> Self {
        let offset = map.shortest_delta(ship.position, asteroid.position);
        let distance = offset.length();
        let closure = closure_rate(offset, ship.velocity, asteroid.velocity);
        Self {
            offset,
            distance,
            proximity: saturating_ratio(distance, PROXIMITY_SCALE),
            closure: linear_unit(closure, CLOSURE_RANGE.0, CLOSURE_RANGE.1),
            relative_heading: relative_heading(ship.heading, offset),
            size: f64::from(asteroid.size) / MAX_ASTEROID_SIZE,
        }
    }
}

/// Rate at which the distance to the asteroid shrinks. Positive when closing.
///
/// ```
/// # use fuzzpilot_engine::Vec2;
/// # use fuzzpilot_evaluator::features::closure_rate;
/// // Asteroid 100 px ahead, flying at us at 30 px/s.
/// let rate = closure_rate(Vec2::new(100.0, 0.0), Vec2::ZERO, Vec2::new(-30.0, 0.0));
/// assert_eq!(rate, 30.0);
/// ```
#[must_use]
pub fn closure_rate(offset: Vec2, ship_velocity: Vec2, asteroid_velocity: Vec2) -> f64 {
    let distance = offset.length();
    if distance <= f64::EPSILON {
        return 0.0;
    }
    -(asteroid_velocity - ship_velocity).dot(offset) / distance
}

/// Bearing of `offset` relative to `heading` (degrees), as a fraction of a turn.
#[must_use]
pub fn relative_heading(heading: f64, offset: Vec2) -> f64 {
    let fraction = (offset.angle_degrees() - heading).rem_euclid(360.0) / 360.0;
    // rem_euclid may round up to exactly 360 for tiny negative inputs.
    if fraction >= 1.0 { 0.0 } else { fraction }
}

/// Signed difference `target - current` wrapped into `[-180, 180)` degrees.
#[must_use]
pub fn angle_difference(target: f64, current: f64) -> f64 {
    (target - current + 180.0).rem_euclid(360.0) - 180.0
}

/// Heading (degrees) a bullet must leave on to meet a moving asteroid.
///
/// Solves `|offset + v·t| = bullet_speed·t` for the earliest non-negative `t`, then
/// aims at where the asteroid will be after `t + delay`. Falls back to the direct
/// bearing when no intercept exists.
#[must_use]
pub fn intercept_heading(offset: Vec2, velocity: Vec2, bullet_speed: f64, delay: f64) -> f64 {
    let a = velocity.dot(velocity) - bullet_speed * bullet_speed;
    let b = 2.0 * offset.dot(velocity);
    let c = offset.dot(offset);

    let time = if a.abs() < 1e-9 {
        (b.abs() > 1e-9).then(|| -c / b).filter(|t| *t >= 0.0)
    } else {
        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            None
        } else {
            let root = discriminant.sqrt();
            [(-b + root) / (2.0 * a), (-b - root) / (2.0 * a)]
                .into_iter()
                .filter(|t| *t >= 0.0)
                .min_by(f64::total_cmp)
        }
    };

    match time {
        Some(t) => (offset + velocity * (t + delay)).angle_degrees(),
        None => offset.angle_degrees(),
    }
}

/// A turn-rate command and whether it reaches the target heading this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnCommand {
    pub turn_rate: f64,
    pub on_target: bool,
}

/// Turns from `heading` toward `target` (degrees) as fast as `turn_rate_range` allows.
///
/// `on_target` is set when the whole remaining angle fits into one tick.
///
/// ```
/// # use fuzzpilot_evaluator::features::turn_toward;
/// let near = turn_toward(0.0, 3.0, (-180.0, 180.0), 1.0 / 30.0);
/// assert!(near.on_target);
/// assert!((near.turn_rate - 90.0).abs() < 1e-9);
///
/// let far = turn_toward(0.0, 270.0, (-180.0, 180.0), 1.0 / 30.0);
/// assert!(!far.on_target);
/// assert_eq!(far.turn_rate, -180.0);
/// ```
#[must_use]
pub fn turn_toward(
    heading: f64,
    target: f64,
    (min_rate, max_rate): (f64, f64),
    delta_time: f64,
) -> TurnCommand {
    let delta = angle_difference(target, heading);
    if delta_time <= 0.0 {
        return TurnCommand {
            turn_rate: 0.0,
            on_target: delta.abs() < 1e-9,
        };
    }
    let desired = delta / delta_time;
    TurnCommand {
        turn_rate: desired.clamp(min_rate, max_rate),
        on_target: (min_rate..=max_rate).contains(&desired),
    }
}

/// Center of the widest circular gap between headings given as fractions of a turn.
///
/// Returns `None` for an empty slice. A single heading yields the opposite direction.
///
/// ```
/// # use fuzzpilot_evaluator::features::largest_gap_center;
/// let center = largest_gap_center(&[0.1, 0.2]).unwrap();
/// assert!((center - 0.65).abs() < 1e-12);
/// ```
#[must_use]
pub fn largest_gap_center(headings: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = headings.iter().map(|h| h.rem_euclid(1.0)).collect();
    sorted.sort_by(f64::total_cmp);
    let (&first, &last) = (sorted.first()?, sorted.last()?);

    let mut start = last;
    let mut width = first + 1.0 - last;
    for pair in sorted.windows(2) {
        let gap = pair[1] - pair[0];
        if gap > width {
            start = pair[0];
            width = gap;
        }
    }
    Some((start + width / 2.0).rem_euclid(1.0))
}
