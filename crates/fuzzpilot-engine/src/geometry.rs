use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// A 2D vector in world units (pixels).
///
/// Angles are in degrees, measured counter-clockwise from the +x axis.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit-length vector pointing at `degrees`, scaled by `length`.
    #[must_use]
    pub fn from_polar(degrees: f64, length: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self::new(cos * length, sin * length)
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Direction of the vector in `[0, 360)` degrees.
    #[must_use]
    pub fn angle_degrees(self) -> f64 {
        self.y.atan2(self.x).to_degrees().rem_euclid(360.0)
    }

    #[must_use]
    pub fn rotated(self, degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// Size of the toroidal world. Positions live in `[0, width) x [0, height)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapSize {
    pub width: f64,
    pub height: f64,
}

impl Default for MapSize {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 800.0,
        }
    }
}

impl MapSize {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Wraps a position back onto the map.
    #[must_use]
    pub fn wrap(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x.rem_euclid(self.width), p.y.rem_euclid(self.height))
    }

    /// Shortest displacement from `from` to `to` across the wrapped edges.
    ///
    /// ```
    /// # use fuzzpilot_engine::{MapSize, Vec2};
    /// let map = MapSize::new(1000.0, 800.0);
    /// let d = map.shortest_delta(Vec2::new(990.0, 10.0), Vec2::new(10.0, 790.0));
    /// assert!((d.x - 20.0).abs() < 1e-9);
    /// assert!((d.y + 20.0).abs() < 1e-9);
    /// ```
    #[must_use]
    pub fn shortest_delta(&self, from: Vec2, to: Vec2) -> Vec2 {
        Vec2::new(
            wrap_axis(to.x - from.x, self.width),
            wrap_axis(to.y - from.y, self.height),
        )
    }

    #[must_use]
    pub fn contains(&self, p: Vec2) -> bool {
        (0.0..self.width).contains(&p.x) && (0.0..self.height).contains(&p.y)
    }
}

fn wrap_axis(delta: f64, extent: f64) -> f64 {
    let half = extent / 2.0;
    (delta + half).rem_euclid(extent) - half
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polar_and_angle_agree() {
        for deg in [0.0, 45.0, 90.0, 179.0, 270.0, 359.0] {
            let v = Vec2::from_polar(deg, 3.0);
            assert!((v.length() - 3.0).abs() < 1e-9);
            assert!((v.angle_degrees() - deg).abs() < 1e-9, "{deg}");
        }
    }

    #[test]
    fn test_wrap_and_delta() {
        let map = MapSize::new(100.0, 50.0);
        assert_eq!(map.wrap(Vec2::new(-1.0, 51.0)), Vec2::new(99.0, 1.0));
        let d = map.shortest_delta(Vec2::new(10.0, 10.0), Vec2::new(30.0, 20.0));
        assert_eq!(d, Vec2::new(20.0, 10.0));
        let d = map.shortest_delta(Vec2::new(5.0, 5.0), Vec2::new(95.0, 45.0));
        assert_eq!(d, Vec2::new(-10.0, -10.0));
    }

    #[test]
    fn test_rotation() {
        let v = Vec2::new(1.0, 0.0).rotated(90.0);
        assert!(v.x.abs() < 1e-12 && (v.y - 1.0).abs() < 1e-12);
    }
}
