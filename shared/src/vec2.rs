//! Minimal 2D vector type used throughout the simulation and the wire protocol.

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    pub fn len_sq(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn len(self) -> f32 {
        self.len_sq().sqrt()
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn scale(self, s: f32) -> Vec2 {
        Vec2::new(self.x * s, self.y * s)
    }

    pub fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }

    pub fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }

    pub fn div(self, s: f32) -> Vec2 {
        Vec2::new(self.x / s, self.y / s)
    }

    /// Normalized copy, or `(1, 0)` if this vector is zero or nonfinite.
    ///
    /// The `(1, 0)` fallback is the simulation's defined substitution for a
    /// degenerate look direction (see the error-handling rules around NaN input).
    pub fn normalize_or_unit_x(self) -> Vec2 {
        if !self.x.is_finite() || !self.y.is_finite() {
            return Vec2::new(1.0, 0.0);
        }
        let len = self.len();
        if len <= f32::EPSILON {
            return Vec2::new(1.0, 0.0);
        }
        self.div(len)
    }

    /// Normalized copy, or the zero vector if this vector is zero.
    pub fn normalize_or_zero(self) -> Vec2 {
        let len = self.len();
        if len <= f32::EPSILON {
            return Vec2::ZERO;
        }
        self.div(len)
    }

    /// Reflects this (unit) direction about a (unit) surface normal.
    pub fn reflect(self, normal: Vec2) -> Vec2 {
        let d = self.dot(normal);
        self.sub(normal.scale(2.0 * d))
    }

    pub fn clamp_component(self, min: Vec2, max: Vec2) -> Vec2 {
        Vec2::new(
            self.x.clamp(min.x, max.x),
            self.y.clamp(min.y, max.y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn normalize_or_unit_x_handles_nan() {
        let v = Vec2::new(f32::NAN, 3.0);
        let n = v.normalize_or_unit_x();
        assert_approx_eq!(n.x, 1.0);
        assert_approx_eq!(n.y, 0.0);
    }

    #[test]
    fn normalize_or_unit_x_handles_zero() {
        let n = Vec2::ZERO.normalize_or_unit_x();
        assert_approx_eq!(n.x, 1.0);
        assert_approx_eq!(n.y, 0.0);
    }

    #[test]
    fn reflect_bounces_off_vertical_wall() {
        let dir = Vec2::new(1.0, 0.0);
        let normal = Vec2::new(-1.0, 0.0);
        let reflected = dir.reflect(normal);
        assert_approx_eq!(reflected.x, -1.0);
        assert_approx_eq!(reflected.y, 0.0);
    }

    #[test]
    fn dot_and_len_sq_agree_for_self() {
        let v = Vec2::new(3.0, 4.0);
        assert_approx_eq!(v.dot(v), v.len_sq());
        assert_approx_eq!(v.len(), 5.0);
    }
}
