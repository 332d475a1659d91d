//! Fixed-point 2D/3D vector algebra.
//!
//! `Vec3` represents a simulation-space point or direction with `y`
//! held constant (the engine's plane-lock convention); `Vec2` is the
//! pure in-plane (x, z) representation used throughout collision math.
//! Multi-term formulas (`dot`, `length_sq`, `cross`) widen every raw
//! component to `i64` and narrow only once at the end, rather than
//! chaining `FixedNum::mul` calls that would each round independently —
//! this preserves precision exactly the way the reference vector types
//! do.

use crate::fixed::FixedNum;
use crate::trig;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A 2D vector in the simulation plane.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash)]
pub struct Vec2 {
    /// X coordinate.
    pub x: FixedNum,
    /// Z coordinate, called `y` in this 2D-only type for readability.
    pub y: FixedNum,
}

impl Vec2 {
    /// The zero vector.
    pub const ZERO: Vec2 = Vec2 {
        x: FixedNum::ZERO,
        y: FixedNum::ZERO,
    };

    /// Builds a vector from components.
    pub const fn new(x: FixedNum, y: FixedNum) -> Self {
        Vec2 { x, y }
    }

    /// Unit vector at the given angle, in degrees.
    pub fn from_angle(degrees: FixedNum) -> Self {
        Vec2::new(trig::cos_deg(degrees), trig::sin_deg(degrees))
    }

    /// Dot product, widened once.
    pub fn dot(self, rhs: Self) -> FixedNum {
        let wide = self.x.widen() * rhs.x.widen() + self.y.widen() * rhs.y.widen();
        FixedNum::narrow(wide)
    }

    /// 2D scalar cross product (`x * rhs.y - y * rhs.x`).
    pub fn cross(self, rhs: Self) -> FixedNum {
        let wide = self.x.widen() * rhs.y.widen() - self.y.widen() * rhs.x.widen();
        FixedNum::narrow(wide)
    }

    /// Squared length, widened once.
    pub fn length_sq(self) -> FixedNum {
        self.dot(self)
    }

    /// Length (square root of [`Vec2::length_sq`]).
    pub fn length(self) -> FixedNum {
        trig::sqrt(self.length_sq())
    }

    /// Squared distance to another point.
    pub fn distance_sq(self, rhs: Self) -> FixedNum {
        (self - rhs).length_sq()
    }

    /// Distance to another point.
    pub fn distance(self, rhs: Self) -> FixedNum {
        (self - rhs).length()
    }

    /// Returns a unit-length copy, or `Vec2::ZERO` if this vector is
    /// (near-)zero — matching the reference normalize's degenerate case.
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len.raw() <= 0 {
            Vec2::ZERO
        } else {
            self / len
        }
    }

    /// Perpendicular vector, rotated 90 degrees counter-clockwise:
    /// `(x, y) -> (-y, x)`.
    pub fn perpendicular(self) -> Self {
        Vec2::new(-self.y, self.x)
    }

    /// Component-wise minimum.
    pub fn min(self, rhs: Self) -> Self {
        Vec2::new(self.x.min(rhs.x), self.y.min(rhs.y))
    }

    /// Component-wise maximum.
    pub fn max(self, rhs: Self) -> Self {
        Vec2::new(self.x.max(rhs.x), self.y.max(rhs.y))
    }

    /// Indexes by axis: 0 for x, 1 for y. Used by the BVH rebuild's
    /// alternating-axis sort.
    pub fn axis(self, index: usize) -> FixedNum {
        match index {
            0 => self.x,
            1 => self.y,
            _ => unreachable!("Vec2 has only two axes"),
        }
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Vec2::new(-self.x, -self.y)
    }
}

impl Mul<FixedNum> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: FixedNum) -> Self {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<FixedNum> for Vec2 {
    type Output = Self;
    fn div(self, rhs: FixedNum) -> Self {
        Vec2::new(self.x / rhs, self.y / rhs)
    }
}

/// A 3D vector with `y` held constant across the simulation (the
/// plane-lock convention); physics math happens in the X-Z plane.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash)]
pub struct Vec3 {
    /// X coordinate, in-plane.
    pub x: FixedNum,
    /// Y coordinate, held constant by convention.
    pub y: FixedNum,
    /// Z coordinate, in-plane.
    pub z: FixedNum,
}

impl Vec3 {
    /// The zero vector.
    pub const ZERO: Vec3 = Vec3 {
        x: FixedNum::ZERO,
        y: FixedNum::ZERO,
        z: FixedNum::ZERO,
    };

    /// Builds a vector from components.
    pub const fn new(x: FixedNum, y: FixedNum, z: FixedNum) -> Self {
        Vec3 { x, y, z }
    }

    /// Dot product, widened once.
    pub fn dot(self, rhs: Self) -> FixedNum {
        let wide = self.x.widen() * rhs.x.widen()
            + self.y.widen() * rhs.y.widen()
            + self.z.widen() * rhs.z.widen();
        FixedNum::narrow(wide)
    }

    /// Scalar cross product restricted to the X-Z plane: `x*rhs.z - z*rhs.x`.
    pub fn cross_xz(self, rhs: Self) -> FixedNum {
        let wide = self.x.widen() * rhs.z.widen() - self.z.widen() * rhs.x.widen();
        FixedNum::narrow(wide)
    }

    /// Squared length.
    pub fn length_sq(self) -> FixedNum {
        self.dot(self)
    }

    /// Length.
    pub fn length(self) -> FixedNum {
        trig::sqrt(self.length_sq())
    }

    /// Squared distance to another point.
    pub fn distance_sq(self, rhs: Self) -> FixedNum {
        (self - rhs).length_sq()
    }

    /// Distance to another point.
    pub fn distance(self, rhs: Self) -> FixedNum {
        (self - rhs).length()
    }

    /// Projects onto the X-Z plane, discarding `y`.
    pub fn to_xz(self) -> Vec2 {
        Vec2::new(self.x, self.z)
    }

    /// Builds a `Vec3` from an in-plane `Vec2`, holding `y` at the given value.
    pub fn from_xz(xz: Vec2, y: FixedNum) -> Self {
        Vec3::new(xz.x, y, xz.y)
    }

    /// True if within `epsilon` of `rhs` on every axis.
    pub fn almost_equal(self, rhs: Self, epsilon: FixedNum) -> bool {
        (self.x - rhs.x).abs() <= epsilon
            && (self.y - rhs.y).abs() <= epsilon
            && (self.z - rhs.z).abs() <= epsilon
    }

    /// True if within `epsilon` of zero on every axis.
    pub fn almost_zero(self, epsilon: FixedNum) -> bool {
        self.almost_equal(Vec3::ZERO, epsilon)
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<FixedNum> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: FixedNum) -> Self {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<FixedNum> for Vec3 {
    type Output = Self;
    fn div(self, rhs: FixedNum) -> Self {
        Vec3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perpendicular_is_orthogonal() {
        let v = Vec2::new(FixedNum::from_int(3), FixedNum::from_int(4));
        assert_eq!(v.dot(v.perpendicular()), FixedNum::ZERO);
    }

    #[test]
    fn normalize_degenerate_is_zero() {
        assert_eq!(Vec2::ZERO.normalize(), Vec2::ZERO);
    }

    #[test]
    fn cross_xz_matches_vec2_cross() {
        let a = Vec3::new(FixedNum::from_int(1), FixedNum::ZERO, FixedNum::from_int(2));
        let b = Vec3::new(FixedNum::from_int(3), FixedNum::ZERO, FixedNum::from_int(4));
        assert_eq!(a.cross_xz(b), a.to_xz().cross(b.to_xz()));
    }
}
