//! 3x2 affine transform: a linear 2x2 block plus a translation.
//!
//! Row-vector convention, matching the reference layout: `{a, b, c, d,
//! x, y}` where `[a b; c d]` is the linear block and `(x, y)` is the
//! translation. `transform_point` computes `p * A + t`.

use crate::fixed::FixedNum;
use crate::geom::vector::{Vec2, Vec3};
use crate::trig;

/// An affine transform: rotate/scale (`a, b, c, d`) then translate (`x, y`).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Mat2D {
    a: FixedNum,
    b: FixedNum,
    c: FixedNum,
    d: FixedNum,
    x: FixedNum,
    y: FixedNum,
}

impl Mat2D {
    /// The identity transform.
    pub const IDENTITY: Mat2D = Mat2D {
        a: FixedNum::ONE,
        b: FixedNum::ZERO,
        c: FixedNum::ZERO,
        d: FixedNum::ONE,
        x: FixedNum::ZERO,
        y: FixedNum::ZERO,
    };

    /// Builds the transform for a given position, yaw-as-angle (degrees),
    /// and uniform scale, in the order rotate-then-scale-then-translate.
    pub fn from_pose(position: Vec2, angle_degrees: FixedNum, scale: FixedNum) -> Self {
        let cos_r = trig::cos_deg(angle_degrees);
        let sin_r = trig::sin_deg(angle_degrees);
        Mat2D {
            a: cos_r * scale,
            b: sin_r * scale,
            c: -sin_r * scale,
            d: cos_r * scale,
            x: position.x,
            y: position.y,
        }
    }

    /// A pure translation.
    pub fn from_translation(position: Vec2) -> Self {
        Mat2D {
            x: position.x,
            y: position.y,
            ..Mat2D::IDENTITY
        }
    }

    /// Transforms a point: rotate/scale then translate.
    pub fn transform_point(self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x * self.a + p.y * self.c + self.x,
            p.x * self.b + p.y * self.d + self.y,
        )
    }

    /// Transforms a direction vector: rotate/scale only, no translation.
    pub fn transform_vector(self, v: Vec2) -> Vec2 {
        Vec2::new(v.x * self.a + v.y * self.c, v.x * self.b + v.y * self.d)
    }

    /// Transforms a 3D point, holding `y` constant (the plane-lock convention).
    pub fn transform_point3(self, p: Vec3) -> Vec3 {
        let xz = self.transform_point(p.to_xz());
        Vec3::from_xz(xz, p.y)
    }

    /// Composes `self` followed by `rhs` (i.e. `rhs ∘ self`, applying
    /// `self` to a point first and then `rhs`).
    pub fn then(self, rhs: Self) -> Self {
        Mat2D {
            a: self.a * rhs.a + self.b * rhs.c,
            b: self.a * rhs.b + self.b * rhs.d,
            c: self.c * rhs.a + self.d * rhs.c,
            d: self.c * rhs.b + self.d * rhs.d,
            x: self.x * rhs.a + self.y * rhs.c + rhs.x,
            y: self.x * rhs.b + self.y * rhs.d + rhs.y,
        }
    }

    /// Determinant of the linear block.
    pub fn determinant(self) -> FixedNum {
        self.a * self.d - self.b * self.c
    }

    /// Inverse of the full affine transform.
    ///
    /// The reference source computes `x' = (c*y - d*x) * invDet` and then
    /// `y'` using the just-overwritten `x` field instead of the original
    /// translation — a latent bug when translation is non-zero. This
    /// implementation derives the linear block first, then the
    /// translation in one step as `t' = -A⁻¹ · t`, never reading a
    /// partially updated field.
    pub fn inverse(self) -> Self {
        let det = self.determinant();
        let inv_det = FixedNum::ONE / det;

        let a = self.d * inv_det;
        let b = -self.b * inv_det;
        let c = -self.c * inv_det;
        let d = self.a * inv_det;

        // t' = -A⁻¹ · t, computed from the already-inverted linear block.
        let x = -(self.x * a + self.y * c);
        let y = -(self.x * b + self.y * d);

        Mat2D { a, b, c, d, x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_round_trips_with_translation() {
        let m = Mat2D::from_pose(
            Vec2::new(FixedNum::from_int(5), FixedNum::from_int(-3)),
            FixedNum::from_int(37),
            FixedNum::ONE,
        );
        let inv = m.inverse();
        let composed = m.then(inv);
        let eps = 2.0 / crate::fixed::PRECISION as f64;
        approx::assert_abs_diff_eq!(composed.a.to_f64(), 1.0, epsilon = eps);
        approx::assert_abs_diff_eq!(composed.b.to_f64(), 0.0, epsilon = eps);
        approx::assert_abs_diff_eq!(composed.c.to_f64(), 0.0, epsilon = eps);
        approx::assert_abs_diff_eq!(composed.d.to_f64(), 1.0, epsilon = eps);
        approx::assert_abs_diff_eq!(composed.x.to_f64(), 0.0, epsilon = eps);
        approx::assert_abs_diff_eq!(composed.y.to_f64(), 0.0, epsilon = eps);
    }

    #[test]
    fn identity_transforms_point_unchanged() {
        let p = Vec2::new(FixedNum::from_int(7), FixedNum::from_int(-2));
        assert_eq!(Mat2D::IDENTITY.transform_point(p), p);
    }
}
