//! Axis-aligned bounding box: union, intersection, containment, exact
//! line clipping, and the parametric ray-distance query the BVH's
//! best-first ray traversal relies on.

use crate::fixed::FixedNum;
use crate::geom::matrix::Mat2D;
use crate::geom::vector::Vec2;
use crate::trig::DISTANCE_EPSILON;

/// A 2D axis-aligned box.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec2,
    /// Maximum corner.
    pub max: Vec2,
}

impl Default for Aabb {
    /// The empty box, so arena slots default-initialize to something safe.
    fn default() -> Self {
        Aabb::EMPTY
    }
}

impl Aabb {
    /// The canonical "empty" box: any `add` immediately replaces both bounds.
    pub const EMPTY: Aabb = Aabb {
        min: Vec2::new(FixedNum::MAX, FixedNum::MAX),
        max: Vec2::new(FixedNum::MIN, FixedNum::MIN),
    };

    /// Builds a box directly from corners, without normalizing.
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Aabb { min, max }
    }

    /// Builds a normalized box from two arbitrary (possibly out-of-order) points.
    pub fn from_points(p0: Vec2, p1: Vec2) -> Self {
        let mut bb = Aabb {
            min: p0.min(p1),
            max: p0.max(p1),
        };
        bb.normalize();
        bb
    }

    /// Resets to the empty box.
    pub fn reset(&mut self) {
        *self = Aabb::EMPTY;
    }

    /// Swaps inverted bounds back into order, then widens by
    /// [`DISTANCE_EPSILON`] on any axis that is exactly zero-width —
    /// a degenerate (e.g. perfectly axis-aligned segment) box must
    /// still have non-zero area for BVH area-cost math to behave.
    pub fn normalize(&mut self) {
        if self.min.x > self.max.x {
            std::mem::swap(&mut self.min.x, &mut self.max.x);
        }
        if self.min.y > self.max.y {
            std::mem::swap(&mut self.min.y, &mut self.max.y);
        }
        if self.min.x == self.max.x {
            self.min.x -= DISTANCE_EPSILON;
            self.max.x += DISTANCE_EPSILON;
        }
        if self.min.y == self.max.y {
            self.min.y -= DISTANCE_EPSILON;
            self.max.y += DISTANCE_EPSILON;
        }
    }

    /// Expands the box to include `point`.
    pub fn add_point(&mut self, point: Vec2) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Expands the box to include `other` (union).
    pub fn add(&mut self, other: Aabb) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Returns the union of `self` and `other` without mutating either.
    pub fn union(self, other: Aabb) -> Aabb {
        let mut out = self;
        out.add(other);
        out
    }

    /// Returns the intersection of `self` and `other`. May produce an
    /// invalid (min > max) box if they don't overlap — callers that
    /// care should check [`Aabb::intersects`] first.
    pub fn intersection(self, other: Aabb) -> Aabb {
        Aabb {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        }
    }

    /// Grows the box outward by `(dx, dy)` on each side.
    pub fn expand(&mut self, dx: FixedNum, dy: FixedNum) {
        self.min.x -= dx;
        self.min.y -= dy;
        self.max.x += dx;
        self.max.y += dy;
    }

    /// True if `self` fully contains `other` (closed interval).
    pub fn contains(self, other: Aabb) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && self.max.x >= other.max.x
            && self.max.y >= other.max.y
    }

    /// True if the boxes overlap (open-interval test).
    pub fn intersects(self, other: Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Box area.
    pub fn area(self) -> FixedNum {
        (self.max.x - self.min.x) * (self.max.y - self.min.y)
    }

    /// Center point.
    pub fn center(self) -> Vec2 {
        (self.min + self.max) / FixedNum::from_int(2)
    }

    /// Full width/height.
    pub fn diameter(self) -> Vec2 {
        self.max - self.min
    }

    /// Transforms the four corners by `m` and re-unions, producing the
    /// new axis-aligned box enclosing the transformed shape.
    pub fn transform_by(self, m: Mat2D) -> Aabb {
        let corners = [
            Vec2::new(self.min.x, self.min.y),
            Vec2::new(self.max.x, self.min.y),
            Vec2::new(self.max.x, self.max.y),
            Vec2::new(self.min.x, self.max.y),
        ];
        let mut out = Aabb::EMPTY;
        for c in corners {
            out.add_point(m.transform_point(c));
        }
        out
    }

    /// Exact clip of the segment `[start, end]` against this box,
    /// Liang-Barsky style. Returns the visible sub-segment, or `None`
    /// if the segment misses entirely. Handles axis-parallel segments
    /// via explicit sign-based branches rather than dividing by zero.
    pub fn clip_line(self, start: Vec2, end: Vec2) -> Option<(Vec2, Vec2)> {
        let (mut t0, mut t1) = (FixedNum::ZERO, FixedNum::ONE);
        if !clip_axis(start.x, end.x, self.min.x, self.max.x, &mut t0, &mut t1) {
            return None;
        }
        if !clip_axis(start.y, end.y, self.min.y, self.max.y, &mut t0, &mut t1) {
            return None;
        }
        let delta = end - start;
        Some((start + delta * t0, start + delta * t1))
    }

    /// Alternate parametric clip, returning only the entry/exit
    /// parameters rather than the clipped points — kept alongside
    /// [`Aabb::clip_line`] because it serves a different caller: the
    /// BVH ray query only needs the scalar entry time, not a mutated
    /// sub-segment.
    pub fn clip_line_parametric(self, start: Vec2, end: Vec2) -> Option<(FixedNum, FixedNum)> {
        let (mut t0, mut t1) = (FixedNum::ZERO, FixedNum::ONE);
        if !clip_axis(start.x, end.x, self.min.x, self.max.x, &mut t0, &mut t1) {
            return None;
        }
        if !clip_axis(start.y, end.y, self.min.y, self.max.y, &mut t0, &mut t1) {
            return None;
        }
        Some((t0, t1))
    }

    /// Returns the parametric `t ∈ [0, 1]` at which the ray `[start,
    /// end]` enters the box, or [`FixedNum::MAX`] if it misses. Used
    /// by the BVH's best-first ray traversal to order candidate children.
    pub fn ray_distance(self, start: Vec2, end: Vec2) -> FixedNum {
        match self.clip_line_parametric(start, end) {
            Some((t0, _)) => t0,
            None => FixedNum::MAX,
        }
    }
}

/// Clips the parametric range `[t0, t1]` against one axis of the box.
/// Returns `false` if the segment is entirely outside on this axis.
fn clip_axis(
    p0: FixedNum,
    p1: FixedNum,
    min: FixedNum,
    max: FixedNum,
    t0: &mut FixedNum,
    t1: &mut FixedNum,
) -> bool {
    let delta = p1 - p0;
    if delta.is_zero() {
        // Axis-parallel: the whole segment must already lie within bounds.
        return p0 >= min && p0 <= max;
    }
    let mut tmin = (min - p0) / delta;
    let mut tmax = (max - p0) / delta;
    if tmin > tmax {
        std::mem::swap(&mut tmin, &mut tmax);
    }
    *t0 = t0.max(tmin);
    *t1 = t1.min(tmax);
    t0 <= t1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_is_monotonic() {
        let a = Aabb::from_points(Vec2::ZERO, Vec2::new(FixedNum::from_int(1), FixedNum::from_int(1)));
        let b = Aabb::from_points(
            Vec2::new(FixedNum::from_int(2), FixedNum::from_int(2)),
            Vec2::new(FixedNum::from_int(3), FixedNum::from_int(3)),
        );
        let u = a.union(b);
        assert!(u.contains(a));
        assert!(u.contains(b));
    }

    #[test]
    fn clip_line_hits_segment_crossing_box() {
        let bb = Aabb::from_points(
            Vec2::new(FixedNum::from_int(2), FixedNum::from_int(-1)),
            Vec2::new(FixedNum::from_int(4), FixedNum::from_int(1)),
        );
        let start = Vec2::new(FixedNum::ZERO, FixedNum::ZERO);
        let end = Vec2::new(FixedNum::from_int(10), FixedNum::ZERO);
        let (entry, _exit) = bb.clip_line(start, end).expect("should hit");
        assert_eq!(entry.x, FixedNum::from_int(2));
    }

    #[test]
    fn ray_distance_sentinel_on_miss() {
        let bb = Aabb::from_points(
            Vec2::new(FixedNum::from_int(2), FixedNum::from_int(5)),
            Vec2::new(FixedNum::from_int(4), FixedNum::from_int(7)),
        );
        let start = Vec2::ZERO;
        let end = Vec2::new(FixedNum::from_int(10), FixedNum::ZERO);
        assert_eq!(bb.ray_distance(start, end), FixedNum::MAX);
    }
}
