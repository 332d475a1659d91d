//! Segment collider: a one-sided line with a precomputed world normal.

use crate::collide::{Ray, RaycastHit};
use crate::fixed::FixedNum;
use crate::geom::{Aabb, Mat2D, Vec2, Vec3};

/// A segment collider, defined by two endpoints.
#[derive(Clone, Copy, Debug)]
pub struct SegmentShape {
    local_start: Vec3,
    local_end: Vec3,
    world_start: Vec2,
    world_end: Vec2,
    world_normal: Vec2,
}

impl SegmentShape {
    /// Builds a segment from local-space endpoints.
    pub fn new(start: Vec3, end: Vec3) -> Self {
        SegmentShape {
            local_start: start,
            local_end: end,
            world_start: Vec2::ZERO,
            world_end: Vec2::ZERO,
            world_normal: Vec2::ZERO,
        }
    }

    /// World-space start point.
    pub fn world_start(&self) -> Vec2 {
        self.world_start
    }

    /// World-space end point.
    pub fn world_end(&self) -> Vec2 {
        self.world_end
    }

    /// World-space unit normal (perpendicular to the segment direction).
    pub fn world_normal(&self) -> Vec2 {
        self.world_normal
    }

    /// Recomputes world-space endpoints and normal from the owning body's matrix.
    pub fn update_transform(&mut self, body_matrix: Mat2D) {
        self.world_start = body_matrix.transform_point(self.local_start.to_xz());
        self.world_end = body_matrix.transform_point(self.local_end.to_xz());
        self.world_normal = (self.world_end - self.world_start).perpendicular().normalize();
    }

    /// World-space AABB.
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.world_start, self.world_end)
    }

    /// Farthest endpoint in the given direction.
    pub fn support_in_direction(&self, dir: Vec2) -> Vec2 {
        if self.world_start.dot(dir) >= self.world_end.dot(dir) {
            self.world_start
        } else {
            self.world_end
        }
    }

    /// True if the nearest point on the segment, clamped to its extent,
    /// is within `radius` of `point`.
    pub fn contains_point(&self, point: Vec2, radius: FixedNum) -> bool {
        let delta = self.world_end - self.world_start;
        let len_sq = delta.length_sq();
        if len_sq.is_zero() {
            return point.distance_sq(self.world_start) <= radius * radius;
        }
        let t = ((point - self.world_start).dot(delta) / len_sq).clamp(FixedNum::ZERO, FixedNum::ONE);
        let closest = self.world_start + delta * t;
        point.distance_sq(closest) <= radius * radius
    }

    /// Solves the 2x2 linear system for the ray/segment intersection
    /// parameters, accepting only when both lie in `[0, 1]`.
    pub fn ray_cast(&self, ray: &Ray) -> Option<RaycastHit> {
        let seg = self.world_end - self.world_start;
        let ray_vec = ray.end - ray.start;
        let denom = ray_vec.cross(seg);
        if denom.is_zero() {
            return None;
        }
        let diff = self.world_start - ray.start;
        let t1 = diff.cross(seg) / denom;
        let t2 = diff.cross(ray_vec) / denom;
        if t1.raw() < 0 || t1 > FixedNum::ONE || t2.raw() < 0 || t2 > FixedNum::ONE {
            return None;
        }
        let distance = ray.distance * t1;
        let point = ray.start + ray_vec * t1;
        Some(RaycastHit {
            point,
            normal: ray.direction,
            distance,
        })
    }
}
