//! Circle collider: local center/radius plus their world-space cache.

use crate::collide::{Ray, RaycastHit};
use crate::fixed::FixedNum;
use crate::geom::{Aabb, Mat2D, Vec2, Vec3};

/// A circle collider.
#[derive(Clone, Copy, Debug)]
pub struct CircleShape {
    /// Local-space center, relative to the owning body.
    pub local_center: Vec3,
    /// Local-space radius.
    pub local_radius: FixedNum,
    world_center: Vec2,
    world_radius: FixedNum,
}

impl CircleShape {
    /// Builds a circle at the given local offset and radius.
    pub fn new(local_radius: FixedNum, local_center: Vec3) -> Self {
        CircleShape {
            local_center,
            local_radius,
            world_center: Vec2::ZERO,
            world_radius: local_radius,
        }
    }

    /// Current world-space center.
    pub fn world_center(&self) -> Vec2 {
        self.world_center
    }

    /// Current world-space radius.
    pub fn world_radius(&self) -> FixedNum {
        self.world_radius
    }

    /// Recomputes world-space center/radius from the owning body's matrix.
    ///
    /// The radius is recovered by transforming a point offset from the
    /// local center by `local_radius` along +x and measuring the
    /// resulting world-space distance, rather than `local_radius *
    /// scale` directly — this stays correct under the matrix's actual
    /// composed scale instead of assuming the body exposes one
    /// uniformly.
    pub fn update_transform(&mut self, body_matrix: Mat2D) {
        let local_xz = self.local_center.to_xz();
        self.world_center = body_matrix.transform_point(local_xz);
        let edge_local = local_xz + Vec2::new(self.local_radius, FixedNum::ZERO);
        let edge_world = body_matrix.transform_point(edge_local);
        self.world_radius = self.world_center.distance(edge_world);
    }

    /// World-space AABB.
    pub fn bounds(&self) -> Aabb {
        let r = Vec2::new(self.world_radius, self.world_radius);
        Aabb::new(self.world_center - r, self.world_center + r)
    }

    /// Farthest point on the circle in the given direction.
    pub fn support_in_direction(&self, dir: Vec2) -> Vec2 {
        let len = dir.length();
        if len.is_zero() {
            return self.world_center + Vec2::new(self.world_radius, FixedNum::ZERO);
        }
        self.world_center + dir * (self.world_radius / len)
    }

    /// True if the circle, expanded by `radius`, contains `point`.
    pub fn contains_point(&self, point: Vec2, radius: FixedNum) -> bool {
        let total = self.world_radius + radius;
        point.distance_sq(self.world_center) <= total * total
    }

    /// Ray-sphere intersection. Origin-inside-circle returns `t = 0`.
    pub fn ray_cast(&self, ray: &Ray) -> Option<RaycastHit> {
        let e = self.world_center - ray.start;
        let e_len_sq = e.length_sq();
        if e_len_sq <= self.world_radius * self.world_radius {
            return Some(RaycastHit {
                point: ray.start,
                normal: ray.direction,
                distance: FixedNum::ZERO,
            });
        }

        let a = e.dot(ray.direction);
        let delta = self.world_radius * self.world_radius - e_len_sq + a * a;
        if delta.raw() < 0 {
            return None;
        }
        let t = a - crate::trig::sqrt(delta);
        if t.raw() < 0 || t > ray.distance {
            return None;
        }
        let point = ray.start + ray.direction * t;
        Some(RaycastHit {
            point,
            normal: ray.direction,
            distance: t,
        })
    }
}
