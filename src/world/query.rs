//! The three public cast queries: point, line, and collider-against-world.

use crate::collide::{ColliderFilter, ColliderId, Ray, RaycastHit};
use crate::fixed::FixedNum;
use crate::geom::{Aabb, Vec2};
use crate::world::World;

impl World {
    /// Finds a collider (expanded by `radius`) containing `p`, checking
    /// the dynamic tree first and only falling back to the static tree
    /// when the dynamic query yields no hit.
    pub fn point_cast(&self, p: Vec2, radius: FixedNum) -> Option<ColliderId> {
        let bounds = Aabb::from_points(
            Vec2::new(p.x - radius, p.y - radius),
            Vec2::new(p.x + radius, p.y + radius),
        );

        let mut found = None;
        let mut visit = |id: ColliderId| -> bool {
            if let Some(collider) = self.collider(id) {
                if collider.shape.contains_point(p, radius) {
                    found = Some(id);
                    return true;
                }
            }
            false
        };

        self.dynamic_tree_ref().query_box(bounds, &mut visit);
        if found.is_none() {
            self.static_tree_ref().query_box(bounds, &mut visit);
        }
        found
    }

    /// Casts a ray from `start` to `end` against both trees, returning
    /// the nearest non-trigger hit that passes `filter`, if any.
    pub fn line_cast(&self, start: Vec2, end: Vec2, filter: ColliderFilter) -> Option<RaycastHit> {
        let ray = Ray::from_points(start, end);
        let mut best: Option<(FixedNum, RaycastHit)> = None;

        let mut visit = |id: ColliderId| -> FixedNum {
            let Some(collider) = self.collider(id) else {
                return FixedNum::MAX;
            };
            if collider.is_trigger || !collider.filter.can_collide(filter) {
                return FixedNum::MAX;
            }
            let Some(hit) = collider.shape.ray_cast(&ray) else {
                return FixedNum::MAX;
            };
            let t = if ray.distance.is_zero() {
                FixedNum::ZERO
            } else {
                hit.distance / ray.distance
            };
            if best.as_ref().map(|(best_t, _)| t < *best_t).unwrap_or(true) {
                best = Some((t, hit));
            }
            t
        };

        self.dynamic_tree_ref().query_ray(start, end, &mut visit);
        self.static_tree_ref().query_ray(start, end, &mut visit);

        best.map(|(_, hit)| hit)
    }

    /// Finds the first collider (other than `against` itself) whose
    /// true bounds overlap `against`'s and whose narrow-phase test
    /// against it succeeds.
    pub fn collider_cast(&self, against: ColliderId) -> Option<ColliderId> {
        self.collider_cast_candidates(against, true).into_iter().next()
    }

    /// Same as [`World::collider_cast`] but collects every overlapping
    /// collider rather than stopping at the first.
    pub fn collider_cast_all(&self, against: ColliderId) -> Vec<ColliderId> {
        self.collider_cast_candidates(against, false)
    }

    fn collider_cast_candidates(&self, against: ColliderId, stop_at_first: bool) -> Vec<ColliderId> {
        let Some(me) = self.collider(against) else {
            return Vec::new();
        };
        let bounds = me.bounds;

        let mut hits = Vec::new();
        let mut visit = |id: ColliderId| -> bool {
            if id == against {
                return false;
            }
            if let Some(other) = self.collider(id) {
                if me.can_collide_with(other)
                    && crate::collide::narrow::collision_test(me, other, crate::geom::Vec3::ZERO, crate::geom::Vec3::ZERO).is_some()
                {
                    hits.push(id);
                    if stop_at_first {
                        return true;
                    }
                }
            }
            false
        };

        self.dynamic_tree_ref().query_box(bounds, &mut visit);
        if !(stop_at_first && !hits.is_empty()) {
            self.static_tree_ref().query_box(bounds, &mut visit);
        }
        hits
    }
}
