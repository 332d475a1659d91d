//! Narrow-phase exact tests between candidate collider pairs.
//!
//! The dispatcher always swaps a pair so the numerically higher
//! [`ShapeKind`] is first, keeping the Circle-Circle / Segment-Circle /
//! Segment-Segment special cases and routing every polygon pair through
//! GJK/EPA, matching the reference source's dispatch table.

use crate::collide::gjk;
use crate::collide::{Collider, ColliderId, Ray, ShapeKind};
use crate::fixed::FixedNum;
use crate::geom::Vec2;
use crate::geom::Vec3;

/// Result of a narrow-phase test: the separating/penetration normal
/// (pointing from `a` toward `b`), how deep the shapes overlap, and
/// the corresponding contact points on each shape.
#[derive(Clone, Copy, Debug)]
pub struct CollisionInfo {
    /// First collider, after normalization by id ordering.
    pub a: ColliderId,
    /// Second collider, after normalization by id ordering.
    pub b: ColliderId,
    /// Unit normal, pointing from `a` toward `b`.
    pub normal: Vec2,
    /// Penetration depth (positive when overlapping).
    pub depth: FixedNum,
    /// World contact point on `a`.
    pub point_a: Vec2,
    /// World contact point on `b`.
    pub point_b: Vec2,
}

impl CollisionInfo {
    fn swapped(self) -> Self {
        CollisionInfo {
            a: self.b,
            b: self.a,
            normal: -self.normal,
            depth: self.depth,
            point_a: self.point_b,
            point_b: self.point_a,
        }
    }
}

/// Fallback separating normal for coincident centers (e.g. two circles
/// exactly overlapping): the difference of body velocities, defaulting
/// to +x if those are also equal, to keep behavior deterministic rather
/// than picking an arbitrary direction.
fn normal_from_velocity(vel_a: Vec3, vel_b: Vec3) -> Vec2 {
    let diff = (vel_a - vel_b).to_xz();
    let normalized = diff.normalize();
    if normalized == Vec2::ZERO {
        Vec2::new(FixedNum::ONE, FixedNum::ZERO)
    } else {
        normalized
    }
}

fn test_circle_circle(a: &Collider, b: &Collider, vel_a: Vec3, vel_b: Vec3) -> Option<CollisionInfo> {
    let (ca, cb) = match (&a.shape, &b.shape) {
        (crate::collide::ColliderShape::Circle(ca), crate::collide::ColliderShape::Circle(cb)) => (ca, cb),
        _ => unreachable!("test_circle_circle called with non-circle shapes"),
    };
    let radius_sum = ca.world_radius() + cb.world_radius();
    let dist_sq = ca.world_center().distance_sq(cb.world_center());
    if dist_sq > radius_sum * radius_sum {
        return None;
    }
    let distance = crate::trig::sqrt(dist_sq);
    let normal = if distance.is_zero() {
        normal_from_velocity(vel_a, vel_b)
    } else {
        (cb.world_center() - ca.world_center()) / distance
    };
    Some(CollisionInfo {
        a: a.id(),
        b: b.id(),
        normal,
        depth: radius_sum - distance,
        point_a: ca.world_center() + normal * ca.world_radius(),
        point_b: cb.world_center() - normal * cb.world_radius(),
    })
}

fn test_segment_segment(a: &Collider, b: &Collider) -> Option<CollisionInfo> {
    let (sa, sb) = match (&a.shape, &b.shape) {
        (crate::collide::ColliderShape::Segment(sa), crate::collide::ColliderShape::Segment(sb)) => (sa, sb),
        _ => unreachable!("test_segment_segment called with non-segment shapes"),
    };
    let da = sa.world_end() - sa.world_start();
    let db = sb.world_end() - sb.world_start();
    let denom = da.cross(db);
    if denom.is_zero() {
        return None;
    }
    let diff = sb.world_start() - sa.world_start();
    let t1 = diff.cross(db) / denom;
    let t2 = diff.cross(da) / denom;
    if t1.raw() < 0 || t1 > FixedNum::ONE || t2.raw() < 0 || t2 > FixedNum::ONE {
        return None;
    }
    let point = sa.world_start() + da * t1;
    Some(CollisionInfo {
        a: a.id(),
        b: b.id(),
        normal: sa.world_normal(),
        depth: da.length() * t1,
        point_a: point,
        point_b: point,
    })
}

fn test_segment_circle(a: &Collider, b: &Collider, vel_a: Vec3, vel_b: Vec3) -> Option<CollisionInfo> {
    let (sa, cb) = match (&a.shape, &b.shape) {
        (crate::collide::ColliderShape::Segment(sa), crate::collide::ColliderShape::Circle(cb)) => (sa, cb),
        _ => unreachable!("test_segment_circle called with non segment/circle shapes"),
    };
    let edge = sa.world_end() - sa.world_start();
    let len_sq = edge.length_sq();
    let t = if len_sq.is_zero() {
        FixedNum::ZERO
    } else {
        ((cb.world_center() - sa.world_start()).dot(edge) / len_sq).clamp(FixedNum::ZERO, FixedNum::ONE)
    };
    let closest = sa.world_start() + edge * t;
    let dist_sq = closest.distance_sq(cb.world_center());
    if dist_sq > cb.world_radius() * cb.world_radius() {
        return None;
    }
    let distance = crate::trig::sqrt(dist_sq);
    let normal = if distance.is_zero() {
        normal_from_velocity(vel_a, vel_b)
    } else {
        (cb.world_center() - closest) / distance
    };
    Some(CollisionInfo {
        a: a.id(),
        b: b.id(),
        normal,
        depth: cb.world_radius() - distance,
        point_a: closest,
        point_b: cb.world_center() - normal * cb.world_radius(),
    })
}

fn test_gjk(a: &Collider, b: &Collider) -> Option<CollisionInfo> {
    let result = gjk::query_collision(&a.shape, &b.shape)?;
    Some(CollisionInfo {
        a: a.id(),
        b: b.id(),
        normal: result.normal,
        depth: result.depth,
        point_a: result.point_a,
        point_b: result.point_b,
    })
}

/// Runs the appropriate narrow-phase test for a candidate pair,
/// swapping so the numerically higher [`ShapeKind`] is evaluated first.
pub fn collision_test(a: &Collider, b: &Collider, vel_a: Vec3, vel_b: Vec3) -> Option<CollisionInfo> {
    let (hi, lo, hi_vel, lo_vel, swapped) = if a.shape.kind() >= b.shape.kind() {
        (a, b, vel_a, vel_b, false)
    } else {
        (b, a, vel_b, vel_a, true)
    };

    let result = match (hi.shape.kind(), lo.shape.kind()) {
        (ShapeKind::Circle, ShapeKind::Circle) => test_circle_circle(hi, lo, hi_vel, lo_vel),
        (ShapeKind::Segment, ShapeKind::Circle) => test_segment_circle(hi, lo, hi_vel, lo_vel),
        (ShapeKind::Segment, ShapeKind::Segment) => test_segment_segment(hi, lo),
        (ShapeKind::Polygon, _) => test_gjk(hi, lo),
        _ => None,
    }?;

    Some(if swapped { result.swapped() } else { result })
}

/// Best-first ray test against a single collider's own shape.
pub fn ray_cast(collider: &Collider, ray: &Ray) -> Option<crate::collide::RaycastHit> {
    collider.shape.ray_cast(ray)
}
