//! GJK distance/collision test over the Minkowski difference, continued
//! by EPA to recover a penetration normal and depth on overlap.

use crate::collide::ColliderShape;
use crate::fixed::FixedNum;
use crate::geom::Vec2;
use crate::trig::DEFAULT_EPSILON;

const MAX_ITER: u32 = 10;

/// A point on the Minkowski difference A ⊖ B, carrying the two
/// originating support points so world-space closest/contact points
/// can be reconstructed later by interpolation.
#[derive(Clone, Copy, Debug)]
struct SupportPoint {
    point: Vec2,
    from_a: Vec2,
    from_b: Vec2,
}

fn support(a: &ColliderShape, b: &ColliderShape, dir: Vec2) -> SupportPoint {
    let pa = a.support_in_direction(dir);
    let pb = b.support_in_direction(-dir);
    SupportPoint {
        point: pa - pb,
        from_a: pa,
        from_b: pb,
    }
}

/// Final result of a successful collision query: penetration normal
/// (pointing from A toward B), depth, and reconstructed world contacts.
#[derive(Clone, Copy, Debug)]
pub struct GjkContact {
    /// Penetration normal, pointing from shape A toward shape B.
    pub normal: Vec2,
    /// Penetration depth.
    pub depth: FixedNum,
    /// World contact point on shape A.
    pub point_a: Vec2,
    /// World contact point on shape B.
    pub point_b: Vec2,
}

/// Distance-only result for two non-overlapping shapes.
#[derive(Clone, Copy, Debug)]
pub struct ClosestPoints {
    /// Closest point on shape A.
    pub point_a: Vec2,
    /// Closest point on shape B.
    pub point_b: Vec2,
    /// Distance between them.
    pub distance: FixedNum,
}

/// Clamped parametric projection of the origin onto segment `[a, b]`.
fn closest_to_origin_clamped(a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq.is_zero() {
        return a;
    }
    let t = (-a.dot(ab) / len_sq).clamp(FixedNum::ZERO, FixedNum::ONE);
    a + ab * t
}

fn reconstruct(p0: SupportPoint, p1: SupportPoint) -> (Vec2, Vec2, FixedNum) {
    let ab = p1.point - p0.point;
    let len_sq = ab.length_sq();
    let r = if len_sq.is_zero() {
        FixedNum::ZERO
    } else {
        (-p0.point.dot(ab) / len_sq).clamp(FixedNum::ZERO, FixedNum::ONE)
    };
    let point_a = p0.from_a + (p1.from_a - p0.from_a) * r;
    let point_b = p0.from_b + (p1.from_b - p0.from_b) * r;
    let closest = p0.point + ab * r;
    (point_a, point_b, closest.length())
}

enum GjkOutcome {
    /// Triangle simplex enclosing the origin: continue to EPA.
    Collision([SupportPoint; 3]),
    /// Final two-point edge, with no collision.
    Separated(SupportPoint, SupportPoint),
}

fn triangle_contains_origin(pts: &[Vec2; 3]) -> bool {
    use crate::collide::polygon::which_side;
    let s0 = which_side(pts[0], pts[1], Vec2::ZERO);
    let s1 = which_side(pts[1], pts[2], Vec2::ZERO);
    let s2 = which_side(pts[2], pts[0], Vec2::ZERO);
    (s0 >= FixedNum::ZERO && s1 >= FixedNum::ZERO && s2 >= FixedNum::ZERO)
        || (s0 <= FixedNum::ZERO && s1 <= FixedNum::ZERO && s2 <= FixedNum::ZERO)
}

fn run_gjk(a: &ColliderShape, b: &ColliderShape) -> GjkOutcome {
    let center_diff = {
        let ba = a.bounds().center();
        let bb = b.bounds().center();
        ba - bb
    };
    let mut dir = if center_diff == Vec2::ZERO {
        Vec2::new(FixedNum::ONE, FixedNum::ZERO)
    } else {
        center_diff
    };

    let mut s0 = support(a, b, dir);
    let mut s1 = support(a, b, -dir);
    dir = -closest_to_origin_clamped(s0.point, s1.point);

    for _ in 0..MAX_ITER {
        if dir.length_sq() <= DEFAULT_EPSILON * DEFAULT_EPSILON {
            return GjkOutcome::Collision([s0, s1, s0]);
        }

        let new_point = support(a, b, dir);
        let eps_sq = DEFAULT_EPSILON * DEFAULT_EPSILON;
        if new_point.point.distance_sq(s0.point) <= eps_sq || new_point.point.distance_sq(s1.point) <= eps_sq {
            return GjkOutcome::Separated(s0, s1);
        }

        let tri = [s0.point, s1.point, new_point.point];
        if triangle_contains_origin(&tri) {
            return GjkOutcome::Collision([s0, s1, new_point]);
        }

        // Keep whichever of the two new edges (s0,new) / (s1,new) is closer
        // to the origin, discarding the far vertex.
        let closest_on_a = closest_to_origin_clamped(s0.point, new_point.point);
        let closest_on_b = closest_to_origin_clamped(s1.point, new_point.point);
        if closest_on_a.length_sq() < closest_on_b.length_sq() {
            s1 = new_point;
            dir = -closest_on_a;
        } else {
            s0 = new_point;
            dir = -closest_on_b;
        }
    }

    GjkOutcome::Separated(s0, s1)
}

struct Edge {
    p0: SupportPoint,
    p1: SupportPoint,
    normal: Vec2,
    distance: FixedNum,
}

/// Outward unit normal of edge `(a, b)` and the (unclamped) distance
/// from the origin to the line through it. "Outward" means pointing
/// away from the origin, recovered by flipping the perpendicular if it
/// points back toward `a`.
fn edge_normal_and_distance(a: Vec2, b: Vec2) -> (Vec2, FixedNum) {
    let edge = b - a;
    let len = edge.length();
    if len.is_zero() {
        // Degenerate edge: fall back to a direction perpendicular to `a`
        // itself, since the true edge direction carries no information.
        let fallback = a.normalize().perpendicular();
        return (fallback, FixedNum::ZERO);
    }
    let mut normal = edge.perpendicular() / len;
    if normal.dot(a) < FixedNum::ZERO {
        normal = -normal;
    }
    let distance = normal.dot(a);
    (normal, distance)
}

fn make_edge(p0: SupportPoint, p1: SupportPoint) -> Edge {
    let (normal, distance) = edge_normal_and_distance(p0.point, p1.point);
    Edge {
        p0,
        p1,
        normal,
        distance,
    }
}

fn run_epa(a: &ColliderShape, b: &ColliderShape, simplex: [SupportPoint; 3]) -> GjkContact {
    let [p0, p1, p2] = simplex;
    // Orient CCW so every edge's outward normal faces away from the origin.
    let (p0, p1, p2) = {
        use crate::collide::polygon::which_side;
        if which_side(p0.point, p1.point, p2.point) >= FixedNum::ZERO {
            (p0, p1, p2)
        } else {
            (p0, p2, p1)
        }
    };
    let mut edges = vec![make_edge(p0, p1), make_edge(p1, p2), make_edge(p2, p0)];

    for _ in 0..MAX_ITER {
        let (idx, closest) = edges
            .iter()
            .enumerate()
            .min_by(|(_, x), (_, y)| x.distance.cmp(&y.distance))
            .map(|(i, e)| (i, e))
            .expect("EPA polytope always has at least one edge");

        let new_point = support(a, b, closest.normal);
        let d = new_point.point.dot(closest.normal);

        if (d - closest.distance).abs() <= DEFAULT_EPSILON {
            let (point_a, point_b, depth) = reconstruct(edges[idx].p0, edges[idx].p1);
            return GjkContact {
                normal: closest.normal,
                depth,
                point_a,
                point_b,
            };
        }

        let (p0, p1) = (edges[idx].p0, edges[idx].p1);
        edges.remove(idx);
        edges.push(make_edge(p0, new_point));
        edges.push(make_edge(new_point, p1));
    }

    let closest = edges
        .iter()
        .min_by(|x, y| x.distance.cmp(&y.distance))
        .expect("EPA polytope always has at least one edge");
    let (point_a, point_b, depth) = reconstruct(closest.p0, closest.p1);
    GjkContact {
        normal: closest.normal,
        depth,
        point_a,
        point_b,
    }
}

/// Full GJK query; on overlap, continues into EPA and returns the
/// penetration normal/depth/contacts. Returns `None` if the shapes
/// don't actually overlap (the candidate pair was a broadphase-only
/// false positive).
pub fn query_collision(a: &ColliderShape, b: &ColliderShape) -> Option<GjkContact> {
    match run_gjk(a, b) {
        GjkOutcome::Collision(simplex) => Some(run_epa(a, b, simplex)),
        GjkOutcome::Separated(_, _) => None,
    }
}

/// Closest-points query for two (possibly non-overlapping) shapes.
/// Exposed as a standalone primitive per the specification's GJK
/// section; not consulted by the world tick, which only needs `Some`
/// collisions, but useful to embedding applications doing distance
/// queries.
pub fn closest_points(a: &ColliderShape, b: &ColliderShape) -> ClosestPoints {
    match run_gjk(a, b) {
        GjkOutcome::Separated(s0, s1) => {
            let (point_a, point_b, distance) = reconstruct(s0, s1);
            ClosestPoints {
                point_a,
                point_b,
                distance,
            }
        }
        GjkOutcome::Collision(simplex) => {
            let contact = run_epa(a, b, simplex);
            ClosestPoints {
                point_a: contact.point_a,
                point_b: contact.point_b,
                distance: FixedNum::ZERO,
            }
        }
    }
}
