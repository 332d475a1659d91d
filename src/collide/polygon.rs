//! Convex polygon collider: CCW vertex list with a parallel world-space cache.

use crate::collide::{Ray, RaycastHit};
use crate::fixed::FixedNum;
use crate::geom::{Aabb, Mat2D, Vec2, Vec3};

/// A convex polygon collider, vertices wound counter-clockwise.
#[derive(Clone, Debug)]
pub struct PolygonShape {
    local_vertices: Vec<Vec3>,
    world_vertices: Vec<Vec2>,
}

impl PolygonShape {
    /// Builds a polygon from explicit local-space vertices (must be
    /// convex and CCW-wound; not validated here, matching the
    /// reference source's contract).
    pub fn new(vertices: Vec<Vec3>) -> Self {
        let n = vertices.len();
        PolygonShape {
            local_vertices: vertices,
            world_vertices: vec![Vec2::ZERO; n],
        }
    }

    /// Builds an axis-aligned rectangle of the given full width/height,
    /// centered at the local origin.
    pub fn rectangle(width: FixedNum, height: FixedNum) -> Self {
        let dx = width / FixedNum::from_int(2);
        let dy = height / FixedNum::from_int(2);
        let y = FixedNum::ZERO;
        PolygonShape::new(vec![
            Vec3::new(-dx, y, -dy),
            Vec3::new(-dx, y, dy),
            Vec3::new(dx, y, dy),
            Vec3::new(dx, y, -dy),
        ])
    }

    /// Current world-space vertices.
    pub fn world_vertices(&self) -> &[Vec2] {
        &self.world_vertices
    }

    /// Recomputes every world-space vertex from the owning body's matrix.
    pub fn update_transform(&mut self, body_matrix: Mat2D) {
        for (local, world) in self.local_vertices.iter().zip(self.world_vertices.iter_mut()) {
            *world = body_matrix.transform_point(local.to_xz());
        }
    }

    /// World-space AABB, the union of every transformed vertex.
    pub fn bounds(&self) -> Aabb {
        let mut bb = Aabb::EMPTY;
        for &v in &self.world_vertices {
            bb.add_point(v);
        }
        bb
    }

    /// Argmax of `dot(vertex, dir)` over all vertices.
    pub fn support_in_direction(&self, dir: Vec2) -> Vec2 {
        let mut best = self.world_vertices[0];
        let mut best_dot = best.dot(dir);
        for &v in &self.world_vertices[1..] {
            let d = v.dot(dir);
            if d > best_dot {
                best_dot = d;
                best = v;
            }
        }
        best
    }

    /// Half-plane containment test, expanded outward by `radius` on
    /// every edge. The winding (which side is "interior") is determined
    /// from the first three vertices, then every edge's signed distance
    /// to `point` must agree with that winding once relaxed by `radius`.
    ///
    /// The reference source's polygon `overlapPoint` ignores its radius
    /// parameter entirely; this implementation honors it, since the
    /// specification's worked examples require a radius-tolerant edge
    /// test (a point just outside the polygon, within tolerance of an
    /// edge, must report containment).
    pub fn contains_point(&self, point: Vec2, radius: FixedNum) -> bool {
        let verts = &self.world_vertices;
        let n = verts.len();
        if n < 3 {
            return false;
        }

        let winding_positive = which_side(verts[0], verts[1], verts[2]) >= FixedNum::ZERO;

        for i in 0..n {
            let a = verts[i];
            let b = verts[(i + 1) % n];
            let edge = b - a;
            let edge_len = edge.length();
            if edge_len.is_zero() {
                continue;
            }
            // Signed distance from point to the infinite edge line,
            // positive on the same side as `which_side` being positive.
            let signed_area = which_side(a, b, point);
            let signed_distance = signed_area / edge_len;
            let tolerant = if winding_positive {
                signed_distance >= -radius
            } else {
                signed_distance <= radius
            };
            if !tolerant {
                return false;
            }
        }
        true
    }

    /// Per-edge 2x2 linear system, keeping the minimum accepted `t` across all edges.
    pub fn ray_cast(&self, ray: &Ray) -> Option<RaycastHit> {
        let verts = &self.world_vertices;
        let n = verts.len();
        let ray_vec = ray.end - ray.start;
        let mut best: Option<(FixedNum, Vec2)> = None;

        for i in 0..n {
            let a = verts[i];
            let b = verts[(i + 1) % n];
            let edge = b - a;
            let denom = ray_vec.cross(edge);
            if denom.is_zero() {
                continue;
            }
            let diff = a - ray.start;
            let t1 = diff.cross(edge) / denom;
            let t2 = diff.cross(ray_vec) / denom;
            if t1.raw() < 0 || t1 > FixedNum::ONE || t2.raw() < 0 || t2 > FixedNum::ONE {
                continue;
            }
            if best.map(|(best_t, _)| t1 < best_t).unwrap_or(true) {
                best = Some((t1, ray.start + ray_vec * t1));
            }
        }

        best.map(|(t1, point)| RaycastHit {
            point,
            normal: ray.direction,
            distance: ray.distance * t1,
        })
    }
}

/// Signed area of the triangle `(a, b, c)`; sign gives which side of
/// line `ab` point `c` is on. Shared by the polygon winding/containment
/// test and by GJK/EPA's simplex orientation checks.
pub fn which_side(a: Vec2, b: Vec2, c: Vec2) -> FixedNum {
    (b - a).cross(c - a)
}
