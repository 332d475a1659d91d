//! Line-segment emission for collider shapes, consumed by whatever
//! renderer an embedding application wires up; this crate draws
//! nothing itself.

use crate::collide::{ColliderShape, ShapeKind};
use crate::fixed::FixedNum;
use crate::geom::Vec2;
use crate::world::World;

/// Number of segments used to approximate a circle's circumference.
const CIRCLE_SEGMENTS: u32 = 16;

/// One line to draw, in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DebugLine {
    /// Line start.
    pub start: Vec2,
    /// Line end.
    pub end: Vec2,
}

impl DebugLine {
    fn new(start: Vec2, end: Vec2) -> Self {
        DebugLine { start, end }
    }
}

/// Emits the line segments approximating a single shape's world-space
/// outline.
pub fn shape_lines(shape: &ColliderShape) -> Vec<DebugLine> {
    match shape.kind() {
        ShapeKind::Circle => {
            let ColliderShape::Circle(circle) = shape else {
                unreachable!("kind() matched Circle")
            };
            let center = circle.world_center();
            let radius = circle.world_radius();
            let mut lines = Vec::with_capacity(CIRCLE_SEGMENTS as usize);
            let step = FixedNum::from_int(360) / FixedNum::from_int(CIRCLE_SEGMENTS as i32);
            let mut prev = center + Vec2::from_angle(FixedNum::ZERO) * radius;
            for i in 1..=CIRCLE_SEGMENTS {
                let angle = step * FixedNum::from_int(i as i32);
                let next = center + Vec2::from_angle(angle) * radius;
                lines.push(DebugLine::new(prev, next));
                prev = next;
            }
            lines
        }
        ShapeKind::Segment => {
            let ColliderShape::Segment(segment) = shape else {
                unreachable!("kind() matched Segment")
            };
            vec![DebugLine::new(segment.world_start(), segment.world_end())]
        }
        ShapeKind::Polygon => {
            let ColliderShape::Polygon(polygon) = shape else {
                unreachable!("kind() matched Polygon")
            };
            let verts = polygon.world_vertices();
            let n = verts.len();
            (0..n).map(|i| DebugLine::new(verts[i], verts[(i + 1) % n])).collect()
        }
    }
}

/// Emits every collider's outline in the world, for a caller that
/// wants a single draw-everything pass rather than walking bodies
/// itself.
pub fn world_lines(world: &World) -> Vec<DebugLine> {
    let mut lines = Vec::new();
    for body in world.bodies_iter() {
        for collider in body.colliders() {
            lines.extend(shape_lines(&collider.shape));
        }
    }
    lines
}
