//! Collider shapes and the narrow-phase tests between them.

pub mod circle;
pub mod gjk;
pub mod narrow;
pub mod polygon;
pub mod segment;

use crate::body::BodyId;
use crate::fixed::FixedNum;
use crate::geom::{Aabb, Mat2D, Vec2};

pub use circle::CircleShape;
pub use narrow::CollisionInfo;
pub use polygon::PolygonShape;
pub use segment::SegmentShape;

/// Stable numeric identifier for a collider, monotonically assigned by
/// the owning [`crate::world::World`]. Carries no ownership; resolved
/// back through the world's arena on every access.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ColliderId(pub u32);

/// A ray, carrying both endpoints and the precomputed unit direction
/// and total distance, mirroring the reference `FRay` convenience type.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    /// Ray origin.
    pub start: Vec2,
    /// Ray terminus.
    pub end: Vec2,
    /// Unit direction from `start` toward `end`.
    pub direction: Vec2,
    /// Distance from `start` to `end`.
    pub distance: FixedNum,
}

impl Ray {
    /// Builds a ray from two endpoints, deriving direction and distance.
    pub fn from_points(start: Vec2, end: Vec2) -> Self {
        let delta = end - start;
        let distance = delta.length();
        let direction = delta.normalize();
        Ray {
            start,
            end,
            direction,
            distance,
        }
    }

    /// Builds a ray from an origin, direction, and length.
    pub fn from_direction(start: Vec2, direction: Vec2, distance: FixedNum) -> Self {
        Ray {
            start,
            end: start + direction * distance,
            direction,
            distance,
        }
    }
}

/// Result of a successful [`Collider::ray_cast`].
#[derive(Clone, Copy, Debug)]
pub struct RaycastHit {
    /// World-space contact point.
    pub point: Vec2,
    /// Surface normal at the hit (the ray direction, in this engine —
    /// faces are not normal-oriented).
    pub normal: Vec2,
    /// Distance from the ray origin to the hit point.
    pub distance: FixedNum,
}

/// Collision filter: two colliders may collide iff their groups differ
/// (or either group is zero) and their layer/mask bits overlap in
/// either direction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ColliderFilter {
    /// Colliders sharing a non-zero group never collide with each other.
    pub group: u32,
    /// This collider's layer bits.
    pub layer: u32,
    /// Bits of other colliders' layers this collider collides with.
    pub mask: u32,
}

impl Default for ColliderFilter {
    fn default() -> Self {
        ColliderFilter {
            group: 0,
            layer: 0xffff_ffff,
            mask: 0xffff_ffff,
        }
    }
}

impl ColliderFilter {
    /// Symmetric collision predicate; see §3 of the engine's specification.
    pub fn can_collide(self, other: ColliderFilter) -> bool {
        (self.group != other.group || self.group == 0)
            && ((self.mask & other.layer) != 0 || (other.mask & self.layer) != 0)
    }
}

/// A tagged union over the three supported shape kinds.
#[derive(Clone, Debug)]
pub enum ColliderShape {
    /// See [`CircleShape`].
    Circle(CircleShape),
    /// See [`SegmentShape`].
    Segment(SegmentShape),
    /// See [`PolygonShape`].
    Polygon(PolygonShape),
}

/// Discriminant used to index the narrow-phase dispatch table; ordinal
/// order matters (Circle < Segment < Polygon) because the dispatcher
/// always swaps a pair so the higher-valued type is first.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum ShapeKind {
    /// See [`CircleShape`].
    Circle = 0,
    /// See [`SegmentShape`].
    Segment = 1,
    /// See [`PolygonShape`].
    Polygon = 2,
}

impl ColliderShape {
    /// This shape's discriminant.
    pub fn kind(&self) -> ShapeKind {
        match self {
            ColliderShape::Circle(_) => ShapeKind::Circle,
            ColliderShape::Segment(_) => ShapeKind::Segment,
            ColliderShape::Polygon(_) => ShapeKind::Polygon,
        }
    }

    /// Recomputes world-space pose from the owning body's matrix.
    pub fn update_transform(&mut self, body_matrix: Mat2D) {
        match self {
            ColliderShape::Circle(c) => c.update_transform(body_matrix),
            ColliderShape::Segment(s) => s.update_transform(body_matrix),
            ColliderShape::Polygon(p) => p.update_transform(body_matrix),
        }
    }

    /// World-space AABB.
    pub fn bounds(&self) -> Aabb {
        match self {
            ColliderShape::Circle(c) => c.bounds(),
            ColliderShape::Segment(s) => s.bounds(),
            ColliderShape::Polygon(p) => p.bounds(),
        }
    }

    /// GJK support function: farthest point on the shape in `dir`.
    pub fn support_in_direction(&self, dir: Vec2) -> Vec2 {
        match self {
            ColliderShape::Circle(c) => c.support_in_direction(dir),
            ColliderShape::Segment(s) => s.support_in_direction(dir),
            ColliderShape::Polygon(p) => p.support_in_direction(dir),
        }
    }

    /// True if the shape, expanded by `radius`, contains `point`.
    pub fn contains_point(&self, point: Vec2, radius: FixedNum) -> bool {
        match self {
            ColliderShape::Circle(c) => c.contains_point(point, radius),
            ColliderShape::Segment(s) => s.contains_point(point, radius),
            ColliderShape::Polygon(p) => p.contains_point(point, radius),
        }
    }

    /// This shape's own ray test.
    pub fn ray_cast(&self, ray: &Ray) -> Option<RaycastHit> {
        match self {
            ColliderShape::Circle(c) => c.ray_cast(ray),
            ColliderShape::Segment(s) => s.ray_cast(ray),
            ColliderShape::Polygon(p) => p.ray_cast(ray),
        }
    }
}

/// A collider: a shape plus the engine bookkeeping every collider carries
/// regardless of shape (id, owner, filter, material-ish coefficients).
#[derive(Clone, Debug)]
pub struct Collider {
    id: ColliderId,
    body: Option<BodyId>,
    /// The shape variant and its world-space cache.
    pub shape: ColliderShape,
    /// True world-space bounds (not the BVH's loose leaf box).
    pub bounds: Aabb,
    /// Coulomb friction coefficient.
    pub friction: FixedNum,
    /// Elasticity coefficient. Stored for callers; not wired into the
    /// solver (Non-goal — see §1 of the specification).
    pub elasticity: FixedNum,
    /// Triggers report contacts but never participate in the solver.
    pub is_trigger: bool,
    /// Collision filter.
    pub filter: ColliderFilter,
    /// Opaque user data, resolved by the embedding application.
    pub user_data: u64,
}

impl Collider {
    /// Builds a new, not-yet-transformed collider. `update_transform`
    /// must be called at least once (the owning body does this) before
    /// `bounds` is meaningful.
    pub fn new(id: ColliderId, shape: ColliderShape) -> Self {
        Collider {
            id,
            body: None,
            shape,
            bounds: Aabb::EMPTY,
            friction: FixedNum::ZERO,
            elasticity: FixedNum::ZERO,
            is_trigger: false,
            filter: ColliderFilter::default(),
            user_data: 0,
        }
    }

    /// This collider's id.
    pub fn id(&self) -> ColliderId {
        self.id
    }

    /// The body this collider is currently attached to, if any.
    pub fn body(&self) -> Option<BodyId> {
        self.body
    }

    /// Internal: called by `RigidBody::add_collider`.
    pub(crate) fn set_body(&mut self, body: BodyId) {
        self.body = Some(body);
    }

    /// Recomputes `bounds` from the shape's own transform update.
    pub fn update_transform(&mut self, body_matrix: Mat2D) {
        self.shape.update_transform(body_matrix);
        self.bounds = self.shape.bounds();
    }

    /// Two colliders may collide iff they belong to different bodies
    /// and their filters allow it.
    pub fn can_collide_with(&self, other: &Collider) -> bool {
        self.body != other.body && self.filter.can_collide(other.filter)
    }
}
