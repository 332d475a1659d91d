//! Deterministic fixed-point 2D rigid body physics.
//!
//! Every quantity that affects simulation outcome is represented with
//! [`fixed::FixedNum`]; nothing here ever touches a host float at
//! runtime, so two runs fed the same inputs in the same order produce
//! bit-identical results regardless of platform — the property a
//! lockstep multiplayer simulation depends on.
//!
//! Start at [`world::World`]: it owns every body and collider, and
//! [`world::World::tick`] is the sole entry point that advances state.

pub mod body;
pub mod bvh;
pub mod clock;
pub mod collide;
pub mod debug_draw;
pub mod errors;
pub mod fixed;
pub mod geom;
pub mod trig;
pub mod world;

pub use body::{BodyId, BodyKind, RigidBody};
pub use clock::{Clock, SystemClock};
pub use collide::{Collider, ColliderFilter, ColliderId, ColliderShape, Ray, RaycastHit, ShapeKind};
pub use debug_draw::{shape_lines, world_lines, DebugLine};
pub use errors::PhysicsError;
pub use fixed::FixedNum;
pub use geom::{Aabb, Mat2D, Vec2, Vec3};
pub use world::{ContactPair, ContactState, World, WorldConfig};
