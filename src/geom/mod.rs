//! Fixed-point geometry primitives: vectors, the affine matrix, and
//! axis-aligned bounding boxes.

pub mod aabb;
pub mod matrix;
pub mod vector;

pub use aabb::Aabb;
pub use matrix::Mat2D;
pub use vector::{Vec2, Vec3};
