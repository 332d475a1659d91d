//! Typed error surface for the handful of engine operations that need
//! a matchable failure rather than just a log line (§7 of the engine's
//! design: nothing ever throws across the public API — `World` keeps
//! the most recent [`PhysicsError`] in a slot instead, readable through
//! [`crate::world::World::last_error`]).

use thiserror::Error;

/// An engine-internal failure. Every variant is logged at the site it
/// occurs (`InvalidOperation`/`IdOverflow` at `error!`,
/// `PreconditionViolated` at `warn!`) and the triggering call is always
/// a no-op; this type exists so tests and diagnostics can assert which
/// failure happened without scraping log text.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PhysicsError {
    /// An operation that cannot be satisfied given current ownership
    /// state: a collider already owned by another body, a body already
    /// in a different world, a collider already indexed by a BVH.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// A precondition the caller was responsible for upholding was
    /// violated (e.g. profiler `end` without a matching `begin`).
    #[error("precondition violated: {0}")]
    PreconditionViolated(&'static str),

    /// The monotonic 32-bit id counter wrapped; it has been reset to 1
    /// and allocation proceeds, so duplicate ids are now possible.
    #[error("id counter overflowed and was reset")]
    IdOverflow,

    /// A `FixedNum` arithmetic operation produced a value outside the
    /// representable range and was truncated per the integer wrapping
    /// semantics; reported for diagnostics only, never blocks the call.
    #[error("numeric saturation: {0}")]
    NumericSaturation(&'static str),
}
