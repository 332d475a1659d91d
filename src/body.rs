//! Rigid bodies: mass properties, integration, and the colliders they own.

use crate::collide::{Collider, ColliderId};
use crate::fixed::FixedNum;
use crate::geom::{Mat2D, Vec2, Vec3};
use crate::trig::DEGREE_TO_RADIAN;

/// Stable numeric identifier for a body, monotonically assigned by the
/// owning [`crate::world::World`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct BodyId(pub u32);

/// How a body participates in the simulation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BodyKind {
    /// Moved by forces and impulses; collides with everything.
    Dynamic,
    /// Moved only by its own velocity, ignoring forces; pushes dynamic
    /// bodies but is never pushed back.
    Kinematic,
    /// Never moves.
    Static,
}

/// A rigid body: pose, mass properties, motion state, and the colliders
/// attached to it.
#[derive(Clone, Debug)]
pub struct RigidBody {
    id: BodyId,
    kind: BodyKind,

    mass: FixedNum,
    inv_mass: FixedNum,
    inertia: FixedNum,
    inv_inertia: FixedNum,

    position: Vec3,
    angle: FixedNum,
    scale: FixedNum,

    velocity: Vec3,
    angular_velocity: FixedNum,

    force: Vec3,
    torque: FixedNum,
    /// One-frame impulse accumulator, consumed (scaled by `invMass`) in
    /// [`RigidBody::integrate_velocity`] and cleared immediately after —
    /// the reference source's `forceImpulse`.
    force_impulse: Vec3,
    torque_impulse: FixedNum,
    /// One-frame position-only pulse: added to velocity for a single
    /// [`RigidBody::integrate_position`] displacement without polluting
    /// the stored velocity the solver and sleep bookkeeping see —
    /// the reference source's `pulseVelocity`.
    pulse_velocity: Vec3,
    pulse_angular_velocity: FixedNum,

    idle_time: FixedNum,

    matrix: Mat2D,
    transform_dirty: bool,
    is_active: bool,
    /// Tick index at which this body last participated in a contact;
    /// used by [`RigidBody::can_sleep`] to veto sleep on the same tick
    /// a collision touched it.
    collision_stamp: u64,

    colliders: Vec<Collider>,
}

impl RigidBody {
    fn new(id: BodyId, kind: BodyKind, mass: FixedNum, inertia: FixedNum) -> Self {
        let mut body = RigidBody {
            id,
            kind,
            mass: FixedNum::ZERO,
            inv_mass: FixedNum::ZERO,
            inertia: FixedNum::ZERO,
            inv_inertia: FixedNum::ZERO,
            position: Vec3::ZERO,
            angle: FixedNum::ZERO,
            scale: FixedNum::ONE,
            velocity: Vec3::ZERO,
            angular_velocity: FixedNum::ZERO,
            force: Vec3::ZERO,
            torque: FixedNum::ZERO,
            force_impulse: Vec3::ZERO,
            torque_impulse: FixedNum::ZERO,
            pulse_velocity: Vec3::ZERO,
            pulse_angular_velocity: FixedNum::ZERO,
            idle_time: FixedNum::ZERO,
            matrix: Mat2D::IDENTITY,
            transform_dirty: true,
            is_active: true,
            collision_stamp: 0,
            colliders: Vec::new(),
        };
        body.set_mass(mass);
        body.set_inertia(inertia);
        body
    }

    /// Builds a dynamic body with the given mass and moment of inertia.
    pub fn new_dynamic(id: BodyId, mass: FixedNum, inertia: FixedNum) -> Self {
        RigidBody::new(id, BodyKind::Dynamic, mass, inertia)
    }

    /// Builds a static body: infinite mass and inertia, never integrated.
    pub fn new_static(id: BodyId) -> Self {
        RigidBody::new(id, BodyKind::Static, FixedNum::MAX, FixedNum::MAX)
    }

    /// Builds a kinematic body: driven purely by its own velocity.
    pub fn new_kinematic(id: BodyId) -> Self {
        RigidBody::new(id, BodyKind::Kinematic, FixedNum::MAX, FixedNum::MAX)
    }

    /// This body's id.
    pub fn id(&self) -> BodyId {
        self.id
    }

    /// Internal: called once by [`crate::world::World::add_body`] to
    /// stamp in the id the world just assigned, since bodies are built
    /// with a placeholder id before the world takes ownership of them.
    pub(crate) fn rebind_id(&mut self, id: BodyId) {
        self.id = id;
    }

    /// This body's kind.
    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    /// True for [`BodyKind::Static`].
    pub fn is_static(&self) -> bool {
        self.kind == BodyKind::Static
    }

    /// True for [`BodyKind::Dynamic`].
    pub fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Dynamic
    }

    /// Mass. A mass at or above [`FixedNum::MAX`] is treated as infinite.
    pub fn mass(&self) -> FixedNum {
        self.mass
    }

    /// Inverse mass (zero for static/infinite-mass bodies).
    pub fn inv_mass(&self) -> FixedNum {
        self.inv_mass
    }

    /// Sets mass, deriving the inverse with the same zero/infinite
    /// sentinel handling as [`RigidBody::set_inertia`].
    pub fn set_mass(&mut self, mass: FixedNum) {
        self.mass = mass;
        self.inv_mass = if mass >= FixedNum::MAX {
            FixedNum::ZERO
        } else if mass <= FixedNum::ZERO {
            FixedNum::MAX
        } else {
            FixedNum::ONE / mass
        };
    }

    /// Moment of inertia.
    pub fn inertia(&self) -> FixedNum {
        self.inertia
    }

    /// Inverse moment of inertia (zero for static/infinite-inertia bodies).
    pub fn inv_inertia(&self) -> FixedNum {
        self.inv_inertia
    }

    /// Sets moment of inertia, deriving the inverse.
    pub fn set_inertia(&mut self, inertia: FixedNum) {
        self.inertia = inertia;
        self.inv_inertia = if inertia >= FixedNum::MAX {
            FixedNum::ZERO
        } else if inertia <= FixedNum::ZERO {
            FixedNum::MAX
        } else {
            FixedNum::ONE / inertia
        };
    }

    /// Current position.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Sets position, marking the transform dirty if it actually changed.
    pub fn set_position(&mut self, position: Vec3) {
        if self.position == position {
            return;
        }
        self.position = position;
        self.mark_transform_dirty();
    }

    /// Current rotation, in degrees.
    pub fn angle(&self) -> FixedNum {
        self.angle
    }

    /// Sets rotation, marking the transform dirty if it actually changed.
    pub fn set_angle(&mut self, angle: FixedNum) {
        if self.angle == angle {
            return;
        }
        self.angle = angle;
        self.mark_transform_dirty();
    }

    /// True if the pose changed since the last [`RigidBody::update_transform`]
    /// (or [`RigidBody::matrix`]) call.
    pub fn is_transform_dirty(&self) -> bool {
        self.transform_dirty
    }

    /// Current uniform scale.
    pub fn scale(&self) -> FixedNum {
        self.scale
    }

    /// Sets uniform scale, marking the transform dirty if it changed.
    pub fn set_scale(&mut self, scale: FixedNum) {
        if self.scale == scale {
            return;
        }
        self.scale = scale;
        self.mark_transform_dirty();
    }

    /// Current linear velocity.
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Sets linear velocity and wakes the body.
    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
        self.set_active(true);
    }

    /// Current angular velocity, in degrees per second.
    pub fn angular_velocity(&self) -> FixedNum {
        self.angular_velocity
    }

    /// Sets angular velocity and wakes the body.
    pub fn set_angular_velocity(&mut self, angular_velocity: FixedNum) {
        self.angular_velocity = angular_velocity;
        self.set_active(true);
    }

    /// Accumulates a continuous force (cleared every tick after integration).
    pub fn add_force(&mut self, force: Vec3) {
        self.force = self.force + force;
        self.set_active(true);
    }

    /// Accumulates continuous torque (cleared every tick after integration).
    pub fn add_torque(&mut self, torque: FixedNum) {
        self.torque += torque;
        self.set_active(true);
    }

    /// Accumulates a one-frame linear impulse, applied (scaled by inverse
    /// mass) in the next [`RigidBody::integrate_velocity`] and cleared
    /// immediately after — for a single immediate push, as opposed to
    /// [`RigidBody::add_force`]'s per-tick continuous force.
    pub fn add_force_impulse(&mut self, impulse: Vec3) {
        self.force_impulse = self.force_impulse + impulse;
        self.set_active(true);
    }

    /// Accumulates a one-frame angular impulse, consumed the same way as
    /// [`RigidBody::add_force_impulse`].
    pub fn add_torque_impulse(&mut self, impulse: FixedNum) {
        self.torque_impulse += impulse;
        self.set_active(true);
    }

    /// Accumulates a one-frame position-only velocity pulse: included in
    /// the next [`RigidBody::integrate_position`]'s displacement but
    /// never folded into the stored velocity itself, so it leaves no
    /// trace for the solver or sleep bookkeeping to see afterward.
    pub fn add_pulse(&mut self, pulse: Vec3) {
        self.pulse_velocity = self.pulse_velocity + pulse;
        self.set_active(true);
    }

    /// Angular counterpart of [`RigidBody::add_pulse`].
    pub fn add_angular_pulse(&mut self, pulse: FixedNum) {
        self.pulse_angular_velocity += pulse;
        self.set_active(true);
    }

    /// Applies an immediate linear impulse, scaled by inverse mass.
    /// Used by the contact solver's sequential impulse iterations,
    /// which need each iteration's effect visible to the next.
    pub fn apply_linear_impulse(&mut self, impulse: Vec3) {
        if self.is_static() {
            return;
        }
        self.velocity = self.velocity + impulse * self.inv_mass;
        self.set_active(true);
    }

    /// Applies an immediate angular impulse equivalent to `impulse`
    /// applied at world point `point`.
    pub fn apply_angular_impulse_at(&mut self, point: Vec3, impulse: Vec3) {
        if self.is_static() {
            return;
        }
        let radius = point - self.position;
        self.angular_velocity += radius.cross_xz(impulse) * crate::trig::RADIAN_TO_DEGREE * self.inv_inertia;
        self.set_active(true);
    }

    /// Mass the body presents to an impulse applied at `point` along
    /// unit `normal`: `invMass + invInertia * (|r|^2 - (r·n)^2)`.
    pub fn effective_point_mass(&self, point: Vec3, normal: Vec3) -> FixedNum {
        if self.is_static() {
            return FixedNum::ZERO;
        }
        let r = point - self.position;
        let rn = r.dot(normal);
        self.inv_mass + self.inv_inertia * (r.length_sq() - rn * rn)
    }

    /// World velocity of material point `point`, combining linear
    /// velocity with the tangential velocity from rotation.
    pub fn point_velocity(&self, point: Vec3) -> Vec3 {
        let r = point - self.position;
        let tangent = Vec3::new(-r.z, FixedNum::ZERO, r.x);
        self.velocity + tangent * self.angular_velocity * DEGREE_TO_RADIAN
    }

    /// Integrates forces, impulses, and damping into velocity. Kinematic
    /// and static bodies ignore forces entirely (kinematic bodies are
    /// still driven by whatever velocity was set on them directly).
    pub fn integrate_velocity(&mut self, dt: FixedNum, gravity: Vec3, damping: FixedNum) {
        if !self.is_dynamic() {
            return;
        }

        self.velocity = self.velocity * damping;
        self.angular_velocity *= damping;

        self.velocity = self.velocity + (self.force + gravity) * self.inv_mass * dt;
        self.angular_velocity += self.torque * self.inv_inertia * dt;

        self.velocity = self.velocity + self.force_impulse * self.inv_mass;
        self.angular_velocity += self.torque_impulse * self.inv_inertia;

        self.force = Vec3::ZERO;
        self.torque = FixedNum::ZERO;
        self.force_impulse = Vec3::ZERO;
        self.torque_impulse = FixedNum::ZERO;
    }

    /// Integrates velocity (plus any pending one-frame pulse) into
    /// position, then retires the body toward sleep if it has been
    /// near-idle for long enough. Returns the ids of colliders whose
    /// world bounds changed, the same signal [`RigidBody::update_transform`]
    /// gives the world for refitting the BVH.
    pub fn integrate_position(&mut self, dt: FixedNum, sleep_speed: FixedNum, sleep_time: FixedNum) -> Vec<ColliderId> {
        if self.is_dynamic() {
            self.position = self.position + (self.velocity + self.pulse_velocity) * dt;
            self.angle += (self.angular_velocity + self.pulse_angular_velocity) * dt;
            self.transform_dirty = true;

            self.pulse_velocity = Vec3::ZERO;
            self.pulse_angular_velocity = FixedNum::ZERO;

            if self.velocity.length_sq() <= sleep_speed * sleep_speed
                && self.angular_velocity.abs() <= sleep_speed * FixedNum::from_int(10)
            {
                self.idle_time += dt;
                if self.idle_time > sleep_time {
                    self.velocity = Vec3::ZERO;
                    self.angular_velocity = FixedNum::ZERO;
                }
            } else {
                self.idle_time = FixedNum::ZERO;
            }
        }

        if self.transform_dirty {
            self.update_transform()
        } else {
            Vec::new()
        }
    }

    /// True once this body has been idle long enough (and untouched by
    /// a contact this tick) to retire to sleep.
    pub fn can_sleep(&self, current_tick: u64, sleep_time: FixedNum) -> bool {
        if self.is_static() || !self.is_active {
            return true;
        }
        if self.collision_stamp == current_tick {
            return false;
        }
        self.idle_time > sleep_time
    }

    /// Records that this body took part in a contact on `tick`, vetoing
    /// sleep for that tick regardless of how idle it otherwise looks.
    pub fn touch(&mut self, tick: u64) {
        self.collision_stamp = tick;
    }

    /// Whether the body is awake.
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Wakes or sleeps the body directly, resetting idle time on wake.
    pub fn set_active(&mut self, active: bool) {
        if active == self.is_active {
            return;
        }
        self.is_active = active;
        if active {
            self.idle_time = FixedNum::ZERO;
        }
    }

    fn mark_transform_dirty(&mut self) {
        self.transform_dirty = true;
        self.set_active(true);
    }

    /// This body's composed world matrix, recomputing first if dirty.
    pub fn matrix(&mut self) -> Mat2D {
        if self.transform_dirty {
            self.update_transform();
        }
        self.matrix
    }

    /// Recomputes the body matrix and every attached collider's
    /// world-space cache, returning the ids of colliders whose bounds
    /// actually changed (the signal the world uses to refit their BVH leaf).
    pub fn update_transform(&mut self) -> Vec<ColliderId> {
        self.transform_dirty = false;
        self.matrix = Mat2D::from_pose(Vec2::new(self.position.x, self.position.z), self.angle, self.scale);

        let mut changed = Vec::new();
        for collider in &mut self.colliders {
            let before = collider.bounds;
            collider.update_transform(self.matrix);
            if before != collider.bounds {
                changed.push(collider.id());
            }
        }
        changed
    }

    /// This body's colliders.
    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }

    /// This body's colliders, mutably.
    pub fn colliders_mut(&mut self) -> &mut [Collider] {
        &mut self.colliders
    }

    /// Attaches a collider, taking ownership of it.
    pub fn add_collider(&mut self, mut collider: Collider) {
        collider.set_body(self.id);
        self.colliders.push(collider);
    }

    /// Detaches and returns the collider with the given id, if owned
    /// by this body.
    pub fn remove_collider(&mut self, id: ColliderId) -> Option<Collider> {
        let index = self.colliders.iter().position(|c| c.id() == id)?;
        Some(self.colliders.remove(index))
    }
}
