//! The world: owns bodies and colliders, sequences one fixed-dt tick,
//! and exposes the public cast queries.

mod contact;
mod query;

pub use contact::{ContactPair, ContactState};

use crate::body::{BodyId, BodyKind, RigidBody};
use crate::bvh::BvhTree;
use crate::clock::Clock;
use crate::collide::{Collider, ColliderId};
use crate::errors::PhysicsError;
use crate::fixed::FixedNum;
use crate::geom::Vec3;
use std::collections::BTreeMap;

/// Tunable constants for a [`World`], built with `with_*` chain methods.
///
/// `Default` reproduces the reference engine's literal defaults: damping
/// 0.97, sleep speed threshold 0.05, sleep time threshold 0.5, bias
/// factor 0.1, allowed penetration 0.01, rebuild threshold 100, edge
/// coefficient 0.1, solver iterations 5.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldConfig {
    gravity: Vec3,
    damping: FixedNum,
    sleep_speed_threshold: FixedNum,
    sleep_time_threshold: FixedNum,
    bias_factor: FixedNum,
    allowed_penetration: FixedNum,
    rebuild_threshold: u32,
    bvh_edge_coefficient: FixedNum,
    solver_iterations: u32,
    plane_lock_enabled: bool,
    plane_lock_value: FixedNum,
}

impl WorldConfig {
    const DEFAULT_DAMPING_RAW: i32 = 993; // 0.97 * 1024, rounded
    const DEFAULT_SLEEP_SPEED_RAW: i32 = 51; // 0.05 * 1024, rounded
    const DEFAULT_SLEEP_TIME_RAW: i32 = 512; // 0.5 * 1024
    const DEFAULT_BIAS_FACTOR_RAW: i32 = 102; // 0.1 * 1024, rounded
    const DEFAULT_ALLOWED_PENETRATION_RAW: i32 = 10; // 0.01 * 1024, rounded
    const DEFAULT_EDGE_COEF_RAW: i32 = 102; // 0.1 * 1024, rounded

    /// Sets gravity (applied as a world-space force divided by mass, so
    /// it is acceleration, matching the reference convention).
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Sets per-tick velocity damping, applied multiplicatively before
    /// forces are integrated.
    pub fn with_damping(mut self, damping: FixedNum) -> Self {
        self.damping = damping;
        self
    }

    /// Sets the speed (and, scaled by 10, angular speed) below which a
    /// body accrues idle time toward sleep.
    pub fn with_sleep_speed_threshold(mut self, threshold: FixedNum) -> Self {
        self.sleep_speed_threshold = threshold;
        self
    }

    /// Sets how long a body must stay below the speed threshold before
    /// its velocity is forced to zero and it becomes sleep-eligible.
    pub fn with_sleep_time_threshold(mut self, threshold: FixedNum) -> Self {
        self.sleep_time_threshold = threshold;
        self
    }

    /// Sets the Baumgarte stabilization factor applied to penetration
    /// beyond [`WorldConfig::with_allowed_penetration`].
    pub fn with_bias_factor(mut self, factor: FixedNum) -> Self {
        self.bias_factor = factor;
        self
    }

    /// Sets the penetration slop the bias term ignores.
    pub fn with_allowed_penetration(mut self, allowed: FixedNum) -> Self {
        self.allowed_penetration = allowed;
        self
    }

    /// Sets how many structural BVH edits accumulate before a full rebuild.
    pub fn with_rebuild_threshold(mut self, threshold: u32) -> Self {
        self.rebuild_threshold = threshold;
        self
    }

    /// Sets the BVH leaf's loose-box expansion coefficient.
    pub fn with_bvh_edge_coefficient(mut self, coefficient: FixedNum) -> Self {
        self.bvh_edge_coefficient = coefficient;
        self
    }

    /// Sets the number of sequential-impulse solver iterations per tick.
    pub fn with_solver_iterations(mut self, iterations: u32) -> Self {
        self.solver_iterations = iterations;
        self
    }

    /// Enables or disables clamping every dynamic body's Y position to
    /// a fixed plane value after each tick.
    pub fn with_plane_lock(mut self, enabled: bool, value: FixedNum) -> Self {
        self.plane_lock_enabled = enabled;
        self.plane_lock_value = value;
        self
    }

    /// Gravity acceleration applied every tick.
    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    /// Per-tick velocity damping.
    pub fn damping(&self) -> FixedNum {
        self.damping
    }

    /// Sleep speed threshold; see [`WorldConfig::with_sleep_speed_threshold`].
    pub fn sleep_speed_threshold(&self) -> FixedNum {
        self.sleep_speed_threshold
    }

    /// Sleep time threshold; see [`WorldConfig::with_sleep_time_threshold`].
    pub fn sleep_time_threshold(&self) -> FixedNum {
        self.sleep_time_threshold
    }

    /// Baumgarte bias factor.
    pub fn bias_factor(&self) -> FixedNum {
        self.bias_factor
    }

    /// Penetration slop the bias term ignores.
    pub fn allowed_penetration(&self) -> FixedNum {
        self.allowed_penetration
    }

    /// Structural-edit rebuild threshold.
    pub fn rebuild_threshold(&self) -> u32 {
        self.rebuild_threshold
    }

    /// BVH leaf loose-box expansion coefficient.
    pub fn bvh_edge_coefficient(&self) -> FixedNum {
        self.bvh_edge_coefficient
    }

    /// Sequential-impulse solver iteration count.
    pub fn solver_iterations(&self) -> u32 {
        self.solver_iterations
    }

    /// Whether Y-plane locking is enabled, and its value.
    pub fn plane_lock(&self) -> (bool, FixedNum) {
        (self.plane_lock_enabled, self.plane_lock_value)
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            gravity: Vec3::ZERO,
            damping: FixedNum::from_raw(Self::DEFAULT_DAMPING_RAW),
            sleep_speed_threshold: FixedNum::from_raw(Self::DEFAULT_SLEEP_SPEED_RAW),
            sleep_time_threshold: FixedNum::from_raw(Self::DEFAULT_SLEEP_TIME_RAW),
            bias_factor: FixedNum::from_raw(Self::DEFAULT_BIAS_FACTOR_RAW),
            allowed_penetration: FixedNum::from_raw(Self::DEFAULT_ALLOWED_PENETRATION_RAW),
            rebuild_threshold: 100,
            bvh_edge_coefficient: FixedNum::from_raw(Self::DEFAULT_EDGE_COEF_RAW),
            solver_iterations: 5,
            plane_lock_enabled: false,
            plane_lock_value: FixedNum::ZERO,
        }
    }
}

/// A slot in the body arena: `Some` while live, `None` once removed
/// (removal leaves a tombstone so [`BodyId`]s stay stable for the
/// lifetime of every other body).
type BodySlot = Option<RigidBody>;

/// Owns every body and collider, the two broadphase trees (dynamic and
/// static), and the persistent contact table; sequences one fixed-dt
/// step in [`World::tick`].
pub struct World {
    config: WorldConfig,

    bodies: Vec<BodySlot>,
    next_body_id: u32,

    next_collider_id: u32,

    static_body: BodyId,

    dynamic_tree: BvhTree,
    static_tree: BvhTree,

    contacts: BTreeMap<u64, ContactPair>,
    tick_stamp: u64,

    stop_handle_events: bool,
    last_error: Option<PhysicsError>,
}

impl World {
    /// Builds an empty world with the given configuration, with a
    /// single implicit static body already present (colliders attached
    /// to it behave as immovable world geometry); see
    /// [`World::static_body_id`].
    pub fn new(config: WorldConfig) -> Self {
        let edge_coef = config.bvh_edge_coefficient;
        let mut world = World {
            config,
            bodies: Vec::new(),
            next_body_id: 1,
            next_collider_id: 1,
            static_body: BodyId(0),
            dynamic_tree: BvhTree::new(edge_coef),
            static_tree: BvhTree::new(edge_coef),
            contacts: BTreeMap::new(),
            tick_stamp: 0,
            stop_handle_events: false,
            last_error: None,
        };
        let static_id = world.alloc_body_id();
        world.ensure_body_slot(static_id);
        world.bodies[static_id.0 as usize] = Some(RigidBody::new_static(static_id));
        world.static_body = static_id;
        world
    }

    fn ensure_body_slot(&mut self, id: BodyId) {
        if self.bodies.len() as u64 <= id.0 as u64 {
            self.bodies.resize_with(id.0 as usize + 1, || None);
        }
    }

    /// Drops every body, collider, and contact, returning the world to
    /// its just-constructed state (the implicit static body is recreated).
    pub fn clear(&mut self) {
        *self = World::new(self.config.clone());
    }

    fn alloc_body_id(&mut self) -> BodyId {
        let id = self.next_body_id;
        match self.next_body_id.checked_add(1) {
            Some(next) => self.next_body_id = next,
            None => {
                self.next_body_id = 1;
                self.report_error(PhysicsError::IdOverflow);
            }
        }
        BodyId(id)
    }

    fn alloc_collider_id(&mut self) -> ColliderId {
        let id = self.next_collider_id;
        match self.next_collider_id.checked_add(1) {
            Some(next) => self.next_collider_id = next,
            None => {
                self.next_collider_id = 1;
                self.report_error(PhysicsError::IdOverflow);
            }
        }
        ColliderId(id)
    }

    fn report_error(&mut self, error: PhysicsError) {
        match &error {
            PhysicsError::InvalidOperation(msg) => log::error!("invalid operation: {msg}"),
            PhysicsError::IdOverflow => log::error!("id counter overflowed and was reset"),
            PhysicsError::PreconditionViolated(msg) => log::warn!("precondition violated: {msg}"),
            PhysicsError::NumericSaturation(msg) => log::trace!("numeric saturation: {msg}"),
        }
        self.last_error = Some(error);
    }

    /// The most recent internal failure, if any, overwritten (not
    /// accumulated) on each new one.
    pub fn last_error(&self) -> Option<&PhysicsError> {
        self.last_error.as_ref()
    }

    /// Suppresses contact-notification side effects for the remainder
    /// of this and future ticks without otherwise changing behavior.
    pub fn set_stop_handle_events(&mut self, stop: bool) {
        self.stop_handle_events = stop;
    }

    /// Current event-notification suppression state.
    pub fn stop_handle_events(&self) -> bool {
        self.stop_handle_events
    }

    /// This world's configuration.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// The id of the implicit static body every world starts with.
    /// Colliders attached here behave as immovable world geometry and
    /// never need a body of their own.
    pub fn static_body_id(&self) -> BodyId {
        self.static_body
    }

    /// Current tick counter, incremented once per [`World::tick`] call.
    pub fn tick_stamp(&self) -> u64 {
        self.tick_stamp
    }

    /// Adds a body to the arena, assigning it a fresh [`BodyId`] and
    /// indexing its colliders into the appropriate tree.
    fn add_body(&mut self, mut body: RigidBody, kind: BodyKind) -> BodyId {
        let id = self.alloc_body_id();
        body = rebind_body_id(body, id);
        let tree = if kind == BodyKind::Static {
            &mut self.static_tree
        } else {
            &mut self.dynamic_tree
        };
        for collider in body.colliders() {
            tree.add_collider(collider.id(), collider.bounds);
        }
        self.ensure_body_slot(id);
        self.bodies[id.0 as usize] = Some(body);
        id
    }

    /// Adds a dynamic body (moved by forces, impulses, and collisions).
    pub fn add_dynamic_body(&mut self, mass: FixedNum, inertia: FixedNum) -> BodyId {
        let body = RigidBody::new_dynamic(BodyId(0), mass, inertia);
        self.add_body(body, BodyKind::Dynamic)
    }

    /// Adds a kinematic body (moved only by its own velocity).
    pub fn add_kinematic_body(&mut self) -> BodyId {
        let body = RigidBody::new_kinematic(BodyId(0));
        self.add_body(body, BodyKind::Kinematic)
    }

    /// Adds a static body (never integrated).
    pub fn add_static_body(&mut self) -> BodyId {
        let body = RigidBody::new_static(BodyId(0));
        self.add_body(body, BodyKind::Static)
    }

    /// Removes a body and every collider it owns from the world,
    /// dropping its tree entries and any contacts referencing it.
    pub fn remove_body(&mut self, id: BodyId) -> bool {
        let Some(slot) = self.bodies.get_mut(id.0 as usize) else {
            return false;
        };
        let Some(body) = slot.take() else {
            return false;
        };

        let tree = if body.is_static() {
            &mut self.static_tree
        } else {
            &mut self.dynamic_tree
        };
        for collider in body.colliders() {
            tree.remove_collider(collider.id());
        }
        self.contacts.retain(|_, pair| pair.body_a != id && pair.body_b != id);
        true
    }

    /// Immutable access to a body by id.
    pub fn body(&self, id: BodyId) -> Option<&RigidBody> {
        self.bodies.get(id.0 as usize).and_then(|slot| slot.as_ref())
    }

    /// Mutable access to a body by id.
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        self.bodies.get_mut(id.0 as usize).and_then(|slot| slot.as_mut())
    }

    /// Iterates every live body, in arena order. Used by debug-draw
    /// glue and other callers that want to walk the whole world rather
    /// than resolve individual ids.
    pub fn bodies_iter(&self) -> impl Iterator<Item = &RigidBody> {
        self.bodies.iter().filter_map(|slot| slot.as_ref())
    }

    /// Attaches a new collider to `body`, assigning it a fresh
    /// [`ColliderId`] and indexing it into the appropriate tree. Fails
    /// (logging [`PhysicsError::InvalidOperation`] and leaving the world
    /// unchanged) if `body` does not exist.
    pub fn add_collider(&mut self, body_id: BodyId, shape: crate::collide::ColliderShape) -> Option<ColliderId> {
        let is_static = match self.body(body_id) {
            Some(body) => body.is_static(),
            None => {
                self.report_error(PhysicsError::InvalidOperation(format!(
                    "add_collider: body {} does not exist",
                    body_id.0
                )));
                return None;
            }
        };

        let id = self.alloc_collider_id();
        let bounds = {
            let body = self.body_mut(body_id).expect("existence checked above");
            let mut collider = Collider::new(id, shape);
            let matrix = body.matrix();
            collider.update_transform(matrix);
            let bounds = collider.bounds;
            body.add_collider(collider);
            bounds
        };

        let tree = if is_static { &mut self.static_tree } else { &mut self.dynamic_tree };
        tree.add_collider(id, bounds);
        Some(id)
    }

    /// Detaches and drops a collider from whichever body owns it.
    pub fn remove_collider(&mut self, body_id: BodyId, collider_id: ColliderId) -> bool {
        let is_static = {
            let Some(body) = self.body_mut(body_id) else {
                return false;
            };
            let is_static = body.is_static();
            if body.remove_collider(collider_id).is_none() {
                return false;
            }
            is_static
        };
        let tree = if is_static { &mut self.static_tree } else { &mut self.dynamic_tree };
        tree.remove_collider(collider_id);
        self.contacts.retain(|_, pair| pair.collider_a != collider_id && pair.collider_b != collider_id);
        true
    }

    /// Resolves a collider id back to a read-only reference, searching
    /// every live body. `O(bodies)`; queries that already know the
    /// owning body should prefer [`RigidBody::colliders`] directly.
    pub fn collider(&self, id: ColliderId) -> Option<&Collider> {
        self.bodies
            .iter()
            .filter_map(|slot| slot.as_ref())
            .find_map(|body| body.colliders().iter().find(|c| c.id() == id))
    }

    /// Every contact pair currently in the table, for callers that
    /// want to react to [`ContactState::Enter`]/[`ContactState::Exit`]
    /// transitions after each [`World::tick`].
    pub fn contacts(&self) -> impl Iterator<Item = &ContactPair> {
        self.contacts.values()
    }

    /// Looks up a specific contact pair by its two colliders, in either order.
    pub fn contact(&self, a: ColliderId, b: ColliderId) -> Option<&ContactPair> {
        self.contacts.get(&contact::contact_key(a, b))
    }

    /// Approximate memory footprint, in bytes, of the arenas and trees
    /// this world owns — a diagnostic, not an exact accounting.
    pub fn memory_usage(&self) -> usize {
        let bodies_bytes = self.bodies.len() * std::mem::size_of::<BodySlot>();
        let colliders_bytes: usize = self
            .bodies
            .iter()
            .filter_map(|slot| slot.as_ref())
            .map(|b| b.colliders().len() * std::mem::size_of::<Collider>())
            .sum();
        let contacts_bytes = self.contacts.len() * std::mem::size_of::<ContactPair>();
        let tree_nodes = self.dynamic_tree.node_count() + self.static_tree.node_count();
        let tree_bytes = tree_nodes * std::mem::size_of::<usize>() * 4;
        bodies_bytes + colliders_bytes + contacts_bytes + tree_bytes
    }

    /// Runs one fixed-dt physics step: integrate velocity, refit/rebuild
    /// the broadphase trees, find and update contact pairs, pre-solve,
    /// iterate the sequential-impulse solver, integrate position, then
    /// retire idle bodies to sleep.
    pub fn tick(&mut self, dt: FixedNum, clock: &dyn Clock) {
        let tick_start = clock.now_millis();
        self.tick_stamp += 1;

        self.integrate_velocities(dt);

        if self.static_tree.changed_count() > self.config.rebuild_threshold {
            self.static_tree.rebuild();
        }
        if self.dynamic_tree.changed_count() > self.config.rebuild_threshold {
            self.dynamic_tree.rebuild();
        }

        self.query_contact_pairs();
        self.update_contact_pair_states();
        self.pre_solve_contacts(dt);
        for _ in 0..self.config.solver_iterations {
            self.solve_contacts();
        }

        self.integrate_positions(dt);
        self.apply_plane_lock();
        self.retire_sleeping_bodies();

        let elapsed = clock.now_millis().saturating_sub(tick_start);
        log::trace!(
            "tick {} done in {}ms: {} bodies, {} contacts, {}/{} bvh nodes",
            self.tick_stamp,
            elapsed,
            self.bodies.iter().filter(|b| b.is_some()).count(),
            self.contacts.len(),
            self.dynamic_tree.node_count(),
            self.static_tree.node_count(),
        );
    }

    fn integrate_velocities(&mut self, dt: FixedNum) {
        let gravity = self.config.gravity;
        let damping = self.config.damping;
        let mut changed: Vec<(BodyKind, ColliderId)> = Vec::new();
        for slot in &mut self.bodies {
            if let Some(body) = slot {
                if body.is_active() {
                    body.integrate_velocity(dt, gravity, damping);
                    if body.is_transform_dirty() {
                        let kind = body.kind();
                        changed.extend(body.update_transform().into_iter().map(|id| (kind, id)));
                    }
                }
            }
        }

        for (kind, collider_id) in changed {
            if let Some(bounds) = self.collider(collider_id).map(|c| c.bounds) {
                if kind == BodyKind::Static {
                    self.static_tree.update_collider(collider_id, bounds);
                } else {
                    self.dynamic_tree.update_collider(collider_id, bounds);
                }
            }
        }
    }

    fn integrate_positions(&mut self, dt: FixedNum) {
        let sleep_speed = self.config.sleep_speed_threshold;
        let sleep_time = self.config.sleep_time_threshold;

        let mut changed: Vec<ColliderId> = Vec::new();
        for slot in &mut self.bodies {
            if let Some(body) = slot {
                if body.is_active() {
                    changed.extend(body.integrate_position(dt, sleep_speed, sleep_time));
                }
            }
        }

        for collider_id in changed {
            if let Some(bounds) = self.collider(collider_id).map(|c| c.bounds) {
                self.dynamic_tree.update_collider(collider_id, bounds);
            }
        }
    }

    fn apply_plane_lock(&mut self) {
        if !self.config.plane_lock_enabled {
            return;
        }
        let plane_y = self.config.plane_lock_value;
        for slot in &mut self.bodies {
            if let Some(body) = slot {
                if body.is_dynamic() {
                    let mut position = body.position();
                    if position.y != plane_y {
                        position.y = plane_y;
                        body.set_position(position);
                    }
                }
            }
        }
    }

    fn retire_sleeping_bodies(&mut self) {
        let tick_stamp = self.tick_stamp;
        let sleep_time = self.config.sleep_time_threshold;
        for slot in &mut self.bodies {
            if let Some(body) = slot {
                if body.is_dynamic() && body.is_active() && body.can_sleep(tick_stamp, sleep_time) {
                    body.set_active(false);
                }
            }
        }
    }
}

/// Rebuilds a [`RigidBody`] with its real id once the world has
/// assigned one; bodies are constructed with a placeholder id before
/// they're handed to [`World::add_body`].
fn rebind_body_id(mut body: RigidBody, id: BodyId) -> RigidBody {
    body.rebind_id(id);
    body
}
