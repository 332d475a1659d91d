//! Persistent contact table and the sequential-impulse solver pipeline.
//!
//! Split from `world/mod.rs` the way the reference engine's own world
//! file separates pose integration from contact resolution; everything
//! here is an `impl World` method operating on the same struct.

use crate::body::{BodyId, BodyKind, RigidBody};
use crate::collide::narrow::CollisionInfo;
use crate::collide::{narrow, ColliderId};
use crate::fixed::FixedNum;
use crate::geom::Vec3;
use crate::world::World;

/// Lifecycle state of a [`ContactPair`] for the current tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ContactState {
    /// First tick this pair was observed.
    Enter,
    /// Observed on this tick and on the previous one.
    Stay,
    /// Was observed previously but not refreshed this tick; removed
    /// from the table immediately after this state is reported.
    Exit,
}

/// A persistent broadphase-confirmed pair, keyed by `(id_a << 32) |
/// id_b` with `id_a ≤ id_b` (see [`contact_key`]). Warm-started across
/// ticks: the accumulated impulses survive as long as the pair does.
#[derive(Clone, Debug)]
pub struct ContactPair {
    /// Lower-id collider of the pair.
    pub collider_a: ColliderId,
    /// Higher-id collider of the pair.
    pub collider_b: ColliderId,
    /// Owning body of `collider_a`.
    pub body_a: BodyId,
    /// Owning body of `collider_b`.
    pub body_b: BodyId,
    /// Most recent narrow-phase result.
    pub info: CollisionInfo,
    /// True if either collider is a trigger or either body is kinematic;
    /// trigger pairs are tracked and reported but never solved.
    pub is_trigger: bool,
    /// This tick's lifecycle state.
    pub state: ContactState,
    /// Tick stamp this pair was last refreshed at.
    pub last_seen_tick: u64,
    /// Warm-started accumulated impulse along the contact normal.
    pub accumulated_normal_impulse: FixedNum,
    /// Warm-started accumulated impulse along the contact tangent.
    pub accumulated_tangent_impulse: FixedNum,
    /// Effective mass along the normal, recomputed every pre-solve.
    pub eff_mass_normal: FixedNum,
    /// Effective mass along the tangent, recomputed every pre-solve.
    pub eff_mass_tangent: FixedNum,
    /// Baumgarte position-bias velocity term, recomputed every pre-solve.
    pub bias: FixedNum,
}

/// A numeric safety rail on the normal accumulator, not a physical
/// limit; nothing in a lockstep engine should ever need an impulse
/// this large, so hitting it indicates a degenerate configuration.
const MAX_NORMAL_IMPULSE: i32 = 1000;

pub(super) fn contact_key(a: ColliderId, b: ColliderId) -> u64 {
    let (lo, hi) = if a.0 <= b.0 { (a, b) } else { (b, a) };
    ((lo.0 as u64) << 32) | hi.0 as u64
}

impl World {
    /// Broadphase: for every collider belonging to an active,
    /// non-static body, queries both trees for overlapping candidates,
    /// filters by [`crate::collide::ColliderFilter`], and hands
    /// confirmed narrow-phase hits to [`World::try_add_or_refresh_contact`].
    pub(super) fn query_contact_pairs(&mut self) {
        let mut active_colliders: Vec<(ColliderId, crate::geom::Aabb)> = Vec::new();
        for slot in &self.bodies {
            let Some(body) = slot else { continue };
            if body.is_static() || !body.is_active() {
                continue;
            }
            for collider in body.colliders() {
                active_colliders.push((collider.id(), collider.bounds));
            }
        }

        let mut candidates: Vec<(ColliderId, ColliderId)> = Vec::new();
        for (collider_id, bounds) in &active_colliders {
            let Some(me) = self.collider(*collider_id) else { continue };
            let mut visit = |other_id: ColliderId| -> bool {
                if other_id == *collider_id {
                    return false;
                }
                if let Some(other) = self.collider(other_id) {
                    if me.can_collide_with(other) {
                        let key = if collider_id.0 <= other_id.0 {
                            (*collider_id, other_id)
                        } else {
                            (other_id, *collider_id)
                        };
                        candidates.push(key);
                    }
                }
                false
            };
            self.dynamic_tree_ref().query_box(*bounds, &mut visit);
            self.static_tree_ref().query_box(*bounds, &mut visit);
        }

        candidates.sort_by_key(|&(a, b)| contact_key(a, b));
        candidates.dedup();

        for (a, b) in candidates {
            self.try_add_or_refresh_contact(a, b);
        }
    }

    fn try_add_or_refresh_contact(&mut self, a: ColliderId, b: ColliderId) {
        let tick_stamp = self.tick_stamp();
        let key = contact_key(a, b);
        if self.contacts.get(&key).map(|pair| pair.last_seen_tick) == Some(tick_stamp) {
            return;
        }

        let (Some(ca), Some(cb)) = (self.collider(a).cloned(), self.collider(b).cloned()) else {
            return;
        };
        let Some(body_a_id) = ca.body() else { return };
        let Some(body_b_id) = cb.body() else { return };

        let vel_a = self.body(body_a_id).map(|b| b.velocity()).unwrap_or(Vec3::ZERO);
        let vel_b = self.body(body_b_id).map(|b| b.velocity()).unwrap_or(Vec3::ZERO);

        let Some(info) = narrow::collision_test(&ca, &cb, vel_a, vel_b) else {
            return;
        };

        let is_trigger = ca.is_trigger
            || cb.is_trigger
            || self.body(body_a_id).map(|b| b.kind() == BodyKind::Kinematic).unwrap_or(false)
            || self.body(body_b_id).map(|b| b.kind() == BodyKind::Kinematic).unwrap_or(false);

        debug_assert_eq!(key, contact_key(info.a, info.b));
        let suppress = self.stop_handle_events();

        match self.contacts.get_mut(&key) {
            Some(pair) => {
                pair.info = info;
                pair.is_trigger = is_trigger;
                pair.last_seen_tick = tick_stamp;
                pair.state = ContactState::Stay;
                if !suppress {
                    log::debug!("contact {}-{} stay", info.a.0, info.b.0);
                }
            }
            None => {
                self.contacts.insert(
                    key,
                    ContactPair {
                        collider_a: info.a,
                        collider_b: info.b,
                        body_a: body_a_id,
                        body_b: body_b_id,
                        info,
                        is_trigger,
                        state: ContactState::Enter,
                        last_seen_tick: tick_stamp,
                        accumulated_normal_impulse: FixedNum::ZERO,
                        accumulated_tangent_impulse: FixedNum::ZERO,
                        eff_mass_normal: FixedNum::ZERO,
                        eff_mass_tangent: FixedNum::ZERO,
                        bias: FixedNum::ZERO,
                    },
                );
                if !suppress {
                    log::debug!("contact {}-{} enter", info.a.0, info.b.0);
                }
            }
        }

        if let Some(body) = self.body_mut(body_a_id) {
            body.touch(tick_stamp);
            body.set_active(true);
        }
        if let Some(body) = self.body_mut(body_b_id) {
            body.touch(tick_stamp);
            body.set_active(true);
        }
    }

    /// Marks every pair not refreshed this tick as [`ContactState::Exit`]
    /// and drops it from the table, following the notification.
    pub(super) fn update_contact_pair_states(&mut self) {
        let tick_stamp = self.tick_stamp();
        let suppress = self.stop_handle_events();
        let mut expired = Vec::new();
        for (key, pair) in self.contacts.iter_mut() {
            if pair.last_seen_tick < tick_stamp {
                pair.state = ContactState::Exit;
                if !suppress {
                    log::debug!("contact {}-{} exit", pair.collider_a.0, pair.collider_b.0);
                }
                expired.push(*key);
            }
        }
        for key in expired {
            self.contacts.remove(&key);
        }
    }

    /// Computes effective masses, the Baumgarte bias term, and applies
    /// the previous tick's warm-started impulses for every non-trigger pair.
    pub(super) fn pre_solve_contacts(&mut self, dt: FixedNum) {
        let bias_factor = self.config.bias_factor;
        let allowed_penetration = self.config.allowed_penetration;
        let keys: Vec<u64> = self.contacts.keys().copied().collect();

        for key in keys {
            if self.contacts[&key].is_trigger {
                continue;
            }

            let (body_a, body_b, normal, point_a, point_b, depth, warm_n, warm_t) = {
                let pair = &self.contacts[&key];
                (
                    pair.body_a,
                    pair.body_b,
                    pair.info.normal,
                    pair.info.point_a,
                    pair.info.point_b,
                    pair.info.depth,
                    pair.accumulated_normal_impulse,
                    pair.accumulated_tangent_impulse,
                )
            };

            let normal3 = Vec3::from_xz(normal, FixedNum::ZERO);
            let tangent3 = Vec3::from_xz(normal.perpendicular(), FixedNum::ZERO);
            let point_a3 = Vec3::from_xz(point_a, self.body(body_a).map(|b| b.position().y).unwrap_or(FixedNum::ZERO));
            let point_b3 = Vec3::from_xz(point_b, self.body(body_b).map(|b| b.position().y).unwrap_or(FixedNum::ZERO));

            let eff_mass_normal = invert_mass_sum(
                self.body(body_a).map(|b| b.effective_point_mass(point_a3, normal3)).unwrap_or(FixedNum::ZERO)
                    + self.body(body_b).map(|b| b.effective_point_mass(point_b3, normal3)).unwrap_or(FixedNum::ZERO),
            );
            let eff_mass_tangent = invert_mass_sum(
                self.body(body_a).map(|b| b.effective_point_mass(point_a3, tangent3)).unwrap_or(FixedNum::ZERO)
                    + self.body(body_b).map(|b| b.effective_point_mass(point_b3, tangent3)).unwrap_or(FixedNum::ZERO),
            );
            let bias = bias_factor * (depth - allowed_penetration).max(FixedNum::ZERO) / dt;

            if let Some((ba, bb)) = self.body_pair_mut(body_a, body_b) {
                let impulse = normal3 * warm_n + tangent3 * warm_t;
                ba.apply_linear_impulse(-impulse);
                ba.apply_angular_impulse_at(point_a3, -impulse);
                bb.apply_linear_impulse(impulse);
                bb.apply_angular_impulse_at(point_b3, impulse);
            }

            if let Some(pair) = self.contacts.get_mut(&key) {
                pair.eff_mass_normal = eff_mass_normal;
                pair.eff_mass_tangent = eff_mass_tangent;
                pair.bias = bias;
            }
        }
    }

    /// One sequential-impulse solver iteration over every non-trigger pair.
    pub(super) fn solve_contacts(&mut self) {
        let keys: Vec<u64> = self.contacts.keys().copied().collect();

        for key in keys {
            if self.contacts[&key].is_trigger {
                continue;
            }

            let (body_a, body_b, collider_a, collider_b, normal, point_a, point_b, bias, eff_mass_normal, eff_mass_tangent) = {
                let pair = &self.contacts[&key];
                (
                    pair.body_a,
                    pair.body_b,
                    pair.collider_a,
                    pair.collider_b,
                    pair.info.normal,
                    pair.info.point_a,
                    pair.info.point_b,
                    pair.bias,
                    pair.eff_mass_normal,
                    pair.eff_mass_tangent,
                )
            };

            let friction = {
                let fa = self.collider(collider_a).map(|c| c.friction).unwrap_or(FixedNum::ZERO);
                let fb = self.collider(collider_b).map(|c| c.friction).unwrap_or(FixedNum::ZERO);
                (fa + fb) / FixedNum::from_int(2)
            };

            let normal3 = Vec3::from_xz(normal, FixedNum::ZERO);
            let tangent3 = Vec3::from_xz(normal.perpendicular(), FixedNum::ZERO);
            let point_a3 = Vec3::from_xz(point_a, self.body(body_a).map(|b| b.position().y).unwrap_or(FixedNum::ZERO));
            let point_b3 = Vec3::from_xz(point_b, self.body(body_b).map(|b| b.position().y).unwrap_or(FixedNum::ZERO));

            let (lambda_n_old, lambda_t_old) = {
                let pair = &self.contacts[&key];
                (pair.accumulated_normal_impulse, pair.accumulated_tangent_impulse)
            };

            let mut lambda_n_new = lambda_n_old;
            let mut lambda_t_new = lambda_t_old;

            {
                let Some((ba, bb)) = self.body_pair_mut(body_a, body_b) else {
                    continue;
                };

                let vn = (ba.point_velocity(point_a3) - bb.point_velocity(point_b3)).dot(normal3);
                let delta_n = (vn + bias) * eff_mass_normal;
                lambda_n_new = (lambda_n_old + delta_n).clamp(FixedNum::ZERO, FixedNum::from_int(MAX_NORMAL_IMPULSE));
                let impulse_n = normal3 * (lambda_n_new - lambda_n_old);
                ba.apply_linear_impulse(-impulse_n);
                ba.apply_angular_impulse_at(point_a3, -impulse_n);
                bb.apply_linear_impulse(impulse_n);
                bb.apply_angular_impulse_at(point_b3, impulse_n);

                let vt = (ba.point_velocity(point_a3) - bb.point_velocity(point_b3)).dot(tangent3);
                let delta_t = vt * eff_mass_tangent;
                let max_friction = friction * lambda_n_new;
                lambda_t_new = (lambda_t_old + delta_t).clamp(-max_friction, max_friction);
                let impulse_t = tangent3 * (lambda_t_new - lambda_t_old);
                ba.apply_linear_impulse(-impulse_t);
                ba.apply_angular_impulse_at(point_a3, -impulse_t);
                bb.apply_linear_impulse(impulse_t);
                bb.apply_angular_impulse_at(point_b3, impulse_t);
            }

            if let Some(pair) = self.contacts.get_mut(&key) {
                pair.accumulated_normal_impulse = lambda_n_new;
                pair.accumulated_tangent_impulse = lambda_t_new;
            }
        }
    }

    /// Returns mutable references to two distinct bodies in one borrow,
    /// via `split_at_mut` on the arena — the direct way to satisfy the
    /// borrow checker when both bodies must be touched by the same
    /// impulse application (a method call returning one `&mut RigidBody`
    /// at a time ties up the whole arena for its entire lifetime).
    pub(super) fn body_pair_mut(&mut self, a: BodyId, b: BodyId) -> Option<(&mut RigidBody, &mut RigidBody)> {
        if a.0 == b.0 {
            return None;
        }
        let (lo, hi) = if a.0 < b.0 { (a, b) } else { (b, a) };
        let (left, right) = self.bodies.split_at_mut(hi.0 as usize);
        let lo_body = left.get_mut(lo.0 as usize)?.as_mut()?;
        let hi_body = right.first_mut()?.as_mut()?;
        if a.0 < b.0 {
            Some((lo_body, hi_body))
        } else {
            Some((hi_body, lo_body))
        }
    }

    pub(super) fn dynamic_tree_ref(&self) -> &crate::bvh::BvhTree {
        &self.dynamic_tree
    }

    pub(super) fn static_tree_ref(&self) -> &crate::bvh::BvhTree {
        &self.static_tree
    }
}

fn invert_mass_sum(sum: FixedNum) -> FixedNum {
    if sum.is_zero() {
        FixedNum::ZERO
    } else {
        FixedNum::ONE / sum
    }
}
