//! Projectile expiry sweep.
//!
//! [`sweep_projectiles`] retires every projectile that outlived its
//! [`Ttl`](crate::components::ttl::Ttl) or left its
//! [`Bounds`](crate::components::ttl::Bounds).
//!
//! The sweep first collects the full list of expired ids, then retires
//! them, so no decision is taken on a half-swept pool. Retirement goes
//! through [`BulletPool::retire`], which makes a projectile that collided
//! earlier in the tick a no-op here.

use bevy_ecs::prelude::*;
use log::trace;

use crate::components::mapposition::MapPosition;
use crate::components::projectile::{Projectile, ProjectileId};
use crate::components::ttl::{Bounds, Ttl};
use crate::resources::bodymap::BodyMap;
use crate::resources::bulletpool::BulletPool;
use crate::resources::worldtime::WorldTime;

pub fn sweep_projectiles(
    world_time: Res<WorldTime>,
    query: Query<(&Projectile, &MapPosition, &Ttl, Option<&Bounds>)>,
    mut pool: ResMut<BulletPool>,
    mut bodies: ResMut<BodyMap>,
    mut commands: Commands,
) {
    let now = world_time.elapsed;
    let expired: Vec<ProjectileId> = query
        .iter()
        .filter(|(_, pos, ttl, bounds)| {
            ttl.expired(now) || bounds.is_some_and(|b| !b.contains(pos.pos))
        })
        .map(|(projectile, ..)| projectile.id)
        .collect();

    for id in expired {
        if pool.retire(id, &mut bodies, &mut commands) {
            trace!("projectile {} expired", id);
        }
    }
}
