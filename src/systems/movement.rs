//! Kinematic movement.
//!
//! [`player_movement`] steers the ship from [`PlayerIntent`] with damping and
//! a speed cap, then clamps it to the playfield. [`projectile_movement`]
//! integrates the fixed velocity of projectiles.

use bevy_ecs::prelude::*;
use glam::Vec3;

use crate::components::combatant::{CombatantState, PlayerShip};
use crate::components::mapposition::MapPosition;
use crate::components::projectile::Projectile;
use crate::components::rigidbody::RigidBody;
use crate::resources::gameconfig::CombatConfig;
use crate::resources::input::PlayerIntent;
use crate::resources::worldtime::WorldTime;

pub fn player_movement(
    mut query: Query<(&mut MapPosition, &mut RigidBody, &CombatantState), With<PlayerShip>>,
    intent: Res<PlayerIntent>,
    config: Res<CombatConfig>,
    time: Res<WorldTime>,
) {
    let cfg = &config.player;
    let steer = intent.steering();
    let acceleration = Vec3::new(steer.x, 0.0, steer.y) * cfg.acceleration;

    for (mut position, mut rigidbody, state) in query.iter_mut() {
        if rigidbody.is_frozen() || !state.alive {
            continue;
        }
        rigidbody.accelerate(acceleration, time.delta);
        let mut next = position.pos + rigidbody.velocity * time.delta;

        // Hitting a wall kills the velocity component pushing into it. An
        // inverted pair pins the ship to `max` instead of panicking.
        if next.x < cfg.min_x || next.x > cfg.max_x {
            next.x = next.x.max(cfg.min_x).min(cfg.max_x);
            rigidbody.velocity.x = 0.0;
        }
        if next.z < cfg.min_z || next.z > cfg.max_z {
            next.z = next.z.max(cfg.min_z).min(cfg.max_z);
            rigidbody.velocity.z = 0.0;
        }
        if next != position.pos {
            position.pos = next;
        }
    }
}

pub fn projectile_movement(
    mut query: Query<(&mut MapPosition, &RigidBody), With<Projectile>>,
    time: Res<WorldTime>,
) {
    for (mut position, rigidbody) in query.iter_mut() {
        if rigidbody.is_frozen() {
            continue;
        }
        position.pos += rigidbody.velocity * time.delta;
    }
}
