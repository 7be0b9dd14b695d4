//! Tick systems.
//!
//! This module groups the ECS systems that advance one frame of the active
//! scene, plus [`build_tick_schedule`], which chains them in their fixed
//! order.
//!
//! Submodules overview
//! - [`audio`] – forward audio command messages to the host
//! - [`bodies`] – mirror positions and masks to backend bodies, release bodies
//! - [`collision`] – contact collection and the combat dispatch observer
//! - [`combat`] – pure hit resolver
//! - [`flash`] – drive hit flash effects
//! - [`invulnerability`] – close invulnerability windows
//! - [`movement`] – steer the player ship, integrate projectiles
//! - [`spawn`] – projectile spawner, weapons, boss patterns, spawn sequences
//! - [`time`] – update simulation time and delta
//! - [`ttl`] – lifespan/bounds sweep of projectiles

pub mod audio;
pub mod bodies;
pub mod collision;
pub mod combat;
pub mod flash;
pub mod invulnerability;
pub mod movement;
pub mod spawn;
pub mod time;
pub mod ttl;

use bevy_ecs::prelude::*;

/// The per-frame schedule, in execution order.
///
/// Commands are applied between chained systems, so projectiles spawned by
/// the weapons exist for the sweep of the same tick, and the collision
/// observer runs once contacts have been collected.
pub fn build_tick_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            (
                invulnerability::expire_invulnerability,
                flash::update_flash_effects,
                movement::player_movement,
                spawn::player_fire_system,
                spawn::boss_fire_system,
                spawn::advance_spawn_sequences,
                movement::projectile_movement,
            )
                .chain(),
            (
                bodies::sync_body_positions,
                ttl::sweep_projectiles,
                collision::collect_contacts,
                bodies::sync_body_filters,
                bodies::release_bodies,
                audio::update_bevy_audio_cmds,
                audio::forward_audio_cmds,
            )
                .chain(),
        )
            .chain(),
    );
    schedule
}
