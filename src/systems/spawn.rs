//! Projectile spawning: the player's gun, the boss patterns and spawn
//! sequences.
//!
//! All spawns go through [`ProjectileSpawner`], which creates the backend
//! body, registers the id in the [`BulletPool`] and the handle in the
//! [`BodyMap`], and spawns the entity with its expiry policy taken from
//! [`CombatConfig`].

use std::f32::consts::TAU;

use bevy_ecs::prelude::*;
use bevy_ecs::system::SystemParam;
use glam::Vec3;
use log::{trace, warn};
use smallvec::SmallVec;

use crate::backend::{AppearanceId, Backend, BodyDesc, BodyShape};
use crate::components::body::{Appearance, Body};
use crate::components::collisionfilter::CollisionFilter;
use crate::components::combatant::{CombatantState, PlayerShip, Side};
use crate::components::cooldown::{BossPatterns, Cooldown};
use crate::components::mapposition::MapPosition;
use crate::components::projectile::{Projectile, ProjectileId};
use crate::components::rigidbody::RigidBody;
use crate::components::spawnsequence::{SequencePattern, SpawnSequence};
use crate::components::ttl::{Bounds, Ttl};
use crate::events::audio::AudioCmd;
use crate::resources::bodymap::BodyMap;
use crate::resources::bulletpool::BulletPool;
use crate::resources::gameconfig::CombatConfig;
use crate::resources::input::PlayerIntent;
use crate::resources::liveness::SceneToken;
use crate::resources::worldtime::WorldTime;

/// Everything needed to put a projectile into play.
#[derive(SystemParam)]
pub struct ProjectileSpawner<'w, 's> {
    pub commands: Commands<'w, 's>,
    pub pool: ResMut<'w, BulletPool>,
    pub bodies: ResMut<'w, BodyMap>,
    pub backend: NonSendMut<'w, Backend>,
    pub config: Res<'w, CombatConfig>,
    pub time: Res<'w, WorldTime>,
}

impl ProjectileSpawner<'_, '_> {
    /// Spawn one projectile for `owner` at `origin` moving with `velocity`.
    ///
    /// Returns `None` if the backend refused to create the body.
    pub fn spawn(&mut self, owner: Side, origin: Vec3, velocity: Vec3) -> Option<ProjectileId> {
        let cfg = &self.config.projectiles;
        let (filter, appearance) = match owner {
            Side::Player => (CollisionFilter::player_bullet(), AppearanceId::PLAYER_BULLET),
            Side::Enemy => (CollisionFilter::enemy_bullet(), AppearanceId::ENEMY_BULLET),
        };
        let desc = BodyDesc {
            shape: BodyShape::Sphere {
                radius: cfg.size * 0.5,
            },
            position: origin,
            filter,
            appearance,
        };
        let handle = match self.backend.create_body(&desc) {
            Ok(handle) => handle,
            Err(e) => {
                warn!("projectile body refused by backend: {}", e);
                return None;
            }
        };

        let id = self.pool.next_id();
        let entity = self
            .commands
            .spawn((
                Projectile { id, owner },
                MapPosition::from_vec(origin),
                RigidBody::with_velocity(velocity),
                Ttl::new(self.time.elapsed, cfg.lifespan),
                Bounds::z_range(cfg.min_z, cfg.max_z),
                filter,
                Body(handle),
                Appearance(appearance),
            ))
            .id();
        self.pool.register(id, entity);
        self.bodies.insert(handle, entity);
        trace!("projectile {} ({}) spawned at {:?}", id, owner.as_str(), origin);
        Some(id)
    }
}

/// Origins of a line volley of `count` bullets spaced `spacing` apart,
/// centred on `center.x` and dropped by half a bullet on y.
pub fn line_formation(center: Vec3, count: u32, spacing: f32, size: f32) -> SmallVec<[Vec3; 8]> {
    let half_width = count.saturating_sub(1) as f32 * spacing / 2.0;
    let origin = muzzle(center, size);
    (0..count)
        .map(|i| origin + Vec3::X * (-half_width + i as f32 * spacing))
        .collect()
}

/// Where boss bullets leave the hull: half a bullet below its centre.
pub fn muzzle(center: Vec3, size: f32) -> Vec3 {
    center - Vec3::Y * (size * 0.5)
}

/// Direction of step `step` of a spiral burst emitted at time `now`.
pub fn spiral_direction(step: u32, divisions: u32, now: f32) -> Vec3 {
    let angle = TAU * step as f32 / divisions.max(1) as f32 + now;
    Vec3::new(angle.cos(), 0.0, -angle.sin())
}

/// Fire the player's gun while the trigger is held, gated by its cooldown.
pub fn player_fire_system(
    intent: Res<PlayerIntent>,
    mut ships: Query<(&MapPosition, &CombatantState, &mut Cooldown), With<PlayerShip>>,
    mut spawner: ProjectileSpawner,
    mut audio: MessageWriter<AudioCmd>,
) {
    if !intent.fire {
        return;
    }
    let now = spawner.time.elapsed;
    let speed = spawner.config.projectiles.player_speed;
    for (pos, state, mut gun) in ships.iter_mut() {
        if !state.alive || !gun.try_fire(now) {
            continue;
        }
        let origin = pos.pos + Vec3::Y;
        if spawner
            .spawn(Side::Player, origin, Vec3::new(0.0, 0.0, speed))
            .is_some()
        {
            audio.write(AudioCmd::fx("player_shoot"));
        }
    }
}

/// Run the boss patterns: a line volley and a spiral spawn sequence, each on
/// its own cooldown.
pub fn boss_fire_system(
    mut bosses: Query<(Entity, &MapPosition, &CombatantState, &mut BossPatterns)>,
    token: Res<SceneToken>,
    mut spawner: ProjectileSpawner,
    mut audio: MessageWriter<AudioCmd>,
) {
    let now = spawner.time.elapsed;
    let boss_cfg = spawner.config.boss.clone();
    let size = spawner.config.projectiles.size;
    let speed = spawner.config.projectiles.enemy_speed;

    for (entity, pos, state, mut patterns) in bosses.iter_mut() {
        if !state.alive {
            continue;
        }
        if patterns.line.try_fire(now) {
            let velocity = Vec3::new(0.0, 0.0, -speed);
            for origin in line_formation(pos.pos, boss_cfg.line_count, size, size) {
                spawner.spawn(Side::Enemy, origin, velocity);
            }
            audio.write(AudioCmd::fx("enemy_shoot"));
        }
        if patterns.spiral.try_fire(now) {
            spawner.commands.spawn(SpawnSequence::spiral(
                entity,
                now,
                boss_cfg.spiral_steps,
                boss_cfg.spiral_step_delay,
                boss_cfg.spiral_divisions,
                speed,
                token.0.clone(),
            ));
            audio.write(AudioCmd::fx("enemy_shoot"));
        }
    }
}

/// Emit every due step of every spawn sequence.
///
/// Before each step the sequence's token and its emitter are checked; a
/// dead token or a dead/missing emitter ends the sequence on the spot.
/// Several steps can be due in one frame when the frame is longer than the
/// step interval; they are all emitted, in order.
pub fn advance_spawn_sequences(
    mut sequences: Query<(Entity, &mut SpawnSequence)>,
    emitters: Query<(&MapPosition, &CombatantState)>,
    mut spawner: ProjectileSpawner,
) {
    let now = spawner.time.elapsed;
    let size = spawner.config.projectiles.size;
    for (entity, mut seq) in sequences.iter_mut() {
        while seq.due(now) {
            if !seq.token.is_alive() {
                trace!("spawn sequence {:?} cancelled", entity);
                seq.cancel();
                break;
            }
            let origin = match emitters.get(seq.emitter) {
                Ok((pos, state)) if state.alive => muzzle(pos.pos, size),
                _ => {
                    trace!("spawn sequence {:?} lost its emitter", entity);
                    seq.cancel();
                    break;
                }
            };
            match seq.pattern {
                SequencePattern::Spiral { divisions, speed } => {
                    let dir = spiral_direction(seq.step, divisions, now);
                    spawner.spawn(Side::Enemy, origin, dir * speed);
                }
            }
            seq.advance();
        }
        if seq.finished() {
            spawner.commands.entity(entity).try_despawn();
        }
    }
}
