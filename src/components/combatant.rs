//! Combatant components: the player ship and the boss.
//!
//! A combatant is an entity that can be hit by projectiles. Its mutable
//! record, [`CombatantState`], is only written by the collision dispatch
//! (via the pure resolver in [`crate::systems::combat`]) and by the
//! invulnerability expiry system. A combatant that dies keeps its entity and
//! record with `alive == false`, so late timers and stale contacts can still
//! look it up and see that it is gone.

use bevy_ecs::prelude::Component;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Which side an actor or projectile fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Side {
    Player,
    Enemy,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Player => "player",
            Side::Enemy => "enemy",
        }
    }
}

/// Marks an entity as a combatant on the given side.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Combatant {
    pub side: Side,
}

/// Marker for the steerable player ship.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct PlayerShip;

/// Mutable per-actor record.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct CombatantState {
    pub hp: f32,
    pub max_hp: f32,
    pub alive: bool,
    pub invulnerable: bool,
    /// World time (seconds) at which the invulnerability window closes.
    pub invulnerable_until: f32,
}

impl CombatantState {
    pub fn new(max_hp: f32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            alive: true,
            invulnerable: false,
            invulnerable_until: 0.0,
        }
    }

    /// True while the invulnerability window is open at `now`.
    pub fn is_invulnerable(&self, now: f32) -> bool {
        self.invulnerable && now < self.invulnerable_until
    }

    /// Open (or extend) the invulnerability window for `duration` seconds.
    pub fn arm_invulnerability(&mut self, now: f32, duration: f32) {
        self.invulnerable = true;
        self.invulnerable_until = now + duration;
    }
}

/// Where a combatant is put back when it respawns.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct SpawnPoint(pub Vec3);
