//! Pooled projectile component.

use std::fmt;

use bevy_ecs::prelude::Component;

use crate::components::combatant::Side;

/// Identifier handed out by the [`BulletPool`](crate::resources::bulletpool::BulletPool).
///
/// Ids come from a counter that is never reset, so they are unique for the
/// whole lifetime of a controller, across scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileId(pub u64);

impl fmt::Display for ProjectileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A live projectile. Owned by the bullet pool until retired.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projectile {
    pub id: ProjectileId,
    pub owner: Side,
}
