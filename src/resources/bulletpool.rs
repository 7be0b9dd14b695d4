//! Registry of live projectiles.
//!
//! The pool owns the id counter and the set of live projectile ids. It is
//! the single gate for disposal: [`BulletPool::retire`] removes the id first
//! and only tears the entity down if the id was still live, so the expiry
//! sweep and the collision dispatch can both try to retire the same
//! projectile without disposing it twice.

use bevy_ecs::prelude::{Commands, Entity, Resource};
use log::trace;
use rustc_hash::FxHashMap;

use crate::components::projectile::ProjectileId;
use crate::resources::bodymap::BodyMap;

#[derive(Resource, Debug, Default)]
pub struct BulletPool {
    next_id: u64,
    live: FxHashMap<ProjectileId, Entity>,
}

impl BulletPool {
    /// Reserve the next id. Never reused, not even after [`BulletPool::clear`].
    pub fn next_id(&mut self) -> ProjectileId {
        self.next_id += 1;
        ProjectileId(self.next_id)
    }

    pub fn register(&mut self, id: ProjectileId, entity: Entity) {
        self.live.insert(id, entity);
    }

    pub fn contains(&self, id: ProjectileId) -> bool {
        self.live.contains_key(&id)
    }

    pub fn entity(&self, id: ProjectileId) -> Option<Entity> {
        self.live.get(&id).copied()
    }

    /// Remove `id` from the live set. Idempotent: later calls return `None`.
    pub fn remove(&mut self, id: ProjectileId) -> Option<Entity> {
        self.live.remove(&id)
    }

    /// Retire a projectile: unregister it, release its body and despawn it.
    ///
    /// Returns false if `id` was already retired; nothing is touched then.
    pub fn retire(&mut self, id: ProjectileId, bodies: &mut BodyMap, commands: &mut Commands) -> bool {
        match self.remove(id) {
            Some(entity) => {
                bodies.release_entity(entity);
                commands.entity(entity).try_despawn();
                trace!("projectile {} retired", id);
                true
            }
            None => false,
        }
    }

    /// Forget every live projectile. The id counter keeps going.
    pub fn clear(&mut self) {
        self.live.clear();
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
