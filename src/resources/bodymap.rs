//! Lookup table between backend body handles and entities.
//!
//! The backend's contact feed speaks in [`BodyHandle`]s; this table turns
//! them back into entities. Releasing an entity's body removes both
//! directions of the mapping at once and queues the handle for
//! destruction, which [`crate::systems::bodies::release_bodies`] performs at
//! the end of the tick. Contacts that arrive for a released handle no
//! longer resolve and are dropped.

use bevy_ecs::prelude::{Entity, Resource};
use rustc_hash::FxHashMap;

use crate::backend::BodyHandle;

#[derive(Resource, Debug, Default)]
pub struct BodyMap {
    by_handle: FxHashMap<BodyHandle, Entity>,
    by_entity: FxHashMap<Entity, BodyHandle>,
    pending_release: Vec<BodyHandle>,
}

impl BodyMap {
    pub fn insert(&mut self, handle: BodyHandle, entity: Entity) {
        self.by_handle.insert(handle, entity);
        self.by_entity.insert(entity, handle);
    }

    pub fn entity(&self, handle: BodyHandle) -> Option<Entity> {
        self.by_handle.get(&handle).copied()
    }

    /// Unmap `entity` and queue its body for destruction.
    ///
    /// Returns false if the entity had no body (already released).
    pub fn release_entity(&mut self, entity: Entity) -> bool {
        match self.by_entity.remove(&entity) {
            Some(handle) => {
                self.by_handle.remove(&handle);
                self.pending_release.push(handle);
                true
            }
            None => false,
        }
    }

    /// Handles waiting for destruction.
    pub fn drain_pending(&mut self) -> Vec<BodyHandle> {
        std::mem::take(&mut self.pending_release)
    }

    /// Forget every mapping, returning all handles (live and pending) for
    /// destruction.
    pub fn take_all(&mut self) -> Vec<BodyHandle> {
        let mut handles: Vec<BodyHandle> = self.by_handle.drain().map(|(h, _)| h).collect();
        self.by_entity.clear();
        handles.append(&mut self.pending_release);
        handles
    }

    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }
}
