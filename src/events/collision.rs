//! Collision event type.
//!
//! [`collect_contacts`](crate::systems::collision::collect_contacts) turns
//! backend contact pairs into [`CollisionEvent`]s once both bodies map to
//! live entities whose masks accept each other.
//! [`collision_observer`](crate::systems::collision::collision_observer)
//! reacts to them.
use bevy_ecs::prelude::*;

/// Event fired when two filter-compatible entities start touching.
///
/// The two fields are the entity IDs of the participants. No ordering
/// guarantees are provided.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionEvent {
    pub a: Entity,
    pub b: Entity,
}
