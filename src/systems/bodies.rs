//! Keep backend bodies in step with their entities.
//!
//! - [`sync_body_positions`] pushes moved positions to the backend.
//! - [`sync_body_filters`] pushes changed collision masks (invulnerability
//!   suppression and restore).
//! - [`release_bodies`] destroys the bodies queued by retirements and
//!   despawns during the tick.

use bevy_ecs::prelude::*;
use log::trace;

use crate::backend::Backend;
use crate::components::body::Body;
use crate::components::collisionfilter::CollisionFilter;
use crate::components::mapposition::MapPosition;
use crate::resources::bodymap::BodyMap;

pub fn sync_body_positions(
    query: Query<(&Body, &MapPosition), Changed<MapPosition>>,
    mut backend: NonSendMut<Backend>,
) {
    for (body, position) in query.iter() {
        backend.move_body(body.0, position.pos);
    }
}

pub fn sync_body_filters(
    query: Query<(&Body, &CollisionFilter), Changed<CollisionFilter>>,
    mut backend: NonSendMut<Backend>,
) {
    for (body, filter) in query.iter() {
        backend.set_body_filter(body.0, *filter);
    }
}

pub fn release_bodies(mut bodies: ResMut<BodyMap>, mut backend: NonSendMut<Backend>) {
    for handle in bodies.drain_pending() {
        trace!("releasing {}", handle);
        backend.destroy_body(handle);
    }
}
