//! Persistent entity marker component.
//!
//! Entities with the [`Persistent`] component survive scene teardown. The
//! controller's collision observer is the main user; every other entity in
//! the world belongs to the active scene and goes away when it is cleared.

use bevy_ecs::prelude::Component;

/// Tag component used to mark entities that outlive the active scene.
#[derive(Component, Clone, Debug)]
pub struct Persistent;
