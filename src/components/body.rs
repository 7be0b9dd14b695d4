//! Links between ECS entities and backend physics bodies.
//!
//! The backend only knows opaque [`BodyHandle`]s. An entity carrying a
//! [`Body`] component owns exactly one handle; the reverse lookup lives in
//! [`BodyMap`](crate::resources::bodymap::BodyMap).

use bevy_ecs::prelude::Component;

use crate::backend::{AppearanceId, BodyHandle};

/// Backend body owned by this entity.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Body(pub BodyHandle);

/// Appearance the body was created with. Effects that alter the look of a
/// body restore this value when they end.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Appearance(pub AppearanceId);
