//! World-space position component.
//!
//! [`MapPosition`] stores the pivot of an entity in scene coordinates. The
//! playfield is the XZ plane seen from above: `z` grows from the player's
//! side towards the boss, `y` is height above the plane.

use bevy_ecs::prelude::Component;
use glam::Vec3;

/// World-space position of an entity.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct MapPosition {
    pub pos: Vec3,
}

impl MapPosition {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            pos: Vec3::new(x, y, z),
        }
    }

    pub fn from_vec(pos: Vec3) -> Self {
        Self { pos }
    }
}
