//! Player steering intent.
//!
//! Hosts translate whatever input device they have into a [`PlayerIntent`]
//! each frame; the movement and fire systems read it.

use bevy_ecs::prelude::Resource;
use glam::Vec2;

#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerIntent {
    /// Desired direction on the playfield: `x` is world x, `y` is world z.
    /// Values outside the unit circle are normalized.
    pub direction: Vec2,
    /// Trigger held.
    pub fire: bool,
}

impl PlayerIntent {
    pub fn steering(&self) -> Vec2 {
        if self.direction.length_squared() > 1.0 {
            self.direction.normalize()
        } else {
            self.direction
        }
    }
}
