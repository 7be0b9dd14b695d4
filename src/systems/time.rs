//! Clock step run by the controller before each scheduled tick.
use bevy_ecs::prelude::World;

use crate::resources::worldtime::WorldTime;

/// Advance the [`WorldTime`] resource by the host frame delta.
///
/// Runs outside the schedule because the delta comes from the host, not
/// from any resource. Worlds without a clock are left untouched.
pub fn update_world_time(world: &mut World, dt: f32) {
    if let Some(mut clock) = world.get_resource_mut::<WorldTime>() {
        clock.advance(dt);
    }
}
