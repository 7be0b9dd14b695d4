//! Invulnerability window expiry.
//!
//! When a combatant's window closes its flag is cleared and its collision
//! masks are restored, but only if it is still alive. A combatant that died
//! during the window keeps its masks zeroed, so a late expiry never makes a
//! dead entity collidable again.

use bevy_ecs::prelude::*;
use log::debug;

use crate::components::collisionfilter::CollisionFilter;
use crate::components::combatant::CombatantState;
use crate::resources::worldtime::WorldTime;

pub fn expire_invulnerability(
    mut query: Query<(Entity, &mut CombatantState, Option<&mut CollisionFilter>)>,
    time: Res<WorldTime>,
) {
    let now = time.elapsed;
    for (entity, mut state, filter) in query.iter_mut() {
        if !state.invulnerable || state.is_invulnerable(now) {
            continue;
        }
        if !state.alive {
            continue;
        }
        state.invulnerable = false;
        if let Some(mut filter) = filter {
            filter.restore();
        }
        debug!("{:?} invulnerability over", entity);
    }
}
