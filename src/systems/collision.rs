//! Contact collection and combat dispatch.
//!
//! [`collect_contacts`] drains the backend's contact-start feed, maps body
//! handles back to entities and triggers a [`CollisionEvent`] for every pair
//! whose masks accept each other. Contacts naming a body that was already
//! released (a projectile swept or hit earlier in the tick) no longer map
//! to an entity and are dropped without fuss.
//!
//! [`collision_observer`] is the dispatch shim around the pure resolver: it
//! reads the target's state, calls [`resolve_hit`], writes the next state
//! back and carries out the returned effects. All store fields touched by
//! one hit go out in a single combined write.

use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use bevy_ecs::system::SystemParam;
use log::{debug, info, trace};

use crate::backend::Backend;
use crate::components::body::{Appearance, Body};
use crate::components::collisionfilter::CollisionFilter;
use crate::components::combatant::{Combatant, CombatantState, Side, SpawnPoint};
use crate::components::flash::Flash;
use crate::components::mapposition::MapPosition;
use crate::components::projectile::Projectile;
use crate::components::rigidbody::RigidBody;
use crate::events::audio::AudioCmd;
use crate::events::collision::CollisionEvent;
use crate::resources::bodymap::BodyMap;
use crate::resources::bulletpool::BulletPool;
use crate::resources::gameconfig::CombatConfig;
use crate::resources::scoreboard::{Scoreboard, unix_millis};
use crate::resources::statestore::{SharedState, StatePatch};
use crate::resources::worldtime::WorldTime;
use crate::systems::combat::{CombatEffect, Hit, resolve_hit};

/// Turn backend contacts into [`CollisionEvent`]s.
pub fn collect_contacts(
    mut backend: NonSendMut<Backend>,
    bodies: Res<BodyMap>,
    filters: Query<&CollisionFilter>,
    mut commands: Commands,
) {
    for contact in backend.drain_contacts() {
        let (Some(a), Some(b)) = (bodies.entity(contact.a), bodies.entity(contact.b)) else {
            trace!("stale contact {} / {} dropped", contact.a, contact.b);
            continue;
        };
        match (filters.get(a), filters.get(b)) {
            (Ok(fa), Ok(fb)) if fa.allows_declared(fb) => {
                commands.trigger(CollisionEvent { a, b });
            }
            _ => trace!("contact {:?} / {:?} rejected by filters", a, b),
        }
    }
}

type CombatantItem = (
    &'static Combatant,
    &'static mut CombatantState,
    Option<&'static mut CollisionFilter>,
    Option<&'static SpawnPoint>,
    Option<&'static mut MapPosition>,
    Option<&'static mut RigidBody>,
    Option<&'static mut Flash>,
    Option<&'static Appearance>,
);

/// World access needed to apply a combat resolution.
#[derive(SystemParam)]
pub struct CombatDispatch<'w, 's> {
    commands: Commands<'w, 's>,
    projectiles: Query<'w, 's, &'static Projectile>,
    combatants: Query<'w, 's, CombatantItem>,
    pool: ResMut<'w, BulletPool>,
    bodies: ResMut<'w, BodyMap>,
    board: ResMut<'w, Scoreboard>,
    shared: ResMut<'w, SharedState>,
    config: Res<'w, CombatConfig>,
    time: Res<'w, WorldTime>,
    audio: MessageWriter<'w, AudioCmd>,
}

/// Observer applying projectile-vs-combatant hits.
///
/// Pairs that are not exactly one live projectile and one combatant are
/// ignored, as are projectiles no longer in the pool.
pub fn collision_observer(trigger: On<CollisionEvent>, mut ctx: CombatDispatch) {
    let CollisionEvent { a, b } = *trigger.event();
    let (shot, target) = if ctx.projectiles.contains(a) && ctx.combatants.contains(b) {
        (a, b)
    } else if ctx.projectiles.contains(b) && ctx.combatants.contains(a) {
        (b, a)
    } else {
        trace!("non-combat contact {:?} / {:?}", a, b);
        return;
    };

    let Ok(projectile) = ctx.projectiles.get(shot).copied() else {
        return;
    };
    if !ctx.pool.contains(projectile.id) {
        trace!("projectile {} already retired", projectile.id);
        return;
    }

    let now = ctx.time.elapsed;
    let rules = ctx.config.rules();
    let flash_duration = ctx.config.effects.flash_duration;
    let flash_toggle = ctx.config.effects.flash_toggle;

    let Ok((combatant, mut state, mut filter, spawn, mut position, mut rigidbody, mut flash, appearance)) =
        ctx.combatants.get_mut(target)
    else {
        return;
    };
    if projectile.owner == combatant.side {
        trace!("friendly fire ignored for projectile {}", projectile.id);
        return;
    }

    let side = combatant.side;
    let before_board = *ctx.board;
    let resolution = resolve_hit(&Hit { target: side, now }, &state, &before_board, &rules);
    let changed = resolution.changed(&state, &before_board) || resolution.board.lives != before_board.lives;
    *state = resolution.target;
    *ctx.board = resolution.board;

    let mut patch = StatePatch::new();
    for effect in resolution.effects.iter().copied() {
        match effect {
            CombatEffect::DisposeProjectile => {
                ctx.pool
                    .retire(projectile.id, &mut ctx.bodies, &mut ctx.commands);
            }
            CombatEffect::SuppressMasks => {
                if let Some(filter) = filter.as_mut() {
                    filter.suppress();
                }
            }
            CombatEffect::Flash => {
                if let (Some(flash), Some(appearance)) = (flash.as_mut(), appearance) {
                    flash.start(now, flash_duration, flash_toggle, appearance.0);
                }
            }
            CombatEffect::Sound(id) => {
                ctx.audio.write(AudioCmd::fx(id));
            }
            CombatEffect::Respawn => {
                if let (Some(position), Some(spawn)) = (position.as_mut(), spawn) {
                    position.pos = spawn.0;
                }
                if let Some(rigidbody) = rigidbody.as_mut() {
                    rigidbody.halt();
                }
                info!("{:?} respawned, {} lives left", target, ctx.board.lives);
            }
            CombatEffect::Despawn => {
                ctx.bodies.release_entity(target);
                ctx.commands.entity(target).remove::<Body>();
                if let Some(rigidbody) = rigidbody.as_mut() {
                    rigidbody.freeze();
                }
                info!("{} despawned", side.as_str());
            }
            CombatEffect::Terminal(outcome) => {
                info!("session over: {:?}, score {}", outcome, ctx.board.score);
                patch = patch.game_state(outcome.game_state());
                patch = ctx.shared.record_score(patch, unix_millis(), ctx.board.score);
            }
        }
    }

    if changed {
        patch = match side {
            Side::Player => patch.player_hp(state.hp).lives(ctx.board.lives),
            Side::Enemy => patch.boss_hp(state.hp),
        };
        patch = patch.score(ctx.board.score);
        debug!(
            "{} hit by projectile {}: hp {} score {}",
            side.as_str(),
            projectile.id,
            state.hp,
            ctx.board.score
        );
    }
    ctx.shared.apply(patch);
}
