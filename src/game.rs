//! Built-in scenes.
//!
//! - `shmup` – the combat scene: a steerable player ship against a boss
//!   firing line volleys and spiral bursts.
//! - `showcase` – a physics demo dropping a pile of spheres on the ground.
//!
//! [`default_registry`] registers both.

use glam::Vec3;
use log::{debug, info};

use crate::backend::{AppearanceId, SceneDescriptor, SceneHandle};
use crate::components::collisionfilter::{CollisionFilter, CollisionGroups};
use crate::components::combatant::{Combatant, CombatantState, PlayerShip, Side, SpawnPoint};
use crate::components::cooldown::{BossPatterns, Cooldown};
use crate::components::flash::Flash;
use crate::components::mapposition::MapPosition;
use crate::components::rigidbody::RigidBody;
use crate::events::audio::AudioCmd;
use crate::resources::audio::AudioBridge;
use crate::resources::gameconfig::CombatConfig;
use crate::resources::gamestate::GameStates;
use crate::resources::scoreboard::{Outcome, Scoreboard};
use crate::resources::statestore::{SharedState, StatePatch, keys};
use crate::resources::worldtime::WorldTime;
use crate::scene::{
    SceneBuildError, SceneContext, SceneOptions, SceneRegistry, ShmupOptions, ShowcaseOptions,
};

const PLAYER_RADIUS: f32 = 1.5;
const BOSS_RADIUS: f32 = 6.0;
const SPHERE_RADIUS: f32 = 0.5;
const BG_MUSIC: &str = "bg_music";

/// Registry with every built-in scene.
pub fn default_registry() -> SceneRegistry {
    let mut registry = SceneRegistry::new();
    registry.register("shmup", shmup).register("showcase", showcase);
    registry
}

/// Build the combat scene.
pub fn shmup(ctx: &mut SceneContext<'_>, options: &SceneOptions) -> Result<SceneHandle, SceneBuildError> {
    let opts = match options {
        SceneOptions::Shmup(opts) => opts.clone(),
        SceneOptions::Default => ShmupOptions::default(),
        _ => {
            return Err(SceneBuildError::OptionsMismatch {
                key: ctx.key.to_string(),
                expected: "shmup",
            });
        }
    };

    let config = ctx.world.resource::<CombatConfig>().clone();
    let now = ctx.world.resource::<WorldTime>().elapsed;
    let lives = opts.lives.unwrap_or(config.player.lives);
    let player_hp = opts.player_hp.unwrap_or(config.player.hp);
    let boss_hp = opts.boss_hp.unwrap_or(config.boss.hp);
    if lives == 0 || player_hp <= 0.0 || boss_hp <= 0.0 {
        return Err(SceneBuildError::Invalid {
            key: ctx.key.to_string(),
            reason: format!("lives={lives} player_hp={player_hp} boss_hp={boss_hp}"),
        });
    }

    let handle = ctx.build_scene_graph(&SceneDescriptor::new(ctx.key))?;
    ctx.world.insert_resource(Scoreboard::new(lives));

    // Player ship
    let spawn = config.player.spawn;
    let player = ctx
        .world
        .spawn((
            PlayerShip,
            Combatant { side: Side::Player },
            CombatantState::new(player_hp),
            SpawnPoint(spawn),
            MapPosition::from_vec(spawn),
            RigidBody::with_physics(config.player.friction, Some(config.player.max_speed)),
            CollisionFilter::player(),
            Cooldown::new(config.player.fire_cooldown),
            Flash::default(),
        ))
        .id();
    ctx.attach_sphere(
        player,
        PLAYER_RADIUS,
        spawn,
        CollisionFilter::player(),
        AppearanceId::PLAYER,
    )?;

    // Boss
    let boss_spawn = config.boss.spawn;
    let boss = ctx
        .world
        .spawn((
            Combatant { side: Side::Enemy },
            CombatantState::new(boss_hp),
            SpawnPoint(boss_spawn),
            MapPosition::from_vec(boss_spawn),
            RigidBody::new(),
            CollisionFilter::enemy(),
            BossPatterns {
                line: Cooldown::primed(config.boss.line_interval, now),
                spiral: Cooldown::primed(config.boss.spiral_interval, now),
            },
            Flash::default(),
        ))
        .id();
    ctx.attach_sphere(
        boss,
        BOSS_RADIUS,
        boss_spawn,
        CollisionFilter::enemy(),
        AppearanceId::BOSS,
    )?;

    ctx.world.resource_mut::<SharedState>().apply(
        StatePatch::new()
            .player_hp(player_hp)
            .boss_hp(boss_hp)
            .value(keys::PLAYER_DAMAGE, config.score.player_damage as f64)
            .value(keys::BOSS_DAMAGE, config.score.boss_damage as f64)
            .score(0)
            .lives(lives),
    );

    // Music follows the session outcome for as long as the scene lives.
    let bridge = ctx.world.resource::<AudioBridge>().clone();
    bridge.send(AudioCmd::music(BG_MUSIC, true));
    let token = ctx.token.clone();
    ctx.subscribe(
        keys::GAME_STATE,
        Box::new(move |value: &serde_json::Value| {
            if !token.is_alive() {
                return;
            }
            let Some(outcome) = GameStates::from_value(value).and_then(Outcome::from_game_state) else {
                return;
            };
            bridge.send(AudioCmd::stop(BG_MUSIC));
            bridge.send(AudioCmd::music(outcome.music(), false));
        }),
    );

    info!(
        "shmup scene ready: player hp={} lives={}, boss hp={}",
        player_hp, lives, boss_hp
    );
    Ok(handle)
}

/// Build the physics showcase: `num_spheres` spheres dropped from random
/// heights above a small patch of ground.
pub fn showcase(ctx: &mut SceneContext<'_>, options: &SceneOptions) -> Result<SceneHandle, SceneBuildError> {
    let opts = match options {
        SceneOptions::Showcase(opts) => opts.clone(),
        SceneOptions::Default => ShowcaseOptions::default(),
        _ => {
            return Err(SceneBuildError::OptionsMismatch {
                key: ctx.key.to_string(),
                expected: "showcase",
            });
        }
    };

    let mut desc = SceneDescriptor::new(ctx.key);
    desc.gravity = Vec3::new(0.0, -9.81, 0.0);
    let handle = ctx.build_scene_graph(&desc)?;

    let inert = CollisionFilter::new(CollisionGroups::empty(), CollisionGroups::empty());
    let mut rng = fastrand::Rng::new();
    for _ in 0..opts.num_spheres {
        let position = Vec3::new(
            rng.f32() * 10.0 - 5.0,
            rng.f32() * 40.0 + 10.0,
            rng.f32() * 10.0 - 5.0,
        );
        let sphere = ctx
            .world
            .spawn((MapPosition::from_vec(position), RigidBody::new()))
            .id();
        ctx.attach_sphere(sphere, SPHERE_RADIUS, position, inert, AppearanceId::SPHERE)?;
    }
    debug!("showcase scene spawned {} spheres", opts.num_spheres);
    Ok(handle)
}
