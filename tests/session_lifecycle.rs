//! Session lifecycle integration tests: initialization, scene switching and
//! rollback, render start/stop, store-driven flow and disposal.

use std::sync::atomic::{AtomicUsize, Ordering};

use bevy_ecs::prelude::*;
use crossbeam_channel::Receiver;
use glam::Vec3;
use serde_json::Value;

use shmup_session::backend::headless::{BackendCall, HeadlessBackend, HeadlessProbe};
use shmup_session::backend::{AppearanceId, BackendError, SceneDescriptor, SceneHandle, Surface};
use shmup_session::components::body::Body;
use shmup_session::components::collisionfilter::CollisionFilter;
use shmup_session::components::combatant::PlayerShip;
use shmup_session::components::mapposition::MapPosition;
use shmup_session::components::persistent::Persistent;
use shmup_session::components::projectile::Projectile;
use shmup_session::events::audio::AudioCmd;
use shmup_session::game::default_registry;
use shmup_session::resources::audio::AudioBridge;
use shmup_session::resources::gameconfig::CombatConfig;
use shmup_session::resources::gamestate::GameStates;
use shmup_session::resources::statestore::{MemoryStore, StatePatch, StateStore, keys};
use shmup_session::scene::{SceneBuildError, SceneContext};
use shmup_session::{
    ControllerState, SceneOptions, SceneRegistry, SessionController, SessionError, ShmupOptions,
    ShowcaseOptions, SwitchOutcome,
};

struct Harness {
    controller: SessionController,
    probe: HeadlessProbe,
    audio: Receiver<AudioCmd>,
}

fn harness_with(backend: HeadlessBackend, registry: SceneRegistry, store: MemoryStore) -> Harness {
    let probe = backend.probe();
    let (bridge, audio) = AudioBridge::channel();
    let controller = SessionController::new(
        Box::new(backend),
        Box::new(store),
        registry,
        CombatConfig::new(),
        bridge,
    );
    Harness {
        controller,
        probe,
        audio,
    }
}

/// An initialized controller with the built-in scenes.
fn ready() -> Harness {
    let mut h = harness_with(
        HeadlessBackend::new().with_overlap_detection(false),
        default_registry(),
        MemoryStore::new(),
    );
    h.controller
        .initialize(Surface::new("test", 320, 240))
        .expect("initialize");
    h
}

fn scene_entities(controller: &mut SessionController) -> usize {
    let world = controller.world_mut();
    let mut q = world.query_filtered::<Entity, Without<Persistent>>();
    q.iter(world).count()
}

fn builds(probe: &HeadlessProbe, key: &str) -> usize {
    probe.count(|c| matches!(c, BackendCall::BuildScene(k, _) if k == key))
}

fn position(calls: &[BackendCall], pred: impl Fn(&BackendCall) -> bool) -> usize {
    calls.iter().position(pred).expect("call recorded")
}

fn set_game_state(h: &mut Harness, state: GameStates) {
    h.controller.set_state(StatePatch::new().game_state(state));
}

static HALF_BUILT_CALLS: AtomicUsize = AtomicUsize::new(0);

/// Acquires a graph, a body and a listener, then fails.
fn half_built(ctx: &mut SceneContext<'_>, _: &SceneOptions) -> Result<SceneHandle, SceneBuildError> {
    ctx.build_scene_graph(&SceneDescriptor::new(ctx.key))?;
    let entity = ctx.world.spawn(MapPosition::from_vec(Vec3::ZERO)).id();
    ctx.attach_sphere(
        entity,
        1.0,
        Vec3::ZERO,
        CollisionFilter::player(),
        AppearanceId::PLAYER,
    )?;
    ctx.subscribe(
        keys::SCORE,
        Box::new(|_: &Value| {
            HALF_BUILT_CALLS.fetch_add(1, Ordering::SeqCst);
        }),
    );
    Err(SceneBuildError::Invalid {
        key: ctx.key.to_string(),
        reason: "asset missing".to_string(),
    })
}

fn panicking(ctx: &mut SceneContext<'_>, _: &SceneOptions) -> Result<SceneHandle, SceneBuildError> {
    ctx.build_scene_graph(&SceneDescriptor::new(ctx.key))?;
    let entity = ctx.world.spawn(MapPosition::from_vec(Vec3::ZERO)).id();
    ctx.attach_sphere(
        entity,
        1.0,
        Vec3::ZERO,
        CollisionFilter::enemy(),
        AppearanceId::BOSS,
    )?;
    panic!("builder blew up");
}

#[test]
fn initialization_failure_is_reported_and_leaves_the_controller_uninitialized() {
    let mut h = harness_with(
        HeadlessBackend::new().refusing_surfaces(),
        default_registry(),
        MemoryStore::new(),
    );
    let err = h
        .controller
        .initialize(Surface::new("webgl", 320, 240))
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Initialization(BackendError::UnsupportedSurface(_))
    ));
    assert_eq!(h.controller.state(), ControllerState::Uninitialized);
    assert!(matches!(
        h.controller.switch_scene("shmup", SceneOptions::Default),
        Err(SessionError::NotInitialized)
    ));
    assert!(matches!(
        h.controller.frame(0.1),
        Err(SessionError::NotInitialized)
    ));
}

#[test]
fn second_initialize_is_rejected() {
    let mut h = ready();
    assert_eq!(h.controller.state(), ControllerState::Ready);
    assert!(matches!(
        h.controller.initialize(Surface::new("again", 1, 1)),
        Err(SessionError::AlreadyInitialized)
    ));
    assert_eq!(
        h.probe
            .count(|c| matches!(c, BackendCall::CreateContext(_))),
        1
    );
}

#[test]
fn switching_builds_one_scene_and_mirrors_it_into_the_store() {
    let mut h = ready();
    let outcome = h
        .controller
        .switch_scene("shmup", SceneOptions::Default)
        .expect("switch");
    assert_eq!(outcome, SwitchOutcome::Activated);
    assert_eq!(h.controller.state(), ControllerState::Active);
    assert!(!h.controller.is_rendering());
    assert_eq!(h.probe.live_scenes(), 1);
    assert_eq!(h.probe.live_bodies(), 2);

    let shared = h.controller.shared();
    assert_eq!(shared.game_scene().as_deref(), Some("shmup"));
    assert_eq!(shared.game_state(), Some(GameStates::Begin));
    assert_eq!(shared.player_hp(), Some(100.0));
    assert_eq!(shared.boss_hp(), Some(100.0));
    assert_eq!(shared.lives(), Some(3));
    assert_eq!(shared.score(), Some(0));

    // Mirrored writes are muted: the next frame does not rebuild.
    h.controller.frame(0.1).expect("frame");
    assert_eq!(builds(&h.probe, "shmup"), 1);

    let cmds: Vec<AudioCmd> = h.audio.try_iter().collect();
    assert!(cmds.contains(&AudioCmd::music("bg_music", true)));
}

#[test]
fn switching_scenes_disposes_the_old_one_first() {
    let mut h = ready();
    h.controller
        .switch_scene("shmup", SceneOptions::Default)
        .expect("shmup");
    let first = h.controller.session().and_then(|s| s.handle).expect("handle");

    h.controller
        .switch_scene(
            "showcase",
            SceneOptions::Showcase(ShowcaseOptions { num_spheres: 25 }),
        )
        .expect("showcase");

    let calls = h.probe.calls();
    let disposed = position(&calls, |c| *c == BackendCall::DisposeScene(first));
    let built = position(&calls, |c| {
        matches!(c, BackendCall::BuildScene(k, _) if k == "showcase")
    });
    assert!(disposed < built);
    assert_eq!(h.probe.live_scenes(), 1);
    assert_eq!(h.probe.live_bodies(), 25);
    assert_eq!(h.controller.session().map(|s| s.key.as_str()), Some("showcase"));

    let world = h.controller.world_mut();
    let mut ships = world.query_filtered::<Entity, With<PlayerShip>>();
    assert_eq!(ships.iter(world).count(), 0);
}

#[test]
fn unknown_key_leaves_no_scene_active() {
    let mut h = ready();
    h.controller
        .switch_scene("shmup", SceneOptions::Default)
        .expect("shmup");
    let outcome = h
        .controller
        .switch_scene("asteroids", SceneOptions::Default)
        .expect("unknown keys are not errors");

    assert_eq!(outcome, SwitchOutcome::NotRegistered);
    assert!(h.controller.session().is_none());
    assert_eq!(h.controller.state(), ControllerState::Ready);
    assert_eq!(h.probe.live_scenes(), 0);
    assert_eq!(h.probe.live_bodies(), 0);
    h.controller.frame(0.1).expect("frame");
}

#[test]
fn failed_build_rolls_back_everything_it_acquired() {
    let mut registry = default_registry();
    registry.register("broken", half_built);
    let mut h = harness_with(
        HeadlessBackend::new().with_overlap_detection(false),
        registry,
        MemoryStore::new(),
    );
    h.controller
        .initialize(Surface::new("test", 320, 240))
        .expect("initialize");
    let entities_before = scene_entities(&mut h.controller);

    let err = h
        .controller
        .switch_scene("broken", SceneOptions::Default)
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Build {
            source: SceneBuildError::Invalid { .. },
            ..
        }
    ));
    assert_eq!(h.controller.state(), ControllerState::Ready);
    assert!(h.controller.session().is_none());
    assert_eq!(h.probe.live_bodies(), 0);
    assert_eq!(h.probe.live_scenes(), 0);
    assert_eq!(scene_entities(&mut h.controller), entities_before);

    // The listener it registered is gone too.
    h.controller.set_state(StatePatch::new().score(42));
    assert_eq!(HALF_BUILT_CALLS.load(Ordering::SeqCst), 0);

    // The controller is still usable.
    assert_eq!(
        h.controller
            .switch_scene("shmup", SceneOptions::Default)
            .expect("shmup"),
        SwitchOutcome::Activated
    );
}

#[test]
fn panicking_builder_is_rolled_back() {
    let mut registry = SceneRegistry::new();
    registry.register("panics", panicking);
    let mut h = harness_with(HeadlessBackend::new(), registry, MemoryStore::new());
    h.controller
        .initialize(Surface::new("test", 320, 240))
        .expect("initialize");

    let err = h
        .controller
        .switch_scene("panics", SceneOptions::Default)
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Build {
            source: SceneBuildError::Panicked { .. },
            ..
        }
    ));
    assert_eq!(h.controller.state(), ControllerState::Ready);
    assert_eq!(h.probe.live_bodies(), 0);
    assert_eq!(h.probe.live_scenes(), 0);
}

#[test]
fn mismatched_options_are_rejected_without_leftovers() {
    let mut h = ready();
    let err = h
        .controller
        .switch_scene(
            "shmup",
            SceneOptions::Showcase(ShowcaseOptions { num_spheres: 3 }),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Build {
            source: SceneBuildError::OptionsMismatch { .. },
            ..
        }
    ));
    assert_eq!(h.probe.live_scenes(), 0);

    let err = h
        .controller
        .switch_scene(
            "shmup",
            SceneOptions::Shmup(ShmupOptions {
                lives: Some(0),
                ..Default::default()
            }),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Build {
            source: SceneBuildError::Invalid { .. },
            ..
        }
    ));
    assert_eq!(h.probe.live_bodies(), 0);
}

#[test]
fn stop_render_twice_clears_the_surface_once() {
    let mut h = ready();
    // Never started: nothing to do.
    h.controller.stop_render().expect("stop before start");
    assert_eq!(h.probe.count(|c| *c == BackendCall::StopLoop), 0);

    h.controller
        .switch_scene("shmup", SceneOptions::Default)
        .expect("switch");
    h.controller.start_render().expect("start");
    assert!(h.probe.is_running());
    h.probe.clear_journal();

    h.controller.stop_render().expect("first stop");
    h.controller.stop_render().expect("second stop");

    assert_eq!(h.probe.count(|c| *c == BackendCall::StopLoop), 1);
    assert_eq!(h.probe.count(|c| *c == BackendCall::ClearSurface), 1);
    assert!(!h.probe.is_running());
    assert_eq!(h.controller.state(), ControllerState::Stopped);
    assert_eq!(h.controller.shared().game_state(), Some(GameStates::Stop));
}

#[test]
fn start_render_needs_a_scene_and_runs_once() {
    let mut h = ready();
    h.controller.start_render().expect("no scene");
    assert_eq!(h.probe.count(|c| *c == BackendCall::RunLoop), 0);

    h.controller
        .switch_scene("shmup", SceneOptions::Default)
        .expect("switch");
    h.controller.start_render().expect("start");
    h.controller.start_render().expect("again");
    assert_eq!(h.probe.count(|c| *c == BackendCall::RunLoop), 1);
    assert_eq!(h.controller.shared().game_state(), Some(GameStates::Playing));
}

#[test]
fn frames_only_tick_while_rendering() {
    let mut h = ready();
    h.controller
        .switch_scene("shmup", SceneOptions::Default)
        .expect("switch");
    h.controller.intent_mut().fire = true;

    h.controller.frame(0.1).expect("frame");
    {
        let world = h.controller.world_mut();
        let mut q = world.query::<&Projectile>();
        assert_eq!(q.iter(world).count(), 0);
    }

    h.controller.start_render().expect("start");
    h.controller.frame(0.1).expect("frame");
    let world = h.controller.world_mut();
    let mut q = world.query::<&Projectile>();
    assert_eq!(q.iter(world).count(), 1);
}

#[test]
fn clear_scene_stops_then_disposes_then_blanks() {
    let mut h = ready();
    h.controller
        .switch_scene("shmup", SceneOptions::Default)
        .expect("switch");
    h.controller.start_render().expect("start");
    h.probe.clear_journal();

    h.controller.clear_scene().expect("clear");

    let calls = h.probe.calls();
    let stop = position(&calls, |c| *c == BackendCall::StopLoop);
    let destroy = position(&calls, |c| matches!(c, BackendCall::DestroyBody(_)));
    let dispose = position(&calls, |c| matches!(c, BackendCall::DisposeScene(_)));
    let clear = position(&calls, |c| *c == BackendCall::ClearSurface);
    assert!(stop < destroy && destroy < dispose && dispose < clear);

    assert_eq!(h.controller.state(), ControllerState::Ready);
    assert!(h.controller.session().is_none());
    assert_eq!(h.probe.live_bodies(), 0);
    assert_eq!(h.controller.shared().game_state(), Some(GameStates::Clear));

    let cmds: Vec<AudioCmd> = h.audio.try_iter().collect();
    assert_eq!(cmds.last(), Some(&AudioCmd::StopAll));

    let world = h.controller.world_mut();
    let mut bodies = world.query::<&Body>();
    assert_eq!(bodies.iter(world).count(), 0);
}

#[test]
fn game_state_writes_drive_the_session() {
    let mut h = ready();

    set_game_state(&mut h, GameStates::Begin);
    assert!(h.controller.session().is_none(), "applied on the next frame");
    h.controller.frame(1.0 / 60.0).expect("frame");
    assert_eq!(h.controller.state(), ControllerState::Active);
    assert!(h.controller.is_rendering());
    assert_eq!(h.controller.shared().game_state(), Some(GameStates::Playing));
    assert_eq!(builds(&h.probe, "shmup"), 1);

    set_game_state(&mut h, GameStates::Stop);
    h.controller.frame(1.0 / 60.0).expect("frame");
    assert!(!h.controller.is_rendering());
    assert_eq!(h.controller.state(), ControllerState::Stopped);

    set_game_state(&mut h, GameStates::Start);
    h.controller.frame(1.0 / 60.0).expect("frame");
    assert!(h.controller.is_rendering());
    assert_eq!(h.controller.shared().game_state(), Some(GameStates::Playing));

    set_game_state(&mut h, GameStates::Reset);
    h.controller.frame(1.0 / 60.0).expect("frame");
    assert_eq!(builds(&h.probe, "shmup"), 2);
    assert!(h.controller.is_rendering());
    assert_eq!(h.probe.live_scenes(), 1);
    assert_eq!(h.controller.shared().game_state(), Some(GameStates::Playing));

    set_game_state(&mut h, GameStates::MainMenu);
    h.controller.frame(1.0 / 60.0).expect("frame");
    assert!(h.controller.session().is_none());
    assert!(!h.controller.is_rendering());
    assert_eq!(h.probe.live_scenes(), 0);
    assert_eq!(h.probe.live_bodies(), 0);
    assert_eq!(h.controller.shared().game_state(), Some(GameStates::MainMenu));
}

#[test]
fn scene_key_writes_switch_and_keep_rendering() {
    let mut h = ready();
    set_game_state(&mut h, GameStates::Begin);
    h.controller.frame(1.0 / 60.0).expect("frame");

    h.controller.set_state(
        StatePatch::new()
            .value(
                keys::GAME_OPTS,
                SceneOptions::Showcase(ShowcaseOptions { num_spheres: 10 }).to_value(),
            )
            .value(keys::GAME_SCENE, "showcase"),
    );
    h.controller.frame(1.0 / 60.0).expect("frame");

    assert_eq!(h.controller.session().map(|s| s.key.as_str()), Some("showcase"));
    assert!(h.controller.is_rendering());
    assert_eq!(h.probe.live_bodies(), 10);
    assert_eq!(h.probe.live_scenes(), 1);
}

#[test]
fn one_write_naming_scene_and_begin_builds_once() {
    let mut h = ready();
    h.controller.set_state(
        StatePatch::new()
            .value(keys::GAME_SCENE, "shmup")
            .game_state(GameStates::Begin),
    );
    h.controller.frame(1.0 / 60.0).expect("frame");
    assert_eq!(builds(&h.probe, "shmup"), 1);
    assert!(h.controller.is_rendering());
    assert_eq!(h.controller.shared().game_state(), Some(GameStates::Playing));

    // Rewriting the key that is already built changes nothing.
    h.controller
        .set_state(StatePatch::new().value(keys::GAME_SCENE, "shmup"));
    h.controller.frame(1.0 / 60.0).expect("frame");
    assert_eq!(builds(&h.probe, "shmup"), 1);
    assert!(h.controller.is_rendering());
}

#[test]
fn options_write_rebuilds_the_current_scene() {
    let mut h = ready();
    set_game_state(&mut h, GameStates::Begin);
    h.controller.frame(1.0 / 60.0).expect("frame");
    assert_eq!(h.controller.shared().lives(), Some(3));

    let one_life = SceneOptions::Shmup(ShmupOptions {
        lives: Some(1),
        ..Default::default()
    });
    h.controller
        .set_state(StatePatch::new().value(keys::GAME_OPTS, one_life.to_value()));
    h.controller.frame(1.0 / 60.0).expect("frame");

    assert_eq!(builds(&h.probe, "shmup"), 2);
    assert_eq!(h.probe.live_scenes(), 1);
    assert!(h.controller.is_rendering());
    assert_eq!(h.controller.shared().lives(), Some(1));
    assert_eq!(
        h.controller.session().map(|s| s.options.clone()),
        Some(one_life.clone())
    );

    // The same options again are not a change.
    h.controller
        .set_state(StatePatch::new().value(keys::GAME_OPTS, one_life.to_value()));
    h.controller.frame(1.0 / 60.0).expect("frame");
    assert_eq!(builds(&h.probe, "shmup"), 2);
}

#[test]
fn switching_after_a_finished_session_begins_again() {
    let mut h = ready();
    h.controller
        .switch_scene("shmup", SceneOptions::Default)
        .expect("switch");
    set_game_state(&mut h, GameStates::Lose);
    h.controller.frame(0.1).expect("frame");
    assert_eq!(h.controller.shared().game_state(), Some(GameStates::Lose));

    h.controller
        .request_switch(
            "showcase",
            SceneOptions::Showcase(ShowcaseOptions { num_spheres: 5 }),
        )
        .expect("request");
    h.controller.frame(0.1).expect("frame");
    assert_eq!(h.controller.session().map(|s| s.key.as_str()), Some("showcase"));
    assert_eq!(h.controller.shared().game_state(), Some(GameStates::Begin));
}

#[test]
fn newer_switch_request_supersedes_an_older_one() {
    let mut h = ready();
    h.controller
        .request_switch(
            "showcase",
            SceneOptions::Showcase(ShowcaseOptions { num_spheres: 5 }),
        )
        .expect("request");
    h.controller
        .request_switch("shmup", SceneOptions::Default)
        .expect("request");
    assert!(h.controller.has_pending_switch());

    h.controller.frame(0.1).expect("frame");
    assert!(!h.controller.has_pending_switch());
    assert_eq!(builds(&h.probe, "showcase"), 0);
    assert_eq!(builds(&h.probe, "shmup"), 1);
    assert_eq!(h.controller.session().map(|s| s.key.as_str()), Some("shmup"));
}

#[test]
fn resize_is_forwarded_even_before_initialize() {
    let mut h = harness_with(HeadlessBackend::new(), default_registry(), MemoryStore::new());
    h.controller.resize(800, 600).expect("resize");
    assert_eq!(h.probe.count(|c| *c == BackendCall::Resize(800, 600)), 1);
}

#[test]
fn dispose_is_terminal_and_idempotent() {
    let mut h = ready();
    h.controller
        .switch_scene("shmup", SceneOptions::Default)
        .expect("switch");
    h.controller.start_render().expect("start");

    h.controller.dispose().expect("dispose");
    h.controller.dispose().expect("dispose twice");
    assert_eq!(h.controller.state(), ControllerState::Disposed);
    assert_eq!(h.probe.count(|c| *c == BackendCall::Release), 1);
    assert_eq!(h.probe.live_bodies(), 0);
    assert!(!h.probe.is_running());

    let c = &mut h.controller;
    assert!(matches!(
        c.switch_scene("shmup", SceneOptions::Default),
        Err(SessionError::Disposed)
    ));
    assert!(matches!(c.start_render(), Err(SessionError::Disposed)));
    assert!(matches!(c.stop_render(), Err(SessionError::Disposed)));
    assert!(matches!(c.clear_scene(), Err(SessionError::Disposed)));
    assert!(matches!(c.resize(10, 10), Err(SessionError::Disposed)));
    assert!(matches!(c.frame(0.1), Err(SessionError::Disposed)));
    assert!(matches!(
        c.request_switch("shmup", SceneOptions::Default),
        Err(SessionError::Disposed)
    ));
    assert!(matches!(
        c.initialize(Surface::new("late", 1, 1)),
        Err(SessionError::Disposed)
    ));
}

#[test]
fn lost_session_lands_in_the_persisted_score_history() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state.json");

    let mut h = harness_with(
        HeadlessBackend::new().with_overlap_detection(false),
        default_registry(),
        MemoryStore::persistent(path.clone()),
    );
    h.controller
        .initialize(Surface::new("test", 320, 240))
        .expect("initialize");
    h.controller
        .switch_scene(
            "shmup",
            SceneOptions::Shmup(ShmupOptions {
                lives: Some(1),
                player_hp: Some(10.0),
                boss_hp: None,
            }),
        )
        .expect("switch");
    h.controller.start_render().expect("start");
    for _ in 0..4 {
        h.controller.frame(0.5).expect("frame");
    }

    let (player_body, bullet_body) = {
        let world = h.controller.world_mut();
        let mut ships = world.query_filtered::<&Body, With<PlayerShip>>();
        let player_body = ships.iter(world).next().expect("player").0;
        let mut shots = world.query::<(&Projectile, &Body)>();
        let bullet_body = shots.iter(world).next().expect("volley").1.0;
        (player_body, bullet_body)
    };
    h.probe.inject_contact(bullet_body, player_body);
    h.controller.frame(0.5).expect("frame");
    assert_eq!(h.controller.shared().game_state(), Some(GameStates::Lose));

    let restored = MemoryStore::persistent(path);
    let history = restored.get(keys::SCORE_HISTORY).expect("history persisted");
    let scores: Vec<i64> = history
        .as_object()
        .expect("object")
        .values()
        .filter_map(Value::as_i64)
        .collect();
    assert_eq!(scores, vec![-50]);
}
