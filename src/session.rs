//! Session lifecycle controller.
//!
//! [`SessionController`] owns the ECS world, the tick schedule, the scene
//! registry and the backend for its whole lifetime, and guarantees there is
//! at most one scene in the world at any time. Every mutating operation
//! takes `&mut self`, so scene construction, teardown and ticking can never
//! overlap; queued switch requests are applied between frames.
//!
//! State machine:
//!
//! ```text
//! Uninitialized -> Ready -> (Building <-> Active <-> Stopped) -> Disposed
//! ```
//!
//! `Active` means a scene is built; whether frames are being ticked is the
//! separate render flag ([`SessionController::is_rendering`]). `Stopped` is a
//! built scene whose render loop was halted.
//!
//! The UI drives the controller through the shared store: writes to
//! `gameState`, `gameScene` and `gameOpts` are queued by store subscriptions
//! and applied at the start of the next [`SessionController::frame`]. A
//! scene or options write only rebuilds when it names something other than
//! the last scene built.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;
use log::{debug, error, info, warn};
use serde_json::Value;
use thiserror::Error;

use crate::backend::{Backend, BackendError, RenderBackend, Surface};
use crate::components::persistent::Persistent;
use crate::events::audio::AudioCmd;
use crate::resources::audio::{AudioBridge, setup_audio};
use crate::resources::bodymap::BodyMap;
use crate::resources::bulletpool::BulletPool;
use crate::resources::gameconfig::CombatConfig;
use crate::resources::gamestate::{FlowInbox, FlowSignal, GameStates};
use crate::resources::input::PlayerIntent;
use crate::resources::liveness::{LivenessToken, SceneToken};
use crate::resources::scoreboard::Scoreboard;
use crate::resources::statestore::{SharedState, StatePatch, StateStore, SubscriptionId, keys};
use crate::resources::worldtime::WorldTime;
use crate::scene::{self, SceneBuildError, SceneContext, SceneOptions, SceneRegistry, SceneSession, SceneStatus};
use crate::systems::build_tick_schedule;
use crate::systems::collision::collision_observer;
use crate::systems::time::update_world_time;

/// Controller lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerState {
    Uninitialized,
    Ready,
    Building,
    Active,
    Stopped,
    Disposed,
}

/// Result of a switch that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The new scene is built and active.
    Activated,
    /// No builder for the key; no scene is active.
    NotRegistered,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("backend could not acquire the surface: {0}")]
    Initialization(#[source] BackendError),
    #[error("controller is already initialized")]
    AlreadyInitialized,
    #[error("controller is not initialized")]
    NotInitialized,
    #[error("controller has been disposed")]
    Disposed,
    #[error("scene '{key}' failed to build")]
    Build {
        key: String,
        #[source]
        source: SceneBuildError,
    },
}

pub struct SessionController {
    world: World,
    schedule: Schedule,
    registry: SceneRegistry,
    state: ControllerState,
    surface: Option<Surface>,
    session: Option<SceneSession>,
    last_scene: Option<(String, SceneOptions)>,
    pending_switch: Option<(String, SceneOptions)>,
    rendering: bool,
    inbox: Arc<FlowInbox>,
    flow_subscriptions: Vec<SubscriptionId>,
}

impl SessionController {
    /// Build the world around the injected collaborators.
    ///
    /// The controller starts `Uninitialized`; call
    /// [`initialize`](Self::initialize) before switching scenes.
    pub fn new(
        backend: Box<dyn RenderBackend>,
        store: Box<dyn StateStore>,
        registry: SceneRegistry,
        config: CombatConfig,
        audio: AudioBridge,
    ) -> Self {
        let mut world = World::new();
        world.insert_resource(WorldTime::default());
        world.insert_resource(SharedState::new(store));
        world.insert_resource(config);
        world.insert_resource(BulletPool::default());
        world.insert_resource(BodyMap::default());
        world.insert_resource(PlayerIntent::default());
        world.insert_resource(Scoreboard::default());
        world.insert_resource(SceneToken::default());
        setup_audio(&mut world, audio);
        world.insert_non_send_resource(Backend(backend));

        world.spawn((Observer::new(collision_observer), Persistent));
        world.flush();

        let inbox = Arc::new(FlowInbox::default());
        let flow_subscriptions = {
            let mut shared = world.resource_mut::<SharedState>();
            let states = Arc::clone(&inbox);
            let scenes = Arc::clone(&inbox);
            let opts = Arc::clone(&inbox);
            vec![
                shared.subscribe(
                    keys::GAME_STATE,
                    Box::new(move |value: &Value| {
                        if let Some(state) = GameStates::from_value(value) {
                            states.push(FlowSignal::GameState(state));
                        }
                    }),
                ),
                shared.subscribe(
                    keys::GAME_SCENE,
                    Box::new(move |value: &Value| {
                        if let Some(key) = value.as_str() {
                            scenes.push(FlowSignal::Scene(key.to_string()));
                        }
                    }),
                ),
                shared.subscribe(
                    keys::GAME_OPTS,
                    Box::new(move |_: &Value| opts.push(FlowSignal::Options)),
                ),
            ]
        };

        Self {
            world,
            schedule: build_tick_schedule(),
            registry,
            state: ControllerState::Uninitialized,
            surface: None,
            session: None,
            last_scene: None,
            pending_switch: None,
            rendering: false,
            inbox,
            flow_subscriptions,
        }
    }

    /// Bind the backend to `surface`. Only valid once.
    pub fn initialize(&mut self, surface: Surface) -> Result<(), SessionError> {
        match self.state {
            ControllerState::Disposed => return Err(SessionError::Disposed),
            ControllerState::Uninitialized => {}
            _ => return Err(SessionError::AlreadyInitialized),
        }
        self.backend()
            .create_context(&surface)
            .map_err(SessionError::Initialization)?;
        info!(
            "session initialized on '{}' ({}x{})",
            surface.label, surface.width, surface.height
        );
        self.surface = Some(surface);
        self.state = ControllerState::Ready;
        Ok(())
    }

    /// Replace the current scene with a fresh `key` scene.
    ///
    /// In order: stop the render loop, tear the current scene down, look up
    /// the builder, build, mirror the new scene into the store. An unknown
    /// key leaves no scene active and is not an error. A failed build is
    /// rolled back completely and leaves the controller `Ready`.
    pub fn switch_scene(&mut self, key: &str, options: SceneOptions) -> Result<SwitchOutcome, SessionError> {
        self.ensure_initialized()?;
        self.pending_switch = None;

        if self.rendering {
            self.backend().stop_loop();
            self.rendering = false;
        }
        self.teardown_scene();
        self.state = ControllerState::Ready;

        let Some(builder) = self.registry.get(key) else {
            warn!("no scene registered for key '{}'", key);
            return Ok(SwitchOutcome::NotRegistered);
        };

        let Some(surface) = self.surface.as_ref() else {
            return Err(SessionError::NotInitialized);
        };
        self.state = ControllerState::Building;
        let token = LivenessToken::new();
        self.world.insert_resource(SceneToken(token.clone()));
        let mut session = SceneSession::new(key, options.clone());
        session.status = SceneStatus::Building;
        session.token = token.clone();
        debug!("building scene '{}' with {:?}", key, options);

        let mut ctx = SceneContext::new(&mut self.world, surface, key, token);
        let built = match catch_unwind(AssertUnwindSafe(|| builder(&mut ctx, &options))) {
            Ok(result) => result,
            Err(_) => Err(SceneBuildError::Panicked { key: key.to_string() }),
        };
        match built {
            Ok(handle) => {
                let (graph, subscriptions) = ctx.commit();
                session.handle = graph.or(Some(handle));
                session.subscriptions = subscriptions;
            }
            Err(source) => {
                // Dropping the armed context rolls the scene back.
                drop(ctx);
                session.status = SceneStatus::Disposed;
                self.state = ControllerState::Ready;
                error!("scene '{}' failed to build: {}", key, source);
                return Err(SessionError::Build {
                    key: key.to_string(),
                    source,
                });
            }
        }

        session.status = SceneStatus::Active;
        self.session = Some(session);
        self.state = ControllerState::Active;
        self.last_scene = Some((key.to_string(), options.clone()));

        let mut patch = StatePatch::new()
            .value(keys::GAME_SCENE, key)
            .value(keys::GAME_OPTS, options.to_value());
        // A finished session does not carry its outcome into the next scene.
        let current = self.world.resource::<SharedState>().game_state();
        if !current.is_some_and(|state| state.is_active() && !state.is_terminal()) {
            patch = patch.game_state(GameStates::Begin);
        }
        self.mirror(patch);
        info!("scene '{}' active", key);
        Ok(SwitchOutcome::Activated)
    }

    /// Queue a switch for the next frame. A newer request replaces an older
    /// one that has not been applied yet.
    pub fn request_switch(&mut self, key: &str, options: SceneOptions) -> Result<(), SessionError> {
        self.ensure_not_disposed()?;
        if let Some((old, _)) = self.pending_switch.replace((key.to_string(), options)) {
            debug!("switch to '{}' superseded by '{}'", old, key);
        }
        Ok(())
    }

    /// Start ticking the active scene. No-op without a scene or when
    /// already rendering.
    pub fn start_render(&mut self) -> Result<(), SessionError> {
        self.ensure_not_disposed()?;
        if self.rendering || self.session.is_none() {
            debug!("start_render ignored (rendering={})", self.rendering);
            return Ok(());
        }
        self.backend().run_loop();
        self.rendering = true;
        self.state = ControllerState::Active;
        if let Some(session) = self.session.as_mut() {
            session.status = SceneStatus::Active;
        }
        self.mirror(StatePatch::new().game_state(GameStates::Playing));
        info!("render loop started");
        Ok(())
    }

    /// Halt ticking and blank the surface. No-op when not rendering.
    pub fn stop_render(&mut self) -> Result<(), SessionError> {
        self.ensure_not_disposed()?;
        if !self.rendering {
            return Ok(());
        }
        {
            let mut backend = self.backend();
            backend.stop_loop();
            backend.clear_surface();
        }
        self.rendering = false;
        self.state = ControllerState::Stopped;
        if let Some(session) = self.session.as_mut() {
            session.status = SceneStatus::Stopped;
        }
        self.mirror(StatePatch::new().game_state(GameStates::Stop));
        info!("render loop stopped");
        Ok(())
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), SessionError> {
        self.ensure_not_disposed()?;
        self.backend().resize(width, height);
        if let Some(surface) = self.surface.as_mut() {
            surface.width = width;
            surface.height = height;
        }
        Ok(())
    }

    /// Stop the loop, tear the scene down and blank the surface, in that
    /// order, before returning.
    pub fn clear_scene(&mut self) -> Result<(), SessionError> {
        self.ensure_not_disposed()?;
        if self.rendering {
            self.backend().stop_loop();
            self.rendering = false;
        }
        let had_scene = self.session.is_some();
        self.teardown_scene();
        if self.state != ControllerState::Uninitialized {
            self.state = ControllerState::Ready;
        }
        let was_active = self
            .world
            .resource::<SharedState>()
            .game_state()
            .is_some_and(|state| state.is_active());
        if had_scene && was_active {
            self.mirror(StatePatch::new().game_state(GameStates::Clear));
        }
        Ok(())
    }

    /// Stop, clear and release the backend. Further calls fail with
    /// [`SessionError::Disposed`], except `dispose` itself.
    pub fn dispose(&mut self) -> Result<(), SessionError> {
        if self.state == ControllerState::Disposed {
            return Ok(());
        }
        if self.rendering {
            self.backend().stop_loop();
            self.rendering = false;
        }
        self.teardown_scene();
        self.pending_switch = None;
        {
            let mut shared = self.world.resource_mut::<SharedState>();
            for id in self.flow_subscriptions.drain(..) {
                shared.unsubscribe(id);
            }
        }
        while self.inbox.pop().is_some() {}
        self.backend().release();
        self.state = ControllerState::Disposed;
        info!("session disposed");
        Ok(())
    }

    /// Advance one frame: apply queued flow signals and switch requests,
    /// then tick the scene if rendering.
    pub fn frame(&mut self, dt: f32) -> Result<(), SessionError> {
        self.ensure_initialized()?;
        self.process_flow();
        if let Some((key, options)) = self.pending_switch.take()
            && let Err(e) = self.switch_scene(&key, options)
        {
            error!("queued switch to '{}' failed: {}", key, e);
        }
        if self.rendering {
            update_world_time(&mut self.world, dt);
            self.schedule.run(&mut self.world);
            self.world.clear_trackers();
        }
        Ok(())
    }

    fn process_flow(&mut self) {
        // Set once a scene or options write has rebuilt the scene, so a
        // `begin`/`reset` arriving with it does not build it a second time.
        let mut rebuilt = false;
        while let Some(signal) = self.inbox.pop() {
            debug!("flow signal {:?}", signal);
            let result = match signal {
                FlowSignal::Scene(key) => self.apply_scene_change(Some(key)).map(|built| rebuilt |= built),
                FlowSignal::Options => self.apply_scene_change(None).map(|built| rebuilt |= built),
                FlowSignal::GameState(GameStates::Begin | GameStates::Reset) if rebuilt => self.start_render(),
                FlowSignal::GameState(state) => self.apply_game_state(state),
            };
            if let Err(e) = result {
                error!("flow signal failed: {}", e);
            }
        }
    }

    /// Rebuild for a `gameScene`/`gameOpts` write. `key` defaults to the
    /// stored `gameScene`. Returns false when the write names the scene and
    /// options that were last built, which leaves the session alone.
    fn apply_scene_change(&mut self, key: Option<String>) -> Result<bool, SessionError> {
        let key = key
            .or_else(|| self.world.resource::<SharedState>().game_scene())
            .or_else(|| self.last_scene.as_ref().map(|(key, _)| key.clone()));
        let Some(key) = key else {
            warn!("scene options written without a scene key");
            return Ok(false);
        };
        let options = self.stored_options();
        if self
            .last_scene
            .as_ref()
            .is_some_and(|(last_key, last_opts)| *last_key == key && *last_opts == options)
        {
            debug!("scene '{}' unchanged, not rebuilding", key);
            return Ok(false);
        }
        if self.switch_scene(&key, options)? == SwitchOutcome::Activated {
            let state = self.world.resource::<SharedState>().game_state();
            if state.is_some_and(|s| s.starts_render()) {
                self.start_render()?;
            }
        }
        Ok(true)
    }

    fn apply_game_state(&mut self, state: GameStates) -> Result<(), SessionError> {
        match state {
            GameStates::Begin => {
                let key = self
                    .world
                    .resource::<SharedState>()
                    .game_scene()
                    .or_else(|| self.last_scene.as_ref().map(|(key, _)| key.clone()));
                let Some(key) = key else {
                    warn!("begin requested without a scene key");
                    return Ok(());
                };
                let options = self.stored_options();
                if self.switch_scene(&key, options)? == SwitchOutcome::Activated {
                    self.start_render()?;
                }
                Ok(())
            }
            GameStates::Start => self.start_render(),
            GameStates::Stop => self.stop_render(),
            GameStates::Clear | GameStates::MainMenu => self.clear_scene(),
            GameStates::Reset => {
                self.stop_render()?;
                let Some((key, options)) = self.last_scene.clone() else {
                    return Ok(());
                };
                if self.switch_scene(&key, options)? == SwitchOutcome::Activated {
                    self.start_render()?;
                }
                Ok(())
            }
            GameStates::Playing | GameStates::Win | GameStates::Lose => Ok(()),
        }
    }

    fn stored_options(&self) -> SceneOptions {
        SceneOptions::from_value(self.world.resource::<SharedState>().get(keys::GAME_OPTS))
    }

    fn teardown_scene(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        scene::teardown(
            &mut self.world,
            session.handle.take(),
            std::mem::take(&mut session.subscriptions),
            &session.token,
        );
        session.status = SceneStatus::Disposed;
        self.backend().clear_surface();
        self.world.resource::<AudioBridge>().send(AudioCmd::StopAll);
        info!("scene '{}' cleared", session.key);
    }

    /// Write to the store without feeding the write back into the flow.
    fn mirror(&mut self, patch: StatePatch) {
        let inbox = Arc::clone(&self.inbox);
        let _muted = inbox.mute();
        self.world.resource_mut::<SharedState>().apply(patch);
    }

    fn backend(&mut self) -> Mut<'_, Backend> {
        self.world.non_send_resource_mut::<Backend>()
    }

    fn ensure_not_disposed(&self) -> Result<(), SessionError> {
        if self.state == ControllerState::Disposed {
            Err(SessionError::Disposed)
        } else {
            Ok(())
        }
    }

    fn ensure_initialized(&self) -> Result<(), SessionError> {
        match self.state {
            ControllerState::Disposed => Err(SessionError::Disposed),
            ControllerState::Uninitialized => Err(SessionError::NotInitialized),
            _ => Ok(()),
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering
    }

    pub fn session(&self) -> Option<&SceneSession> {
        self.session.as_ref()
    }

    pub fn has_pending_switch(&self) -> bool {
        self.pending_switch.is_some()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn shared(&self) -> &SharedState {
        self.world.resource::<SharedState>()
    }

    /// Write to the store as the UI would; flow signals are queued.
    pub fn set_state(&mut self, patch: StatePatch) {
        self.world.resource_mut::<SharedState>().apply(patch);
    }

    pub fn intent_mut(&mut self) -> Mut<'_, PlayerIntent> {
        self.world.resource_mut::<PlayerIntent>()
    }
}
