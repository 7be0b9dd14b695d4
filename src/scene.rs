//! Scene sessions, typed options and the scene registry.
//!
//! A scene is built by a plain function looked up by key in the
//! [`SceneRegistry`]. Builders receive a [`SceneContext`] that wraps the
//! world and records everything the scene acquires (its scene graph, store
//! subscriptions) so the controller can tear it all down again, whether the
//! scene ends normally or its construction fails half way.

use bevy_ecs::prelude::*;
use glam::Vec3;
use log::warn;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{
    Backend, BackendError, BodyDesc, BodyHandle, BodyShape, SceneDescriptor, SceneHandle, Surface,
};
use crate::components::body::{Appearance, Body};
use crate::components::collisionfilter::CollisionFilter;
use crate::components::persistent::Persistent;
use crate::resources::bodymap::BodyMap;
use crate::resources::bulletpool::BulletPool;
use crate::resources::liveness::LivenessToken;
use crate::resources::statestore::{SharedState, StoreCallback, SubscriptionId};

/// Options of the combat scene. Unset fields keep the configured values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShmupOptions {
    pub lives: Option<u32>,
    pub player_hp: Option<f32>,
    pub boss_hp: Option<f32>,
}

/// Options of the physics showcase scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowcaseOptions {
    pub num_spheres: usize,
}

impl Default for ShowcaseOptions {
    fn default() -> Self {
        Self { num_spheres: 3000 }
    }
}

/// Per-scene-kind options. Mirrored into the store as `gameOpts`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SceneOptions {
    Shmup(ShmupOptions),
    Showcase(ShowcaseOptions),
    /// Whatever the builder considers its defaults.
    #[default]
    Default,
}

impl SceneOptions {
    /// Parse stored `gameOpts`; null or unreadable values mean [`SceneOptions::Default`].
    pub fn from_value(value: Option<serde_json::Value>) -> SceneOptions {
        match value {
            None | Some(serde_json::Value::Null) => SceneOptions::Default,
            Some(v) => serde_json::from_value(v).unwrap_or_else(|e| {
                warn!("unreadable scene options, using defaults: {}", e);
                SceneOptions::Default
            }),
        }
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Debug, Error)]
pub enum SceneBuildError {
    #[error("scene '{key}' expects {expected} options")]
    OptionsMismatch { key: String, expected: &'static str },
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("scene '{key}' cannot be built: {reason}")]
    Invalid { key: String, reason: String },
    #[error("scene '{key}' builder panicked")]
    Panicked { key: String },
}

/// Lifecycle status of one scene session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneStatus {
    Uninitialized,
    Building,
    Active,
    Stopped,
    Disposed,
}

/// One constructed scene instance.
#[derive(Debug)]
pub struct SceneSession {
    pub key: String,
    pub options: SceneOptions,
    pub status: SceneStatus,
    pub handle: Option<SceneHandle>,
    pub token: LivenessToken,
    pub subscriptions: Vec<SubscriptionId>,
}

impl SceneSession {
    pub fn new(key: &str, options: SceneOptions) -> Self {
        Self {
            key: key.to_string(),
            options,
            status: SceneStatus::Uninitialized,
            handle: None,
            token: LivenessToken::dead(),
            subscriptions: Vec::new(),
        }
    }
}

/// Builder-facing view of the world during construction.
///
/// The context doubles as the construction guard: unless
/// [`SceneContext::commit`] is called, dropping it tears down everything
/// the builder created, whichever way the builder exited.
pub struct SceneContext<'a> {
    pub world: &'a mut World,
    pub surface: &'a Surface,
    pub key: &'a str,
    pub token: LivenessToken,
    handle: Option<SceneHandle>,
    subscriptions: Vec<SubscriptionId>,
    armed: bool,
}

impl<'a> SceneContext<'a> {
    pub(crate) fn new(
        world: &'a mut World,
        surface: &'a Surface,
        key: &'a str,
        token: LivenessToken,
    ) -> Self {
        Self {
            world,
            surface,
            key,
            token,
            handle: None,
            subscriptions: Vec::new(),
            armed: true,
        }
    }

    /// Ask the backend for this scene's graph. Only one graph per scene.
    pub fn build_scene_graph(&mut self, desc: &SceneDescriptor) -> Result<SceneHandle, SceneBuildError> {
        if let Some(handle) = self.handle {
            return Ok(handle);
        }
        let handle = self
            .world
            .non_send_resource_mut::<Backend>()
            .build_scene_graph(desc)?;
        self.handle = Some(handle);
        Ok(handle)
    }

    /// Create a sphere body and register it for `entity`.
    pub fn attach_sphere(
        &mut self,
        entity: Entity,
        radius: f32,
        position: Vec3,
        filter: CollisionFilter,
        appearance: crate::backend::AppearanceId,
    ) -> Result<BodyHandle, SceneBuildError> {
        let handle = self
            .world
            .non_send_resource_mut::<Backend>()
            .create_body(&BodyDesc {
                shape: BodyShape::Sphere { radius },
                position,
                filter,
                appearance,
            })?;
        self.world.resource_mut::<BodyMap>().insert(handle, entity);
        self.world
            .entity_mut(entity)
            .insert((Body(handle), Appearance(appearance)));
        Ok(handle)
    }

    /// Subscribe to a store key for the lifetime of the scene.
    pub fn subscribe(&mut self, key: &str, callback: StoreCallback) -> SubscriptionId {
        let id = self.world.resource_mut::<SharedState>().subscribe(key, callback);
        self.subscriptions.push(id);
        id
    }

    /// Keep what was built; hands back the scene graph and subscriptions.
    pub(crate) fn commit(mut self) -> (Option<SceneHandle>, Vec<SubscriptionId>) {
        self.armed = false;
        (self.handle.take(), std::mem::take(&mut self.subscriptions))
    }
}

impl Drop for SceneContext<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!("rolling back partially built scene '{}'", self.key);
        teardown(
            self.world,
            self.handle.take(),
            std::mem::take(&mut self.subscriptions),
            &self.token,
        );
    }
}

/// Remove a scene from the world, in order: invalidate its token, drop its
/// store subscriptions, destroy every body, despawn every non-persistent
/// entity, empty the bullet pool, dispose the scene graph.
///
/// Stopping the render loop before and clearing the surface after are the
/// caller's business.
pub(crate) fn teardown(
    world: &mut World,
    handle: Option<SceneHandle>,
    subscriptions: Vec<SubscriptionId>,
    token: &LivenessToken,
) {
    token.invalidate();

    {
        let mut shared = world.resource_mut::<SharedState>();
        for id in subscriptions {
            shared.unsubscribe(id);
        }
    }

    let bodies = world.resource_mut::<BodyMap>().take_all();
    {
        let mut backend = world.non_send_resource_mut::<Backend>();
        for body in bodies {
            backend.destroy_body(body);
        }
    }

    let mut scene_entities = world.query_filtered::<Entity, Without<Persistent>>();
    let doomed: Vec<Entity> = scene_entities.iter(world).collect();
    for entity in doomed {
        world.despawn(entity);
    }
    world.resource_mut::<BulletPool>().clear();

    if let Some(handle) = handle {
        world.non_send_resource_mut::<Backend>().dispose_scene(handle);
    }
    world.flush();
}

/// Scene builder signature.
pub type SceneBuilder = fn(&mut SceneContext<'_>, &SceneOptions) -> Result<SceneHandle, SceneBuildError>;

/// Scene key to builder map.
#[derive(Default, Clone)]
pub struct SceneRegistry {
    builders: FxHashMap<String, SceneBuilder>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: impl Into<String>, builder: SceneBuilder) -> &mut Self {
        self.builders.insert(key.into(), builder);
        self
    }

    pub fn get(&self, key: &str) -> Option<SceneBuilder> {
        self.builders.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.builders.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.builders.keys().map(String::as_str)
    }
}
