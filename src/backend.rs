//! Rendering/physics backend boundary.
//!
//! The core never draws or simulates anything itself. It talks to a
//! [`RenderBackend`] through opaque handles: one [`SceneHandle`] per built
//! scene graph and one [`BodyHandle`] per physics body. Contacts come back as
//! [`ContactPair`]s of body handles, which the core maps to entities with
//! [`BodyMap`](crate::resources::bodymap::BodyMap).
//!
//! The backend is stored in the world as the non-send resource [`Backend`],
//! since real GPU backends are usually tied to the thread that created them.
//! [`headless::HeadlessBackend`] is a complete implementation without a GPU,
//! used by the demo binary and the tests.

pub mod headless;

use std::fmt;

use glam::Vec3;
use thiserror::Error;

use crate::components::collisionfilter::CollisionFilter;

/// Output surface a backend context is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    pub label: String,
    pub width: u32,
    pub height: u32,
}

impl Surface {
    pub fn new(label: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            label: label.into(),
            width,
            height,
        }
    }
}

/// Opaque handle to a built scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneHandle(pub u64);

/// Opaque handle to a physics body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u64);

impl fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body:{}", self.0)
    }
}

/// Opaque reference to a material/visual the backend knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AppearanceId(pub u32);

impl AppearanceId {
    /// Not drawn at all.
    pub const HIDDEN: AppearanceId = AppearanceId(0);
    pub const PLAYER: AppearanceId = AppearanceId(1);
    pub const BOSS: AppearanceId = AppearanceId(2);
    pub const PLAYER_BULLET: AppearanceId = AppearanceId(3);
    pub const ENEMY_BULLET: AppearanceId = AppearanceId(4);
    pub const SPHERE: AppearanceId = AppearanceId(5);
}

/// What the backend should put in a fresh scene graph.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneDescriptor {
    pub key: String,
    pub gravity: Vec3,
}

impl SceneDescriptor {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            gravity: Vec3::ZERO,
        }
    }
}

/// Collision shape of a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyShape {
    Sphere { radius: f32 },
}

/// Everything needed to create a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub shape: BodyShape,
    pub position: Vec3,
    pub filter: CollisionFilter,
    pub appearance: AppearanceId,
}

/// Contact-start notification between two bodies. No ordering guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContactPair {
    pub a: BodyHandle,
    pub b: BodyHandle,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("surface '{0}' is not supported by this backend")]
    UnsupportedSurface(String),
    #[error("no render context; call create_context first")]
    NoContext,
    #[error("backend resources have been released")]
    Released,
}

/// Operations the core needs from a rendering/physics engine.
///
/// Disposal-style calls (`dispose_scene`, `destroy_body`, `stop_loop`) must
/// tolerate unknown or already-released handles.
pub trait RenderBackend {
    fn create_context(&mut self, surface: &Surface) -> Result<(), BackendError>;
    fn build_scene_graph(&mut self, desc: &SceneDescriptor) -> Result<SceneHandle, BackendError>;
    fn dispose_scene(&mut self, scene: SceneHandle);
    /// Start presenting frames.
    fn run_loop(&mut self);
    fn stop_loop(&mut self);
    /// Present a blank frame.
    fn clear_surface(&mut self);
    fn resize(&mut self, width: u32, height: u32);

    fn create_body(&mut self, desc: &BodyDesc) -> Result<BodyHandle, BackendError>;
    fn destroy_body(&mut self, body: BodyHandle);
    fn move_body(&mut self, body: BodyHandle, position: Vec3);
    fn set_body_filter(&mut self, body: BodyHandle, filter: CollisionFilter);
    fn set_appearance(&mut self, body: BodyHandle, appearance: AppearanceId);
    fn appearance(&self, body: BodyHandle) -> Option<AppearanceId>;
    /// Contact-start pairs reported since the last call.
    fn drain_contacts(&mut self) -> Vec<ContactPair>;

    /// Release every native resource. Further calls may fail with [`BackendError::Released`].
    fn release(&mut self);
}

/// Non-send resource wrapping the active backend.
pub struct Backend(pub Box<dyn RenderBackend>);

impl Backend {
    pub fn new(inner: impl RenderBackend + 'static) -> Self {
        Backend(Box::new(inner))
    }
}

impl std::ops::Deref for Backend {
    type Target = dyn RenderBackend;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl std::ops::DerefMut for Backend {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0.as_mut()
    }
}
