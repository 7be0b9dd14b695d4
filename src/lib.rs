//! Session lifecycle and combat core for a 3D shoot-'em-up.
//!
//! The crate hosts one scene at a time in a `bevy_ecs` world owned by the
//! [`SessionController`]. Rendering and physics are reached only through the
//! [`RenderBackend`](backend::RenderBackend) trait, the UI only through the
//! injected [`StateStore`](resources::statestore::StateStore), and audio only
//! through the [`AudioBridge`](resources::audio::AudioBridge) channel.
//!
//! # Project Structure
//!
//! - [`backend`] – backend trait, opaque handles and the headless backend
//! - [`components`] – ECS components (combatants, projectiles, masks, cooldowns, etc.)
//! - [`events`] – collision event and audio messages
//! - [`game`] – built-in scene builders
//! - [`resources`] – ECS resources (store adapter, bullet pool, config, etc.)
//! - [`scene`] – scene options, sessions, registry and rollback
//! - [`session`] – the lifecycle controller
//! - [`systems`] – per-frame systems and the pure combat resolver

pub mod backend;
pub mod components;
pub mod events;
pub mod game;
pub mod resources;
pub mod scene;
pub mod session;
pub mod systems;

pub use scene::{SceneOptions, SceneRegistry, ShmupOptions, ShowcaseOptions};
pub use session::{ControllerState, SessionController, SessionError, SwitchOutcome};
