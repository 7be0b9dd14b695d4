//! Cooperative cancellation tokens.
//!
//! Each built scene gets a fresh [`LivenessToken`]. Anything that acts later
//! on behalf of the scene (spawn sequences, store callbacks) holds a clone
//! and checks it before acting. Clearing the scene invalidates the token,
//! and every clone observes it on its next check.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bevy_ecs::prelude::Resource;

#[derive(Debug, Clone)]
pub struct LivenessToken(Arc<AtomicBool>);

impl Default for LivenessToken {
    fn default() -> Self {
        Self::new()
    }
}

impl LivenessToken {
    /// A new live token.
    pub fn new() -> Self {
        LivenessToken(Arc::new(AtomicBool::new(true)))
    }

    /// A token that is already dead. Used before any scene exists.
    pub fn dead() -> Self {
        LivenessToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn invalidate(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Token of the scene currently hosted by the world. Dead when there is none.
#[derive(Resource, Debug, Clone)]
pub struct SceneToken(pub LivenessToken);

impl Default for SceneToken {
    fn default() -> Self {
        SceneToken(LivenessToken::dead())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_observe_invalidation() {
        let token = LivenessToken::new();
        let held = token.clone();
        assert!(held.is_alive());
        token.invalidate();
        assert!(!held.is_alive());
        assert!(!LivenessToken::dead().is_alive());
    }
}
