//! Kinematic body component.
//!
//! The [`RigidBody`] component stores the velocity of an entity plus the
//! damping parameters used by steered movers such as the player ship.
//! Projectiles carry a plain body with no friction and no speed cap; their
//! velocity is fixed at spawn time.
//!
//! The `frozen` flag disables all movement calculations, which is how a
//! despawned combatant stays put while its record is kept for bookkeeping.

use bevy_ecs::prelude::Component;
use glam::Vec3;

/// Velocity plus the damping used by steered movers.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct RigidBody {
    /// Current velocity in world units per second.
    pub velocity: Vec3,
    /// Exponential damping rate (0.0 = no friction).
    pub friction: f32,
    /// Optional maximum speed. If set, velocity magnitude is clamped to this value.
    pub max_speed: Option<f32>,
    /// When true, movement systems skip all calculations for this entity.
    pub frozen: bool,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self::new()
    }
}

impl RigidBody {
    /// Create a RigidBody with zero velocity and no damping.
    pub fn new() -> Self {
        Self {
            velocity: Vec3::ZERO,
            friction: 0.0,
            max_speed: None,
            frozen: false,
        }
    }

    /// Create a RigidBody moving at a constant `velocity`.
    pub fn with_velocity(velocity: Vec3) -> Self {
        Self {
            velocity,
            ..Self::new()
        }
    }

    /// Create a RigidBody with damping parameters configured.
    ///
    /// # Arguments
    /// * `friction` - Exponential damping rate (the ship uses 4.0)
    /// * `max_speed` - Optional velocity magnitude limit
    pub fn with_physics(friction: f32, max_speed: Option<f32>) -> Self {
        Self {
            friction,
            max_speed,
            ..Self::new()
        }
    }

    /// Apply an acceleration for `dt` seconds, then damping and the speed cap.
    pub fn accelerate(&mut self, acceleration: Vec3, dt: f32) {
        self.velocity += acceleration * dt;
        if self.friction > 0.0 {
            self.velocity *= (-self.friction * dt).exp();
        }
        if let Some(max) = self.max_speed {
            let speed = self.velocity.length();
            if speed > max {
                self.velocity *= max / speed;
            }
        }
    }

    /// Stop the body dead.
    pub fn halt(&mut self) {
        self.velocity = Vec3::ZERO;
    }

    /// Pin the body in place; movement systems skip it from now on.
    pub fn freeze(&mut self) {
        self.halt();
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}
