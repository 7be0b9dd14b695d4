//! Expiry policies for pooled projectiles.
//!
//! A projectile expires when it is older than its lifespan ([`Ttl`]) or when
//! its position leaves its spatial window ([`Bounds`]). Both are checked by
//! [`crate::systems::ttl::sweep_projectiles`], which retires expired
//! projectiles through the pool so each id is disposed once.

use bevy_ecs::prelude::Component;
use glam::Vec3;

/// Fixed lifespan measured from the spawn time.
///
/// Unlike a countdown, the birth stamp never changes, so the age check is
/// independent of frame timing.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Ttl {
    /// World time (seconds) at spawn.
    pub born_at: f32,
    /// Lifespan in seconds.
    pub lifespan: f32,
}

impl Ttl {
    pub fn new(born_at: f32, lifespan: f32) -> Self {
        Ttl { born_at, lifespan }
    }

    pub fn expired(&self, now: f32) -> bool {
        now - self.born_at > self.lifespan
    }
}

/// Axis-aligned spatial window. Use infinities for unbounded axes.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    /// Bounded on z only, the scroll axis of the playfield.
    pub fn z_range(min_z: f32, max_z: f32) -> Self {
        Self {
            min: Vec3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, min_z),
            max: Vec3::new(f32::INFINITY, f32::INFINITY, max_z),
        }
    }

    pub fn contains(&self, pos: Vec3) -> bool {
        pos.cmpge(self.min).all() && pos.cmple(self.max).all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_expires_strictly_after_lifespan() {
        let ttl = Ttl::new(2.0, 5.0);
        assert!(!ttl.expired(7.0));
        assert!(ttl.expired(7.01));
    }

    #[test]
    fn z_range_ignores_x_and_y() {
        let bounds = Bounds::z_range(-10.0, 110.0);
        assert!(bounds.contains(Vec3::new(1e6, -1e6, 0.0)));
        assert!(!bounds.contains(Vec3::new(0.0, 0.0, 110.5)));
        assert!(!bounds.contains(Vec3::new(0.0, 0.0, -10.5)));
    }
}
