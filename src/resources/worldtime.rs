//! Simulation clock.
//!
//! Every timed rule of the combat core (cooldowns, invulnerability windows,
//! hit flashes, projectile lifespans, spawn sequences) compares stamps taken
//! from [`WorldTime::elapsed`]. The clock only moves while the render loop
//! runs, so a stopped session freezes all of them together.

use bevy_ecs::prelude::Resource;

/// Simulation clock shared by every system of the tick.
///
/// `elapsed` is the scaled time since the controller was created; it keeps
/// running across scenes so stamps taken in one scene never collide with
/// those of the next.
#[derive(Resource, Clone, Copy, Debug)]
pub struct WorldTime {
    pub elapsed: f32,
    /// Scaled length of the current tick.
    pub delta: f32,
    pub time_scale: f32,
    /// Ticks run so far.
    pub ticks: u64,
}

impl Default for WorldTime {
    fn default() -> Self {
        Self::starting_at(0.0)
    }
}

impl WorldTime {
    /// A clock that already reads `elapsed` seconds.
    pub fn starting_at(elapsed: f32) -> Self {
        Self {
            elapsed,
            delta: 0.0,
            time_scale: 1.0,
            ticks: 0,
        }
    }

    /// Move the clock forward by one host frame of `dt` unscaled seconds.
    ///
    /// Negative or non-finite deltas count as an empty tick so a bad host
    /// clock cannot rewind cooldowns.
    pub fn advance(&mut self, dt: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.delta = dt * self.time_scale;
        self.elapsed += self.delta;
        self.ticks += 1;
    }
}
