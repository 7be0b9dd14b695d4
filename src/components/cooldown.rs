//! Fixed-interval gates for repeated actions.
//!
//! [`can_fire`] is the raw predicate; [`Cooldown::try_fire`] adds "fire and
//! stamp" semantics: it succeeds at most once per interval and records the
//! firing time on success.
//!
//! A cooldown that has never fired is *unprimed* and lets the first attempt
//! through immediately (the player's gun). Calling [`Cooldown::primed`]
//! instead stamps it at creation so the first shot waits a full interval
//! (the boss patterns).

use bevy_ecs::prelude::Component;

/// True if an action last fired at `last_fired_at` may fire again at `now`.
///
/// `None` means the action has never fired.
pub fn can_fire(last_fired_at: Option<f32>, now: f32, interval: f32) -> bool {
    match last_fired_at {
        None => true,
        Some(last) => now - last >= interval,
    }
}

/// A single fire-and-stamp gate.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Cooldown {
    pub interval: f32,
    pub last_fired: Option<f32>,
}

impl Cooldown {
    /// An unprimed cooldown; the first attempt succeeds.
    pub fn new(interval: f32) -> Self {
        Self {
            interval,
            last_fired: None,
        }
    }

    /// A cooldown stamped at `now`; the first attempt succeeds at `now + interval`.
    pub fn primed(interval: f32, now: f32) -> Self {
        Self {
            interval,
            last_fired: Some(now),
        }
    }

    pub fn ready(&self, now: f32) -> bool {
        can_fire(self.last_fired, now, self.interval)
    }

    /// Fire if ready, stamping `now` on success.
    pub fn try_fire(&mut self, now: f32) -> bool {
        if self.ready(now) {
            self.last_fired = Some(now);
            true
        } else {
            false
        }
    }
}

/// The boss's two attack patterns, each with its own gate.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct BossPatterns {
    /// Straight line volley.
    pub line: Cooldown,
    /// Radial burst driven by a spawn sequence.
    pub spiral: Cooldown,
}
