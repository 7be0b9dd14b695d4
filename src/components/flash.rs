//! Hit flash transient effect.
//!
//! A flashing body alternates between visible and hidden every
//! `toggle_every` seconds until `until`, then gets its original appearance
//! back. Starting a flash while one is already running is ignored, so a
//! burst of hits never stacks effects or loses the original look.

use bevy_ecs::prelude::Component;

use crate::backend::AppearanceId;

/// Per-entity transient effect state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TransientEffect {
    #[default]
    None,
    Flashing {
        until: f32,
        next_toggle: f32,
        toggle_every: f32,
        visible: bool,
        original: AppearanceId,
    },
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct Flash(pub TransientEffect);

impl Flash {
    pub fn is_flashing(&self) -> bool {
        matches!(self.0, TransientEffect::Flashing { .. })
    }

    /// Begin flashing; the first toggle (hide) is due immediately.
    /// Returns false (and changes nothing) if already flashing.
    pub fn start(&mut self, now: f32, duration: f32, toggle_every: f32, original: AppearanceId) -> bool {
        if self.is_flashing() {
            return false;
        }
        self.0 = TransientEffect::Flashing {
            until: now + duration,
            next_toggle: now,
            toggle_every,
            visible: true,
            original,
        };
        true
    }
}
