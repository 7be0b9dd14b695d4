//! Cancellable multi-step spawn sequences.
//!
//! A [`SpawnSequence`] lives on its own entity and emits one projectile per
//! step, `interval` seconds apart. Before each step it checks its
//! [`LivenessToken`]; once the owning scene invalidates the token the
//! sequence despawns itself without emitting anything else. It also stops
//! when its emitter is no longer alive.

use bevy_ecs::prelude::{Component, Entity};

use crate::resources::liveness::LivenessToken;

/// Shape of the volley a sequence emits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SequencePattern {
    /// Step `i` leaves at angle `TAU * i / divisions + now`, in the XZ plane.
    Spiral { divisions: u32, speed: f32 },
}

#[derive(Component, Debug, Clone)]
pub struct SpawnSequence {
    pub emitter: Entity,
    pub pattern: SequencePattern,
    pub step: u32,
    pub total: u32,
    pub interval: f32,
    /// World time of the next step.
    pub next_at: f32,
    pub token: LivenessToken,
}

impl SpawnSequence {
    /// A spiral burst whose first step fires at `now`.
    pub fn spiral(
        emitter: Entity,
        now: f32,
        steps: u32,
        interval: f32,
        divisions: u32,
        speed: f32,
        token: LivenessToken,
    ) -> Self {
        Self {
            emitter,
            pattern: SequencePattern::Spiral { divisions, speed },
            step: 0,
            total: steps,
            interval,
            next_at: now,
            token,
        }
    }

    pub fn finished(&self) -> bool {
        self.step >= self.total
    }

    /// True if a step is due at `now`.
    pub fn due(&self, now: f32) -> bool {
        !self.finished() && now >= self.next_at
    }

    /// Stop emitting; the sequence reads as finished from now on.
    pub fn cancel(&mut self) {
        self.step = self.total;
    }

    /// Mark the current step as emitted and schedule the next one.
    pub fn advance(&mut self) {
        self.step += 1;
        self.next_at += self.interval;
    }
}
