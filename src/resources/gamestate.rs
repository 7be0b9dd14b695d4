//! High-level game flow states and the controller's flow inbox.
//!
//! [`GameStates`] mirrors the `gameState` key of the shared store. The UI
//! drives the session by writing that key; the controller's store
//! subscriptions push a [`FlowSignal`] into its [`FlowInbox`], and the
//! controller applies queued signals at the start of the next frame, never
//! in the middle of a tick.
//!
//! Writes the controller makes itself are done with the inbox muted so they
//! do not come back around as new signals.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Discrete high-level states of a play session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameStates {
    #[default]
    MainMenu,
    Begin,
    Start,
    Stop,
    Playing,
    Win,
    Lose,
    Reset,
    Clear,
}

impl GameStates {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStates::MainMenu => "main-menu",
            GameStates::Begin => "begin",
            GameStates::Start => "start",
            GameStates::Stop => "stop",
            GameStates::Playing => "playing",
            GameStates::Win => "win",
            GameStates::Lose => "lose",
            GameStates::Reset => "reset",
            GameStates::Clear => "clear",
        }
    }

    pub fn from_value(value: &Value) -> Option<GameStates> {
        serde_json::from_value(value.clone()).ok()
    }

    pub fn to_value(self) -> Value {
        Value::String(self.as_str().to_string())
    }

    /// States in which a scene session may be active.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            GameStates::Begin
                | GameStates::Start
                | GameStates::Playing
                | GameStates::Win
                | GameStates::Lose
        )
    }

    /// States in which a freshly switched scene starts rendering right away.
    pub fn starts_render(&self) -> bool {
        matches!(self, GameStates::Begin | GameStates::Start | GameStates::Playing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GameStates::Win | GameStates::Lose)
    }
}

/// A store change the controller reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowSignal {
    GameState(GameStates),
    Scene(String),
    /// `gameOpts` was written; the new value is read back from the store.
    Options,
}

/// Queue between store callbacks and the controller.
#[derive(Debug, Default)]
pub struct FlowInbox {
    queue: Mutex<VecDeque<FlowSignal>>,
    muted: AtomicBool,
}

/// Restores the previous mute state on drop.
pub struct MuteGuard<'a> {
    inbox: &'a FlowInbox,
    was_muted: bool,
}

impl Drop for MuteGuard<'_> {
    fn drop(&mut self) {
        self.inbox.muted.store(self.was_muted, Ordering::Release);
    }
}

impl FlowInbox {
    fn queue(&self) -> MutexGuard<'_, VecDeque<FlowSignal>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a signal unless the inbox is muted.
    pub fn push(&self, signal: FlowSignal) {
        if self.is_muted() {
            return;
        }
        self.queue().push_back(signal);
    }

    pub fn pop(&self) -> Option<FlowSignal> {
        self.queue().pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue().is_empty()
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Acquire)
    }

    /// Mute the inbox until the returned guard is dropped.
    pub fn mute(&self) -> MuteGuard<'_> {
        let was_muted = self.muted.swap(true, Ordering::AcqRel);
        MuteGuard {
            inbox: self,
            was_muted,
        }
    }
}
