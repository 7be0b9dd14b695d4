//! Session score, lives and terminal outcome.
//!
//! The scoreboard is the authoritative copy of the numbers the store mirrors
//! for the UI. Its `outcome` is set once, on the hit that ends the game;
//! while it is set the combat resolver leaves hp and score alone.

use std::time::{SystemTime, UNIX_EPOCH};

use bevy_ecs::prelude::Resource;

use crate::resources::gamestate::GameStates;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Win,
    Lose,
}

impl Outcome {
    pub fn game_state(&self) -> GameStates {
        match self {
            Outcome::Win => GameStates::Win,
            Outcome::Lose => GameStates::Lose,
        }
    }

    /// The outcome a terminal `gameState` stands for.
    pub fn from_game_state(state: GameStates) -> Option<Outcome> {
        match state {
            GameStates::Win => Some(Outcome::Win),
            GameStates::Lose => Some(Outcome::Lose),
            _ => None,
        }
    }

    /// Music the scene plays once this outcome is reached.
    pub fn music(&self) -> &'static str {
        match self {
            Outcome::Win => "win_music",
            Outcome::Lose => "lose_music",
        }
    }
}

#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Scoreboard {
    pub score: i64,
    pub lives: u32,
    pub outcome: Option<Outcome>,
}

impl Scoreboard {
    pub fn new(lives: u32) -> Self {
        Self {
            score: 0,
            lives,
            outcome: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }
}

/// Milliseconds since the unix epoch, used as `scoreHistory` keys.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
