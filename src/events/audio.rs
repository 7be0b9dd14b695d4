//! Audio commands.
//!
//! Audio is fire-and-forget: systems write [`AudioCmd`] messages and the end
//! of the tick forwards them to whatever audio engine the host runs, through
//! the [`AudioBridge`](crate::resources::audio::AudioBridge) channel.

use bevy_ecs::message::Message;

/// Commands sent *to* the host's audio engine.
#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub enum AudioCmd {
    /// Play a sound or music track by key.
    Play { id: String, looped: bool },
    Stop { id: String },
    /// Silence everything. Sent when a scene is cleared.
    StopAll,
}

impl AudioCmd {
    /// One-shot effect.
    pub fn fx(id: &str) -> Self {
        AudioCmd::Play {
            id: id.to_string(),
            looped: false,
        }
    }

    pub fn music(id: &str, looped: bool) -> Self {
        AudioCmd::Play {
            id: id.to_string(),
            looped,
        }
    }

    pub fn stop(id: &str) -> Self {
        AudioCmd::Stop { id: id.to_string() }
    }
}
