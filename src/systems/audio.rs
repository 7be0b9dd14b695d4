//! Systems that move [`AudioCmd`](crate::events::audio::AudioCmd) messages
//! out of the world.
//!
//! Systems write audio commands as ECS messages during the tick. At the end
//! of the tick [`update_bevy_audio_cmds`] advances the message queue and
//! [`forward_audio_cmds`] sends everything written so far to the host over
//! the [`AudioBridge`] channel.

use crate::events::audio::AudioCmd;
use crate::resources::audio::AudioBridge;
use bevy_ecs::prelude::{MessageReader, Messages, Res, ResMut};

/// Forward ECS AudioCmd messages to the host via the AudioBridge sender.
pub fn forward_audio_cmds(bridge: Res<AudioBridge>, mut reader: MessageReader<AudioCmd>) {
    for cmd in reader.read() {
        bridge.send(cmd.clone());
    }
}

/// Advance the ECS message queue for AudioCmd so same-frame readers can observe writes.
pub fn update_bevy_audio_cmds(mut msgs: ResMut<Messages<AudioCmd>>) {
    msgs.update();
}
