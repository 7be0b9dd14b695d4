//! ECS resource that bridges the world with the host's audio engine.
//!
//! Use [`setup_audio`] once during initialization to insert the
//! [`AudioBridge`] and `Messages<AudioCmd>` resources. The returned receiver
//! belongs to the host, which feeds its audio engine from it.

use crate::events::audio::AudioCmd;
use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::trace;

/// Sending half of the audio channel.
///
/// Cloning the bridge clones the sender, which is how code living outside
/// the world (store callbacks) gets to play sounds.
#[derive(Resource, Clone)]
pub struct AudioBridge {
    /// Sender for [`AudioCmd`] messages (ECS -> host audio).
    pub tx_cmd: Sender<AudioCmd>,
}

impl AudioBridge {
    /// A bridge and the receiver the host should drain.
    pub fn channel() -> (AudioBridge, Receiver<AudioCmd>) {
        let (tx_cmd, rx_cmd) = unbounded::<AudioCmd>();
        (AudioBridge { tx_cmd }, rx_cmd)
    }

    /// Send a command; a host that dropped its receiver is ignored.
    pub fn send(&self, cmd: AudioCmd) {
        if let Err(e) = self.tx_cmd.send(cmd) {
            trace!("audio receiver gone, dropping {:?}", e.into_inner());
        }
    }
}

/// Register the bridge and the message queue systems write to.
pub fn setup_audio(world: &mut World, bridge: AudioBridge) {
    world.insert_resource(bridge);
    world.insert_resource(Messages::<AudioCmd>::default());
}
