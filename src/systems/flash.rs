//! Hit flash effect driver.
//!
//! Toggles the appearance of flashing bodies between their original look
//! and [`AppearanceId::HIDDEN`], and puts the original back when the effect
//! ends. Bodies whose entity lost its [`Body`] (released on death) simply
//! finish their effect without touching the backend.

use bevy_ecs::prelude::*;

use crate::backend::{AppearanceId, Backend};
use crate::components::body::Body;
use crate::components::flash::{Flash, TransientEffect};
use crate::resources::worldtime::WorldTime;

pub fn update_flash_effects(
    mut query: Query<(&mut Flash, Option<&Body>)>,
    mut backend: NonSendMut<Backend>,
    time: Res<WorldTime>,
) {
    let now = time.elapsed;
    for (mut flash, body) in query.iter_mut() {
        let TransientEffect::Flashing {
            until,
            next_toggle,
            toggle_every,
            visible,
            original,
        } = flash.0
        else {
            continue;
        };

        if now >= until {
            if let Some(body) = body {
                backend.set_appearance(body.0, original);
            }
            flash.0 = TransientEffect::None;
            continue;
        }

        if now >= next_toggle {
            let visible = !visible;
            if let Some(body) = body {
                let look = if visible { original } else { AppearanceId::HIDDEN };
                backend.set_appearance(body.0, look);
            }
            flash.0 = TransientEffect::Flashing {
                until,
                next_toggle: next_toggle + toggle_every,
                toggle_every,
                visible,
                original,
            };
        }
    }
}
