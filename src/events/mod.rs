//! Event and message types exchanged between systems.
//!
//! - `audio` – fire-and-forget commands for the host's audio engine
//! - `collision` – a valid contact between two scene entities
pub mod audio;
pub mod collision;
