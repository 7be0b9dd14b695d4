//! ECS resources made available to systems.
//!
//! This module groups the long-lived data injected into the ECS world and
//! accessed by systems during execution: timing, the shared store, the
//! projectile and body registries, configuration and bridges to the host.
//!
//! Overview
//! - `audio` – channel bridge to the host's audio engine
//! - `bodymap` – body handle <-> entity lookup and pending body releases
//! - `bulletpool` – live projectile ids and single-shot retirement
//! - `gameconfig` – combat tuning loaded from an INI file
//! - `gamestate` – session flow states and the controller's flow inbox
//! - `input` – player steering intent
//! - `liveness` – cancellation tokens tying deferred work to a scene
//! - `scoreboard` – score, lives and terminal outcome
//! - `statestore` – shared key-value store contract and typed adapter
//! - `worldtime` – simulation time and delta
pub mod audio;
pub mod bodymap;
pub mod bulletpool;
pub mod gameconfig;
pub mod gamestate;
pub mod input;
pub mod liveness;
pub mod scoreboard;
pub mod statestore;
pub mod worldtime;
