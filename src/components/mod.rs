//! ECS components for scene entities.
//!
//! This module groups the data attached to entities living in the active
//! scene: combatants, pooled projectiles, their physics bodies and the
//! timers and effects hanging off them.
//!
//! Submodules overview:
//! - [`body`] – link from an entity to its backend body and appearance
//! - [`collisionfilter`] – membership/collide bitmasks and the pairing rule
//! - [`combatant`] – sides, per-actor hp/liveness record and spawn points
//! - [`cooldown`] – fire-and-stamp gates for weapons and boss patterns
//! - [`flash`] – hit flash transient effect state machine
//! - [`mapposition`] – world-space position (pivot) for an entity
//! - [`persistent`] – marker for entities that survive scene teardown
//! - [`projectile`] – pooled projectile id and owner
//! - [`rigidbody`] – kinematic body storing velocity and damping
//! - [`spawnsequence`] – cancellable multi-step spawn bursts
//! - [`ttl`] – lifespan and spatial expiry policies

pub mod body;
pub mod collisionfilter;
pub mod combatant;
pub mod cooldown;
pub mod flash;
pub mod mapposition;
pub mod persistent;
pub mod projectile;
pub mod rigidbody;
pub mod spawnsequence;
pub mod ttl;
