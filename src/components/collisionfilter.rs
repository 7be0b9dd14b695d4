//! Collision group membership and filtering.
//!
//! Every collidable entity declares two bitmasks:
//! - `membership` – what the entity *is* (one or more [`CollisionGroups`])
//! - `collide` – what the entity may be hit by
//!
//! Two entities interact only if each one's `collide` mask includes the
//! other's `membership`. The rule is checked in both directions, so a
//! one-sided interest never produces a combat event.
//!
//! Combatants temporarily zero both masks while invulnerable; the original
//! masks are kept in the component so they can be restored later.

use bevy_ecs::prelude::Component;
use bitflags::bitflags;

bitflags! {
    /// Bit-flag entity categories.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CollisionGroups: u32 {
        const PLAYER = 1 << 0;
        const ENEMY = 1 << 1;
        const PLAYER_BULLET = 1 << 2;
        const ENEMY_BULLET = 1 << 3;
    }
}

/// Membership/collide masks attached to a collidable entity.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionFilter {
    pub membership: CollisionGroups,
    pub collide: CollisionGroups,
    /// Masks saved by [`CollisionFilter::suppress`], restored by [`CollisionFilter::restore`].
    saved: Option<(CollisionGroups, CollisionGroups)>,
}

impl CollisionFilter {
    pub fn new(membership: CollisionGroups, collide: CollisionGroups) -> Self {
        Self {
            membership,
            collide,
            saved: None,
        }
    }

    /// Filter for the player ship: hit by enemy bullets only.
    pub fn player() -> Self {
        Self::new(CollisionGroups::PLAYER, CollisionGroups::ENEMY_BULLET)
    }

    /// Filter for the boss: hit by player bullets only.
    pub fn enemy() -> Self {
        Self::new(CollisionGroups::ENEMY, CollisionGroups::PLAYER_BULLET)
    }

    pub fn player_bullet() -> Self {
        Self::new(CollisionGroups::PLAYER_BULLET, CollisionGroups::ENEMY)
    }

    pub fn enemy_bullet() -> Self {
        Self::new(CollisionGroups::ENEMY_BULLET, CollisionGroups::PLAYER)
    }

    /// True if `self` and `other` may interact (asymmetric rule, both directions).
    pub fn allows(&self, other: &CollisionFilter) -> bool {
        self.collide.intersects(other.membership) && other.collide.intersects(self.membership)
    }

    /// Zero both masks, remembering the originals. Repeated calls keep the first saved pair.
    pub fn suppress(&mut self) {
        if self.saved.is_none() {
            self.saved = Some((self.membership, self.collide));
        }
        self.membership = CollisionGroups::empty();
        self.collide = CollisionGroups::empty();
    }

    /// Restore the masks saved by [`CollisionFilter::suppress`]. No-op if nothing is saved.
    pub fn restore(&mut self) {
        if let Some((membership, collide)) = self.saved.take() {
            self.membership = membership;
            self.collide = collide;
        }
    }

    pub fn is_suppressed(&self) -> bool {
        self.saved.is_some()
    }

    /// The masks the entity was created with, ignoring any suppression.
    pub fn declared(&self) -> CollisionFilter {
        match self.saved {
            Some((membership, collide)) => CollisionFilter::new(membership, collide),
            None => CollisionFilter::new(self.membership, self.collide),
        }
    }

    /// Like [`CollisionFilter::allows`] but on the declared masks.
    ///
    /// Contacts already reported by the backend before a suppression took
    /// effect are judged on what the entities are, not on their current
    /// invulnerable masks.
    pub fn allows_declared(&self, other: &CollisionFilter) -> bool {
        self.declared().allows(&other.declared())
    }
}
