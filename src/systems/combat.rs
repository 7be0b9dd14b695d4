//! Pure combat resolution.
//!
//! [`resolve_hit`] decides what a single projectile hit does to its target
//! and to the scoreboard. It takes the current state by reference and
//! returns the next state plus a list of [`CombatEffect`]s; it never touches
//! the world. The collision observer is the thin shim that applies the
//! result (writes components, the store, audio, despawns).
//!
//! Rules, in order:
//! 1. The projectile is always disposed, whatever else happens.
//! 2. After a terminal outcome, or against a dead target, nothing changes.
//! 3. An invulnerable target takes no damage.
//! 4. Otherwise damage and score change. The player also becomes
//!    invulnerable for a short window.
//! 5. At hp <= 0 the player loses a life and respawns, or, on the last life,
//!    despawns and the session is lost. The boss despawns and the session is
//!    won. A terminal outcome is produced at most once.

use smallvec::SmallVec;

use crate::components::combatant::{CombatantState, Side};
use crate::resources::scoreboard::{Outcome, Scoreboard};

/// Damage, score and invulnerability magnitudes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatRules {
    /// Damage the player's bullets deal to the boss.
    pub player_damage: f32,
    /// Damage the boss's bullets deal to the player.
    pub boss_damage: f32,
    pub enemy_hit_reward: i64,
    pub player_hit_penalty: i64,
    /// Invulnerability window after the player is hit, in seconds.
    pub player_invulnerability: f32,
}

/// A projectile hit on a combatant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub target: Side,
    /// World time of the contact.
    pub now: f32,
}

/// Side effects the dispatch shim must carry out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CombatEffect {
    DisposeProjectile,
    /// Zero the target's collision masks for the invulnerability window.
    SuppressMasks,
    Flash,
    Sound(&'static str),
    /// Move the target back to its spawn point at full hp.
    Respawn,
    /// Permanently remove the target from play.
    Despawn,
    /// The session just reached its terminal outcome.
    Terminal(Outcome),
}

pub type Effects = SmallVec<[CombatEffect; 8]>;

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub target: CombatantState,
    pub board: Scoreboard,
    pub effects: Effects,
}

impl Resolution {
    pub fn has(&self, effect: CombatEffect) -> bool {
        self.effects.contains(&effect)
    }

    /// True if hp or score changed.
    pub fn changed(&self, before: &CombatantState, board: &Scoreboard) -> bool {
        self.target.hp != before.hp || self.board.score != board.score
    }
}

pub fn resolve_hit(
    hit: &Hit,
    target: &CombatantState,
    board: &Scoreboard,
    rules: &CombatRules,
) -> Resolution {
    let mut next = *target;
    let mut next_board = *board;
    let mut effects = Effects::new();
    effects.push(CombatEffect::DisposeProjectile);

    if board.is_terminal() || !target.alive || target.is_invulnerable(hit.now) {
        return Resolution {
            target: next,
            board: next_board,
            effects,
        };
    }

    match hit.target {
        Side::Player => {
            next.hp -= rules.boss_damage;
            next_board.score -= rules.player_hit_penalty;
            effects.push(CombatEffect::Sound("hit_player"));
            effects.push(CombatEffect::Flash);
            if rules.player_invulnerability > 0.0 {
                next.arm_invulnerability(hit.now, rules.player_invulnerability);
                effects.push(CombatEffect::SuppressMasks);
            }

            if next.hp <= 0.0 {
                next_board.lives = next_board.lives.saturating_sub(1);
                if next_board.lives > 0 {
                    next.hp = next.max_hp;
                    next.arm_invulnerability(hit.now, rules.player_invulnerability);
                    effects.push(CombatEffect::Respawn);
                } else {
                    next.alive = false;
                    next.invulnerable = false;
                    next_board.outcome = Some(Outcome::Lose);
                    effects.push(CombatEffect::Despawn);
                    effects.push(CombatEffect::Terminal(Outcome::Lose));
                }
            }
        }
        Side::Enemy => {
            next.hp -= rules.player_damage;
            next_board.score += rules.enemy_hit_reward;
            effects.push(CombatEffect::Sound("hit_enemy"));
            effects.push(CombatEffect::Flash);

            if next.hp <= 0.0 {
                next.alive = false;
                next_board.outcome = Some(Outcome::Win);
                effects.push(CombatEffect::Despawn);
                effects.push(CombatEffect::Terminal(Outcome::Win));
            }
        }
    }

    Resolution {
        target: next,
        board: next_board,
        effects,
    }
}
