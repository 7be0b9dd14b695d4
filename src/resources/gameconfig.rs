//! Combat configuration resource.
//!
//! Tunables of the combat scene loaded from an INI file. Every value has a
//! default, so a missing file or key is never fatal: callers log the error
//! and carry on with [`CombatConfig::new`].
//!
//! # Configuration File Format
//!
//! ```ini
//! [surface]
//! width = 1280
//! height = 720
//!
//! [player]
//! hp = 100
//! lives = 3
//! fire_cooldown = 0.2
//! invulnerability = 0.3
//!
//! [boss]
//! hp = 100
//! line_interval = 2.0
//! spiral_interval = 5.0
//!
//! [score]
//! enemy_hit_reward = 100
//! player_hit_penalty = 50
//! player_damage = 2.5
//! boss_damage = 10
//!
//! [projectiles]
//! size = 4
//! lifespan = 5.0
//! min_z = -10
//! max_z = 110
//! ```
//!
//! See `config.ini` at the repository root for every key.

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use glam::Vec3;
use log::{info, warn};
use std::path::PathBuf;

use crate::systems::combat::CombatRules;

const DEFAULT_CONFIG_PATH: &str = "./config.ini";

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    pub hp: f32,
    pub lives: u32,
    pub spawn: Vec3,
    /// Steering acceleration in units/s².
    pub acceleration: f32,
    /// Exponential damping rate.
    pub friction: f32,
    pub max_speed: f32,
    pub fire_cooldown: f32,
    pub invulnerability: f32,
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BossConfig {
    pub hp: f32,
    pub spawn: Vec3,
    pub line_interval: f32,
    pub line_count: u32,
    pub spiral_interval: f32,
    pub spiral_steps: u32,
    pub spiral_step_delay: f32,
    pub spiral_divisions: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreConfig {
    pub enemy_hit_reward: i64,
    pub player_hit_penalty: i64,
    /// Damage the player deals to the boss per hit.
    pub player_damage: f32,
    /// Damage the boss deals to the player per hit.
    pub boss_damage: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileConfig {
    pub size: f32,
    pub lifespan: f32,
    pub player_speed: f32,
    pub enemy_speed: f32,
    pub min_z: f32,
    pub max_z: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EffectsConfig {
    pub flash_duration: f32,
    pub flash_toggle: f32,
}

/// Combat configuration resource.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct CombatConfig {
    pub surface: SurfaceConfig,
    pub player: PlayerConfig,
    pub boss: BossConfig,
    pub score: ScoreConfig,
    pub projectiles: ProjectileConfig,
    pub effects: EffectsConfig,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CombatConfig {
    /// Create a configuration with the stock combat tuning.
    pub fn new() -> Self {
        Self {
            surface: SurfaceConfig {
                width: 1280,
                height: 720,
            },
            player: PlayerConfig {
                hp: 100.0,
                lives: 3,
                spawn: Vec3::new(0.0, 10.0, 5.0),
                acceleration: 200.0,
                friction: 4.0,
                max_speed: 60.0,
                fire_cooldown: 0.2,
                invulnerability: 0.3,
                min_x: -30.0,
                max_x: 30.0,
                min_z: 5.0,
                max_z: 50.0,
            },
            boss: BossConfig {
                hp: 100.0,
                spawn: Vec3::new(0.0, 10.0, 95.0),
                line_interval: 2.0,
                line_count: 7,
                spiral_interval: 5.0,
                spiral_steps: 48,
                spiral_step_delay: 0.02,
                spiral_divisions: 24,
            },
            score: ScoreConfig {
                enemy_hit_reward: 100,
                player_hit_penalty: 50,
                player_damage: 2.5,
                boss_damage: 10.0,
            },
            projectiles: ProjectileConfig {
                size: 4.0,
                lifespan: 5.0,
                player_speed: 80.0,
                enemy_speed: 40.0,
                min_z: -10.0,
                max_z: 110.0,
            },
            effects: EffectsConfig {
                flash_duration: 0.3,
                flash_toggle: 0.1,
            },
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Damage/score/invulnerability rules for the resolver.
    pub fn rules(&self) -> CombatRules {
        CombatRules {
            player_damage: self.score.player_damage,
            boss_damage: self.score.boss_damage,
            enemy_hit_reward: self.score.enemy_hit_reward,
            player_hit_penalty: self.score.player_hit_penalty,
            player_invulnerability: self.player.invulnerability,
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;

        let float = |section: &str, key: &str| {
            config
                .getfloat(section, key)
                .ok()
                .flatten()
                .map(|v| v as f32)
        };
        let uint = |section: &str, key: &str| config.getuint(section, key).ok().flatten();
        let int = |section: &str, key: &str| config.getint(section, key).ok().flatten();

        // [surface] section
        if let Some(v) = uint("surface", "width") {
            self.surface.width = v as u32;
        }
        if let Some(v) = uint("surface", "height") {
            self.surface.height = v as u32;
        }

        // [player] section
        let p = &mut self.player;
        set(&mut p.hp, float("player", "hp"));
        if let Some(v) = uint("player", "lives") {
            p.lives = v as u32;
        }
        set(&mut p.spawn.x, float("player", "spawn_x"));
        set(&mut p.spawn.y, float("player", "spawn_y"));
        set(&mut p.spawn.z, float("player", "spawn_z"));
        set(&mut p.acceleration, float("player", "acceleration"));
        set(&mut p.friction, float("player", "friction"));
        set(&mut p.max_speed, float("player", "max_speed"));
        set(&mut p.fire_cooldown, float("player", "fire_cooldown"));
        set(&mut p.invulnerability, float("player", "invulnerability"));
        set_range(
            (&mut p.min_x, &mut p.max_x),
            (float("player", "min_x"), float("player", "max_x")),
            "player x",
        );
        set_range(
            (&mut p.min_z, &mut p.max_z),
            (float("player", "min_z"), float("player", "max_z")),
            "player z",
        );

        // [boss] section
        let b = &mut self.boss;
        set(&mut b.hp, float("boss", "hp"));
        set(&mut b.spawn.x, float("boss", "spawn_x"));
        set(&mut b.spawn.y, float("boss", "spawn_y"));
        set(&mut b.spawn.z, float("boss", "spawn_z"));
        set(&mut b.line_interval, float("boss", "line_interval"));
        if let Some(v) = uint("boss", "line_count") {
            b.line_count = v as u32;
        }
        set(&mut b.spiral_interval, float("boss", "spiral_interval"));
        if let Some(v) = uint("boss", "spiral_steps") {
            b.spiral_steps = v as u32;
        }
        set(&mut b.spiral_step_delay, float("boss", "spiral_step_delay"));
        if let Some(v) = uint("boss", "spiral_divisions") {
            b.spiral_divisions = (v as u32).max(1);
        }

        // [score] section
        let s = &mut self.score;
        set(&mut s.enemy_hit_reward, int("score", "enemy_hit_reward"));
        set(&mut s.player_hit_penalty, int("score", "player_hit_penalty"));
        set(&mut s.player_damage, float("score", "player_damage"));
        set(&mut s.boss_damage, float("score", "boss_damage"));

        // [projectiles] section
        let pr = &mut self.projectiles;
        set(&mut pr.size, float("projectiles", "size"));
        set(&mut pr.lifespan, float("projectiles", "lifespan"));
        set(&mut pr.player_speed, float("projectiles", "player_speed"));
        set(&mut pr.enemy_speed, float("projectiles", "enemy_speed"));
        set_range(
            (&mut pr.min_z, &mut pr.max_z),
            (float("projectiles", "min_z"), float("projectiles", "max_z")),
            "projectile z",
        );

        // [effects] section
        set(&mut self.effects.flash_duration, float("effects", "flash_duration"));
        set(&mut self.effects.flash_toggle, float("effects", "flash_toggle"));

        info!(
            "Loaded combat config: player hp={} lives={}, boss hp={}, damage {}/{}, projectile lifespan={}s",
            self.player.hp,
            self.player.lives,
            self.boss.hp,
            self.score.player_damage,
            self.score.boss_damage,
            self.projectiles.lifespan
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();
        let mut put = |section: &str, key: &str, value: String| {
            config.set(section, key, Some(value));
        };

        put("surface", "width", self.surface.width.to_string());
        put("surface", "height", self.surface.height.to_string());

        let p = &self.player;
        put("player", "hp", p.hp.to_string());
        put("player", "lives", p.lives.to_string());
        put("player", "spawn_x", p.spawn.x.to_string());
        put("player", "spawn_y", p.spawn.y.to_string());
        put("player", "spawn_z", p.spawn.z.to_string());
        put("player", "acceleration", p.acceleration.to_string());
        put("player", "friction", p.friction.to_string());
        put("player", "max_speed", p.max_speed.to_string());
        put("player", "fire_cooldown", p.fire_cooldown.to_string());
        put("player", "invulnerability", p.invulnerability.to_string());
        put("player", "min_x", p.min_x.to_string());
        put("player", "max_x", p.max_x.to_string());
        put("player", "min_z", p.min_z.to_string());
        put("player", "max_z", p.max_z.to_string());

        let b = &self.boss;
        put("boss", "hp", b.hp.to_string());
        put("boss", "spawn_x", b.spawn.x.to_string());
        put("boss", "spawn_y", b.spawn.y.to_string());
        put("boss", "spawn_z", b.spawn.z.to_string());
        put("boss", "line_interval", b.line_interval.to_string());
        put("boss", "line_count", b.line_count.to_string());
        put("boss", "spiral_interval", b.spiral_interval.to_string());
        put("boss", "spiral_steps", b.spiral_steps.to_string());
        put("boss", "spiral_step_delay", b.spiral_step_delay.to_string());
        put("boss", "spiral_divisions", b.spiral_divisions.to_string());

        let s = &self.score;
        put("score", "enemy_hit_reward", s.enemy_hit_reward.to_string());
        put("score", "player_hit_penalty", s.player_hit_penalty.to_string());
        put("score", "player_damage", s.player_damage.to_string());
        put("score", "boss_damage", s.boss_damage.to_string());

        let pr = &self.projectiles;
        put("projectiles", "size", pr.size.to_string());
        put("projectiles", "lifespan", pr.lifespan.to_string());
        put("projectiles", "player_speed", pr.player_speed.to_string());
        put("projectiles", "enemy_speed", pr.enemy_speed.to_string());
        put("projectiles", "min_z", pr.min_z.to_string());
        put("projectiles", "max_z", pr.max_z.to_string());

        put("effects", "flash_duration", self.effects.flash_duration.to_string());
        put("effects", "flash_toggle", self.effects.flash_toggle.to_string());

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

/// Like [`set`] for a `[min, max]` pair; an inverted or non-finite result
/// keeps the current bounds.
fn set_range(slots: (&mut f32, &mut f32), values: (Option<f32>, Option<f32>), what: &str) {
    let (min, max) = slots;
    let lo = values.0.unwrap_or(*min);
    let hi = values.1.unwrap_or(*max);
    if lo.is_finite() && hi.is_finite() && lo <= hi {
        *min = lo;
        *max = hi;
    } else {
        warn!(
            "ignoring {} bounds [{}, {}], keeping [{}, {}]",
            what, lo, hi, min, max
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_keep_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("combat.ini");
        std::fs::write(&path, "[score]\nboss_damage = 12.5\n\n[player]\nlives = 5\n").unwrap();

        let mut config = CombatConfig::with_path(&path);
        config.load_from_file().unwrap();
        assert_eq!(config.score.boss_damage, 12.5);
        assert_eq!(config.player.lives, 5);
        assert_eq!(config.player.hp, 100.0);
        assert_eq!(config.projectiles.max_z, 110.0);
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("combat.ini");
        let mut config = CombatConfig::with_path(&path);
        config.boss.spiral_steps = 12;
        config.score.player_hit_penalty = 75;
        config.save_to_file().unwrap();

        let mut loaded = CombatConfig::with_path(&path);
        loaded.load_from_file().unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn inverted_bounds_keep_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("combat.ini");
        std::fs::write(
            &path,
            "[player]\nmin_x = 30\nmax_x = -30\nmax_z = 80\n\n[projectiles]\nmin_z = nan\n",
        )
        .unwrap();

        let mut config = CombatConfig::with_path(&path);
        config.load_from_file().unwrap();
        let defaults = CombatConfig::new();
        assert_eq!(config.player.min_x, defaults.player.min_x);
        assert_eq!(config.player.max_x, defaults.player.max_x);
        assert_eq!(config.player.max_z, 80.0);
        assert_eq!(config.projectiles.min_z, defaults.projectiles.min_z);
    }

    #[test]
    fn missing_file_is_an_error() {
        let mut config = CombatConfig::with_path("/nonexistent/combat.ini");
        assert!(config.load_from_file().is_err());
    }
}
