//! Shared state store contract and the typed adapter the core writes through.
//!
//! The UI observes the session through a key-value store with subscription
//! callbacks. The store is an external collaborator: the core is handed a
//! `Box<dyn StateStore>` at construction and only reads and writes keys.
//!
//! [`MemoryStore`] is the reference implementation. It can mirror a subset
//! of keys to a JSON file and restores them when created, which is the
//! "persist on write, restore at start" behaviour the UI relies on for score
//! history.
//!
//! # Consistency
//!
//! `set_state` applies the whole patch before any subscriber runs, so an
//! observer of `score` never sees the old `playerHP` next to the new score.
//! Code that changes related fields builds one [`StatePatch`] and applies it
//! with a single [`SharedState::apply`].

use std::fs;
use std::path::{Path, PathBuf};

use bevy_ecs::prelude::Resource;
use log::{debug, warn};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::resources::gamestate::GameStates;

/// Well-known store keys.
pub mod keys {
    pub const SCORE: &str = "score";
    pub const LIVES: &str = "lives";
    pub const PLAYER_HP: &str = "playerHP";
    pub const BOSS_HP: &str = "bossHP";
    pub const PLAYER_DAMAGE: &str = "playerDamage";
    pub const BOSS_DAMAGE: &str = "bossDamage";
    pub const GAME_STATE: &str = "gameState";
    pub const GAME_SCENE: &str = "gameScene";
    pub const GAME_OPTS: &str = "gameOpts";
    pub const SCORE_HISTORY: &str = "scoreHistory";
    pub const PROGRESS: &str = "progress";
    pub const USER_ID: &str = "userId";
}

/// Keys mirrored to durable storage by default.
pub const PERSISTED_KEYS: [&str; 3] = [keys::SCORE_HISTORY, keys::PROGRESS, keys::USER_ID];

/// Subscription handle returned by [`StateStore::subscribe_event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

pub type StoreCallback = Box<dyn FnMut(&Value) + Send + Sync>;

/// Key-value store with per-key subscriptions.
pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;

    /// Apply every entry of `patch`, then notify subscribers of the touched keys.
    fn set_state(&mut self, patch: Map<String, Value>);

    fn set_value(&mut self, key: &str, value: Value) {
        let mut patch = Map::new();
        patch.insert(key.to_string(), value);
        self.set_state(patch);
    }

    /// Call `callback` with the new value every time `key` is written.
    fn subscribe_event(&mut self, key: &str, callback: StoreCallback) -> SubscriptionId;

    /// Returns false if `id` was not subscribed.
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
}

struct Subscriber {
    id: SubscriptionId,
    key: String,
    callback: StoreCallback,
}

struct Persistence {
    path: PathBuf,
    keys: Vec<String>,
}

/// In-memory store with optional JSON persistence of selected keys.
pub struct MemoryStore {
    values: Map<String, Value>,
    subscribers: Vec<Subscriber>,
    next_subscription: u64,
    persistence: Option<Persistence>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Store seeded with the session defaults.
    pub fn new() -> Self {
        let mut values = Map::new();
        values.insert(keys::GAME_STATE.into(), GameStates::MainMenu.to_value());
        values.insert(keys::GAME_SCENE.into(), Value::from("shmup"));
        values.insert(keys::GAME_OPTS.into(), Value::Null);
        values.insert(keys::USER_ID.into(), Value::from("player1"));
        Self {
            values,
            subscribers: Vec::new(),
            next_subscription: 0,
            persistence: None,
        }
    }

    /// Store that mirrors [`PERSISTED_KEYS`] to `path`, restoring them now.
    pub fn persistent(path: impl Into<PathBuf>) -> Self {
        Self::new().with_persistence(path, PERSISTED_KEYS.iter().map(|k| k.to_string()).collect())
    }

    /// Mirror `keys` to `path`. Values found in the file replace the defaults.
    pub fn with_persistence(mut self, path: impl Into<PathBuf>, keys: Vec<String>) -> Self {
        let persistence = Persistence {
            path: path.into(),
            keys,
        };
        self.restore(&persistence);
        self.persistence = Some(persistence);
        self
    }

    fn restore(&mut self, persistence: &Persistence) {
        let text = match fs::read_to_string(&persistence.path) {
            Ok(text) => text,
            Err(e) => {
                debug!(
                    "no persisted state at {}: {}",
                    persistence.path.display(),
                    e
                );
                return;
            }
        };
        match serde_json::from_str::<Map<String, Value>>(&text) {
            Ok(saved) => {
                for key in &persistence.keys {
                    if let Some(value) = saved.get(key) {
                        self.values.insert(key.clone(), value.clone());
                    }
                }
                debug!("restored persisted state from {}", persistence.path.display());
            }
            Err(e) => warn!(
                "ignoring unreadable state file {}: {}",
                persistence.path.display(),
                e
            ),
        }
    }

    fn persist(&self, persistence: &Persistence) {
        let mut out = Map::new();
        for key in &persistence.keys {
            if let Some(value) = self.values.get(key) {
                out.insert(key.clone(), value.clone());
            }
        }
        if let Err(e) = write_json(&persistence.path, &out) {
            warn!("failed to persist state to {}: {}", persistence.path.display(), e);
        }
    }
}

fn write_json(path: &Path, value: &impl Serialize) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    fs::write(path, text).map_err(|e| e.to_string())
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set_state(&mut self, patch: Map<String, Value>) {
        let touched: Vec<String> = patch.keys().cloned().collect();
        for (key, value) in patch {
            self.values.insert(key, value);
        }

        if let Some(persistence) = &self.persistence
            && touched.iter().any(|k| persistence.keys.contains(k))
        {
            self.persist(persistence);
        }

        for key in &touched {
            let Some(value) = self.values.get(key) else {
                continue;
            };
            for sub in self.subscribers.iter_mut().filter(|s| &s.key == key) {
                (sub.callback)(value);
            }
        }
    }

    fn subscribe_event(&mut self, key: &str, callback: StoreCallback) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.subscribers.push(Subscriber {
            id,
            key: key.to_string(),
            callback,
        });
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }
}

/// Batch of related writes, applied with one `set_state` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatePatch(Map<String, Value>);

impl StatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn score(self, score: i64) -> Self {
        self.value(keys::SCORE, score)
    }

    pub fn lives(self, lives: u32) -> Self {
        self.value(keys::LIVES, lives)
    }

    pub fn player_hp(self, hp: f32) -> Self {
        self.value(keys::PLAYER_HP, hp as f64)
    }

    pub fn boss_hp(self, hp: f32) -> Self {
        self.value(keys::BOSS_HP, hp as f64)
    }

    pub fn game_state(self, state: GameStates) -> Self {
        self.value(keys::GAME_STATE, state.to_value())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

/// The injected store, as a world resource, with typed accessors.
#[derive(Resource)]
pub struct SharedState {
    store: Box<dyn StateStore>,
}

impl SharedState {
    pub fn new(store: Box<dyn StateStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn StateStore {
        self.store.as_ref()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.store.get(key)
    }

    pub fn apply(&mut self, patch: StatePatch) {
        if !patch.is_empty() {
            self.store.set_state(patch.into_map());
        }
    }

    pub fn subscribe(&mut self, key: &str, callback: StoreCallback) -> SubscriptionId {
        self.store.subscribe_event(key, callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    pub fn game_state(&self) -> Option<GameStates> {
        self.get(keys::GAME_STATE)
            .as_ref()
            .and_then(GameStates::from_value)
    }

    pub fn game_scene(&self) -> Option<String> {
        self.get(keys::GAME_SCENE)
            .and_then(|v| v.as_str().map(str::to_string))
    }

    pub fn score(&self) -> Option<i64> {
        self.get(keys::SCORE).and_then(|v| v.as_i64())
    }

    pub fn lives(&self) -> Option<u32> {
        self.get(keys::LIVES)
            .and_then(|v| v.as_u64())
            .map(|l| l as u32)
    }

    pub fn player_hp(&self) -> Option<f32> {
        self.get(keys::PLAYER_HP)
            .and_then(|v| v.as_f64())
            .map(|hp| hp as f32)
    }

    pub fn boss_hp(&self) -> Option<f32> {
        self.get(keys::BOSS_HP)
            .and_then(|v| v.as_f64())
            .map(|hp| hp as f32)
    }

    /// Score history as `timestamp -> score`. Missing or malformed is empty.
    pub fn score_history(&self) -> Map<String, Value> {
        match self.get(keys::SCORE_HISTORY) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// A patch entry appending `score` to the history under `timestamp`.
    pub fn record_score(&self, patch: StatePatch, timestamp: u64, score: i64) -> StatePatch {
        let mut history = self.score_history();
        history.insert(timestamp.to_string(), Value::from(score));
        patch.value(keys::SCORE_HISTORY, Value::Object(history))
    }
}
