//! Headless demo of the shmup session core.
//!
//! Builds a [`SessionController`] on the headless backend and an in-memory
//! store, lets the store drive it into the configured scene exactly as a UI
//! would (`gameState = begin` with `gameScene` preset), and flies the player ship
//! with a simple autopilot for a fixed number of frames.
//!
//! # Main Loop
//!
//! 1. Load `config.ini` (defaults on any error)
//! 2. Create the controller, initialize it on a headless surface
//! 3. Write `gameState = begin` and tick frames at a fixed 60 Hz step:
//!    - the autopilot weaves left and right and holds the trigger
//!    - audio commands are drained and counted
//! 4. Stop when the frame budget is spent or the session is won or lost,
//!    then log a summary and dispose the controller
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --frames 3600
//! ```

use std::path::PathBuf;

use clap::Parser;
use glam::Vec2;
use shmup_session::backend::Surface;
use shmup_session::backend::headless::HeadlessBackend;
use shmup_session::game::default_registry;
use shmup_session::resources::audio::AudioBridge;
use shmup_session::resources::gameconfig::CombatConfig;
use shmup_session::resources::gamestate::GameStates;
use shmup_session::resources::statestore::{MemoryStore, StatePatch, StateStore, keys};
use shmup_session::{SceneOptions, SessionController};

const FRAME_DT: f32 = 1.0 / 60.0;

/// Headless shmup session demo
#[derive(Parser)]
#[command(version, about = "Runs the shmup session core headless with an autopilot.")]
struct Cli {
    /// Number of frames to simulate.
    #[arg(long, default_value_t = 1800)]
    frames: u32,

    /// Combat configuration file.
    #[arg(long, value_name = "PATH", default_value = "config.ini")]
    config: PathBuf,

    /// Scene key to play.
    #[arg(long, default_value = "shmup")]
    scene: String,

    /// Persist scoreHistory/progress/userId to this JSON file.
    #[arg(long, value_name = "PATH")]
    store: Option<PathBuf>,

    /// Keep the autopilot's trigger released.
    #[arg(long)]
    no_fire: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = CombatConfig::with_path(cli.config.clone());
    if let Err(e) = config.load_from_file() {
        log::warn!("{}; using default combat config", e);
    }
    let surface = Surface::new("headless", config.surface.width, config.surface.height);

    let mut store = match &cli.store {
        Some(path) => MemoryStore::persistent(path.clone()),
        None => MemoryStore::new(),
    };
    store.set_state(
        StatePatch::new()
            .value(keys::GAME_OPTS, SceneOptions::Default.to_value())
            .value(keys::GAME_SCENE, cli.scene.as_str())
            .into_map(),
    );
    let (bridge, audio_rx) = AudioBridge::channel();

    let mut controller = SessionController::new(
        Box::new(HeadlessBackend::new()),
        Box::new(store),
        default_registry(),
        config,
        bridge,
    );
    if let Err(e) = controller.initialize(surface) {
        log::error!("{}", e);
        std::process::exit(1);
    }

    // The UI starts a session by writing gameState; the scene comes from gameScene.
    controller.set_state(StatePatch::new().game_state(GameStates::Begin));

    let mut audio_cmds = 0usize;
    let mut frames_run = 0u32;
    for frame in 0..cli.frames {
        let t = frame as f32 * FRAME_DT;
        {
            let mut intent = controller.intent_mut();
            intent.direction = Vec2::new((t * 1.3).sin(), (t * 0.4).cos() * 0.3);
            intent.fire = !cli.no_fire;
        }
        if let Err(e) = controller.frame(FRAME_DT) {
            log::error!("frame {} failed: {}", frame, e);
            break;
        }
        frames_run += 1;
        audio_cmds += audio_rx.try_iter().count();

        if controller
            .shared()
            .game_state()
            .is_some_and(|state| state.is_terminal())
        {
            break;
        }
    }

    let shared = controller.shared();
    log::info!(
        "{} frames: state={:?} score={:?} lives={:?} playerHP={:?} bossHP={:?} audio={}",
        frames_run,
        shared.game_state(),
        shared.score(),
        shared.lives(),
        shared.player_hp(),
        shared.boss_hp(),
        audio_cmds
    );
    log::info!("score history: {} entries", shared.score_history().len());

    if let Err(e) = controller.dispose() {
        log::error!("{}", e);
    }
}
