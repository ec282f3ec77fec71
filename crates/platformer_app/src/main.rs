//! # platformer_app
//!
//! Runs a headless platformer session on the engine core: loads a level,
//! places entities from its markers and steps the simulation for a fixed
//! number of ticks with scripted input, drawing every frame into a
//! counting renderer.
//!
//! ## Startup Sequence
//!
//! 1. Read the session config (`--config`, JSON) and apply flag overrides.
//! 2. Load the level text (`--level`, or the built-in meadow).
//! 3. Place entities and run the tick loop until the tick budget is spent or
//!    the player starves.

mod components;
mod config;
mod game;
mod services;
mod systems;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::SessionConfig;
use game::{Game, MEADOW};
use services::{Audio, Clip, HeadlessRenderer, LogAudio, MemoryAssets, ScriptedInput};

#[derive(Parser)]
#[command(name = "platformer_app", about = "Headless platformer session")]
struct Args {
    /// JSON session config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Level map file (overrides the config)
    #[arg(short, long)]
    level: Option<PathBuf>,

    /// Number of ticks to simulate (overrides the config)
    #[arg(short, long)]
    ticks: Option<u64>,

    /// RNG seed (overrides the config and PLATFORMER_SEED)
    #[arg(short, long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("platformer_app=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    if let Some(level) = args.level {
        config.level = Some(level);
    }
    if let Some(ticks) = args.ticks {
        config.ticks = ticks;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }

    info!(seed = config.seed(), ticks = config.ticks, "session starting");
    let session = run_session(&config)?;
    let Session {
        game,
        assets,
        audio,
        renderer,
    } = &session;

    info!(
        ticks = game.tick(),
        score = game.score(),
        entities = game.world().entity_count(),
        starved = game.is_over(),
        "session finished"
    );
    info!(
        player = %game.player(),
        level_width = game.level().width(),
        frames = renderer.frames,
        camera = %renderer.camera(),
        tile_sprites = assets.sprite_count(),
        jumps = audio.count(Clip::Jump),
        carrots = audio.count(Clip::Eat),
        "session stats"
    );
    Ok(())
}

/// Everything a finished session leaves behind.
struct Session {
    game: Game,
    assets: MemoryAssets,
    audio: LogAudio,
    renderer: HeadlessRenderer,
}

/// Build the level named by `config` and step it until the tick budget is
/// spent or the player starves.
fn run_session(config: &SessionConfig) -> Result<Session> {
    let mut assets = MemoryAssets::headless();
    let mut game = match &config.level {
        Some(path) => Game::load(config, path, &mut assets)?,
        None => Game::new(config, MEADOW, &mut assets).context("building the built-in level")?,
    };
    let mut input = ScriptedInput::demo();
    let mut audio = LogAudio::new();
    let mut renderer = HeadlessRenderer::default();

    audio.play(Clip::Music, true);
    for _ in 0..config.ticks {
        input.set_tick(game.tick());
        game.update(&input, &mut audio)?;
        game.draw(&mut renderer)?;
        if game.is_over() {
            break;
        }
    }

    Ok(Session {
        game,
        assets,
        audio,
        renderer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_session_runs_and_draws_every_tick() {
        let config = SessionConfig {
            ticks: 30,
            seed: Some(7),
            ..SessionConfig::default()
        };
        let session = run_session(&config).unwrap();
        assert_eq!(session.audio.count(Clip::Music), 1);
        assert_eq!(session.game.tick(), 30);
        assert_eq!(session.renderer.frames, 30);
        assert!(session.assets.sprite_count() > 0);
    }

    #[test]
    fn test_missing_level_file_is_reported() {
        let config = SessionConfig {
            level: Some(PathBuf::from("no/such/level.txt")),
            ticks: 1,
            ..SessionConfig::default()
        };
        assert!(run_session(&config).is_err());
    }

    #[test]
    fn test_args_parse_overrides() {
        let args = Args::parse_from(["platformer_app", "--ticks", "5", "--seed", "9"]);
        assert_eq!(args.ticks, Some(5));
        assert_eq!(args.seed, Some(9));
        assert!(args.config.is_none());
    }
}
