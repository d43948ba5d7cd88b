//! The gamemaster daemon.
//!
//! Wakes on a fixed interval, stamps the tick with the wall clock and runs
//! one full maintenance pass over the store. Retryable failures back off
//! with jitter and leave the store untouched; an invariant violation stops
//! the daemon rather than let a corrupt aggregate compound.

mod backoff;
mod config;
mod load;
mod processor;

use crate::config::Config;
use crate::load::LoadGenerator;
use crate::processor::LoggingProcessor;
use anyhow::{bail, Context, Result};
use clap::Parser;
use gambit_engine::{run_tick, Store};
use gambit_types::UnixTime;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(
    name = "gamemaster",
    about = "Periodic maintenance daemon for the gambit platform."
)]
struct Args {
    /// Path to a YAML config file; built-in defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the synthetic-load seed from the config.
    #[arg(long)]
    seed: Option<u64>,
    /// Run this many successful ticks and exit; run until interrupted when
    /// omitted.
    #[arg(long)]
    ticks: Option<u64>,
}

fn unix_now() -> Result<UnixTime> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before the unix epoch")?
        .as_secs())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(seed) = args.seed {
        config.load.seed = seed;
    }

    let mut store = Store::default();
    let now = unix_now()?;
    let mut generator = LoadGenerator::seed(&config.load, &mut store, now)
        .context("failed to seed the synthetic platform")?;
    let mut processor = LoggingProcessor;
    let mut rng = StdRng::from_entropy();

    let interval = Duration::from_secs(config.tick_interval_secs);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    info!(
        interval_secs = config.tick_interval_secs,
        users = config.load.users,
        games = config.load.games,
        seed = config.load.seed,
        "gamemaster started"
    );

    let mut completed = 0u64;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted; shutting down");
                break;
            }
        }

        let now = unix_now()?;
        generator
            .step(&mut store, now)
            .context("failed to apply synthetic load")?;

        let tick_config = config.tick_config(generator.forum_head());
        match run_tick(&mut store, &mut processor, &tick_config, now) {
            Ok(_) => completed += 1,
            Err(error) if error.is_retryable() => {
                let delay = backoff::jittered_backoff(&mut rng, interval);
                warn!(%error, ?delay, "tick failed; backing off before the next attempt");
                tokio::time::sleep(delay).await;
            }
            Err(error) => {
                error!(%error, "unrecoverable maintenance failure");
                bail!("maintenance tick failed: {error}");
            }
        }

        if let Some(limit) = args.ticks {
            if completed >= limit {
                info!(ticks = completed, "tick budget exhausted; exiting");
                break;
            }
        }
    }
    Ok(())
}
