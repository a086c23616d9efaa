// player-scrobbler
// Watches the currently playing track through an external observer process
// and scrobbles listens to Last.fm

mod config;
mod events;
mod lastfm_auth;
mod monitor;
mod observer;
mod scrobbler;
mod session;
mod text_cleanup;
mod track;

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use config::Config;
use monitor::Monitor;
use observer::Observer;
use scrobbler::LastFm;
use text_cleanup::TextCleaner;

#[derive(Parser)]
#[command(
    name = "player-scrobbler",
    about = "Scrobbles your desktop player's music to Last.fm",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Authorize with Last.fm and store the session key
    Auth,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Some(CliCommand::Auth) => run_auth(config),
        None => run(config),
    }
}

/// Interactive session-key flow; writes the key back into the config file.
fn run_auth(mut config: Config) -> Result<()> {
    let lastfm = config
        .lastfm
        .as_mut()
        .context("Add a [lastfm] section with api_key and api_secret to the config first")?;
    if lastfm.api_key.is_empty() || lastfm.api_secret.is_empty() {
        bail!(
            "Set lastfm.api_key and lastfm.api_secret in {:?} first \
             (create them at https://www.last.fm/api/account/create)",
            Config::config_path()?
        );
    }

    let session_key = lastfm_auth::authenticate(&lastfm.api_key, &lastfm.api_secret)?;
    lastfm.session_key = session_key;
    lastfm.enabled = true;
    config.save()?;

    println!("Session key saved; you can now run player-scrobbler");
    Ok(())
}

fn run(config: Config) -> Result<()> {
    let Some(lastfm) = config.lastfm_enabled() else {
        bail!("Last.fm is not configured; run `player-scrobbler auth` first");
    };
    if lastfm.session_key.is_empty() {
        bail!("Missing Last.fm session key; run `player-scrobbler auth` first");
    }

    let service = Arc::new(LastFm::new(
        lastfm.api_key.clone(),
        lastfm.api_secret.clone(),
        lastfm.session_key.clone(),
    ));
    let cleaner = TextCleaner::new(&config.cleanup);

    let (events_tx, events_rx) = mpsc::channel();
    let _observer = Observer::spawn(&config.observer, cleaner, events_tx.clone())?;
    monitor::spawn_tick_timer(Duration::from_secs(config.tick_interval), events_tx.clone());

    log::info!(
        "Scrobbler started (eligibility check every {}s)",
        config.tick_interval
    );
    Monitor::new(service, events_tx).run(events_rx);
    Ok(())
}
