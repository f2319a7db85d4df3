//! bracket-bot - A Matrix bot running Challonge tournaments from chat rooms.
//!
//! # Overview
//!
//! Server owners invite the bot into a management room, store their Challonge
//! API key and promote organizers. Organizers create tournaments linked to
//! rooms, participants join them, report their scores and look up their next
//! match without leaving Matrix.
//!
//! # Usage
//!
//! ```bash
//! bracket-bot --config config.yaml --data ./bracket-data
//! ```
//!
//! See [`config`] for the configuration file. The data directory holds the
//! Matrix session and the settings file.
//!
//! # Architecture
//!
//! - [`bot`] - wires Matrix, the settings and the dispatcher together
//! - [`commands`] - command registry, authorization, dispatch and handlers
//! - [`challonge`] - Challonge API client and tournament flows
//! - [`settings`] - servers, tournament rooms and users, persisted as JSON
//! - [`matrix`] - Matrix login, sync and messaging
//! - [`config`] - YAML configuration with environment variable overrides
//! - [`logging`] - logger setup and runtime log levels
//! - [`utils`] - path and pagination helpers
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (default: `info`)
//! - `BRACKET_*` - Configuration overrides, e.g. `BRACKET_MATRIX__PASSWORD`

use clap::Parser;
use log::{error, info};

use crate::{bot::Bot, commands::actions::build_registry, config::Config};

mod bot;
mod challonge;
mod commands;
mod config;
mod logging;
mod matrix;
mod settings;
mod utils;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long)]
    config: String,

    /// Directory storing the Matrix session and the settings.
    ///
    /// It contains the Matrix access token: restrict its permissions.
    #[arg(short, long)]
    data: String,
}

#[tokio::main]
async fn main() {
    if let Err(e) = logging::init() {
        eprintln!("Failed to install logger: {}", e);
        return;
    }

    info!("Starting bracket-bot {}...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config file: {:#}", e);
            return;
        }
    };

    let registry = match build_registry() {
        Ok(registry) => registry,
        Err(e) => {
            error!("Failed to register commands: {}", e);
            return;
        }
    };

    let bot = match Bot::new(config, &args.data, registry).await {
        Ok(bot) => bot,
        Err(e) => {
            error!("Failed to initialize bot: {:#}", e);
            return;
        }
    };
    bot.start().await;
}
