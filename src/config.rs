//! Configuration of the bot.
//!
//! The configuration is read from a YAML file, then every value can be
//! overridden by an environment variable prefixed with `BRACKET_`, using `__`
//! between sections:
//!
//! ```yaml
//! matrix:
//!   # Fully qualified Matrix user ID of the bot account
//!   user_id: "@bracket:matrix.org"
//!   password: "secret-password"
//!
//! bot:
//!   # Marker prefixing every command, defaults to ">>>"
//!   trigger: ">>>"
//!   # Users with every permission
//!   dev_ids: ["@admin:matrix.org"]
//!   # Rooms where developers run commands and receive feedback
//!   dev_rooms: ["!devroom:matrix.org"]
//!
//! challonge:
//!   # Base url of the Challonge API, defaults to https://api.challonge.com/v1
//!   url: "https://api.challonge.com/v1"
//! ```
//!
//! ```bash
//! export BRACKET_MATRIX__PASSWORD="secret-from-env"
//! ```

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::Deserialize;

use crate::challonge::DEFAULT_URL;

/// Prefix of the environment variables overriding the file.
const ENV_PREFIX: &str = "BRACKET_";

/// Root configuration.
#[derive(Deserialize, Debug)]
pub struct Config {
    pub matrix: Matrix,
    #[serde(default)]
    pub bot: BotOptions,
    #[serde(default)]
    pub challonge: Challonge,
}

/// Matrix account of the bot.
#[derive(Deserialize, Debug)]
pub struct Matrix {
    /// Fully qualified Matrix user ID, e.g. `@bracket:matrix.org`
    pub user_id: String,
    /// Used for the first login only, the session is restored afterwards
    pub password: String,
}

/// Command surface settings.
#[derive(Deserialize, Debug)]
pub struct BotOptions {
    #[serde(default = "default_trigger")]
    pub trigger: String,
    #[serde(default)]
    pub dev_ids: Vec<String>,
    #[serde(default)]
    pub dev_rooms: Vec<String>,
}

impl Default for BotOptions {
    fn default() -> Self {
        BotOptions {
            trigger: default_trigger(),
            dev_ids: Vec::new(),
            dev_rooms: Vec::new(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct Challonge {
    #[serde(default = "default_challonge_url")]
    pub url: String,
}

impl Default for Challonge {
    fn default() -> Self {
        Challonge {
            url: default_challonge_url(),
        }
    }
}

fn default_trigger() -> String {
    ">>>".to_owned()
}

fn default_challonge_url() -> String {
    DEFAULT_URL.to_owned()
}

impl Config {
    /// Reads the YAML file at `path` and applies the environment overrides.
    pub fn load(path: &str) -> anyhow::Result<Config> {
        let config = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(config)
    }
}
