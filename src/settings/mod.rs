//! Persistent bot settings.
//!
//! - [`Settings`] - servers, tournament rooms and users known to the bot
//! - [`SettingsChange`] - modifications requested by command handlers
//! - [`SettingsController`] - shared access and periodic persistence
//! - [`SettingsLoader`] - JSON file persistence

mod model;
mod settings_controller;
mod settings_loader;

pub use model::{ApiKey, Settings, SettingsChange, TournamentLink};
pub use settings_controller::SettingsController;
pub use settings_loader::SettingsLoader;
