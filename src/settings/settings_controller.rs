//! Shared access to the settings and their periodic persistence.

use std::{sync::Arc, time::Duration};

use log::debug;
use tokio::{sync::Mutex, time};

use crate::settings::{Settings, SettingsChange, SettingsLoader};

/// Interval in seconds between automatic settings persistence operations.
const SAVE_INTERVAL_SECS: u64 = 60; // 1 minute

/// Owns the settings shared by every message task.
///
/// Handlers receive a snapshot through [`SettingsController::snapshot`] and
/// report their changes; the controller applies them under its lock so two
/// concurrent commands never interleave a read-modify-write.
pub struct SettingsController {
    /// Thread-safe reference to the settings
    settings: Arc<Mutex<Settings>>,
    /// Loader used to persist the settings
    settings_loader: SettingsLoader,
}

impl SettingsController {
    /// Creates a controller with the settings loaded from `settings_path`.
    pub async fn new(settings_path: String) -> Self {
        let settings_loader = SettingsLoader::new(settings_path);
        let settings = Arc::new(Mutex::new(settings_loader.load().await));

        SettingsController {
            settings,
            settings_loader,
        }
    }

    /// Returns a clone of the current settings.
    pub async fn snapshot(&self) -> Settings {
        self.settings.lock().await.clone()
    }

    /// Applies changes in order.
    pub async fn apply(&self, changes: Vec<SettingsChange>) {
        if changes.is_empty() {
            return;
        }

        let mut settings = self.settings.lock().await;
        debug!("applying {} settings changes", changes.len());
        for change in changes {
            settings.apply(change);
        }
    }

    /// Starts a background task saving the settings every [`SAVE_INTERVAL_SECS`].
    pub fn start_persistence_task(&self) {
        let settings = Arc::clone(&self.settings);
        let settings_loader = self.settings_loader.clone();

        tokio::spawn(async move {
            let mut interval = time::interval(Duration::from_secs(SAVE_INTERVAL_SECS));
            loop {
                interval.tick().await;
                let settings = settings.lock().await;
                settings_loader.persist(&settings).await;
            }
        });
    }

    /// Saves the settings immediately. Used on shutdown.
    pub async fn persist(&self) {
        let settings = self.settings.lock().await;
        self.settings_loader.persist(&settings).await;
    }
}
