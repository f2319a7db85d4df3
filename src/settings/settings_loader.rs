//! Settings persistence between bot restarts.
//!
//! The whole [`Settings`] tree is serialized to a single JSON file.

use log::{error, info, warn};
use tokio::fs;

use crate::settings::Settings;

/// Reads and writes the settings file.
#[derive(Clone)]
pub struct SettingsLoader {
    /// Path of the JSON file
    path: String,
}

impl SettingsLoader {
    pub fn new(path: String) -> Self {
        SettingsLoader { path }
    }

    /// Loads the persisted settings.
    ///
    /// A missing or unreadable file is not fatal: the bot starts with empty settings.
    pub async fn load(&self) -> Settings {
        let Ok(serialized_settings) = fs::read_to_string(&self.path).await else {
            warn!("no persisted settings found, starting with empty settings");
            return Settings::default();
        };

        let Ok(settings) = serde_json::from_str::<Settings>(&serialized_settings) else {
            error!("failed to deserialize persisted settings, starting with empty settings");
            return Settings::default();
        };

        info!(
            "loaded settings for {} servers and {} users",
            settings.servers.len(),
            settings.users.len()
        );

        settings
    }

    /// Writes the settings to disk, logging failures.
    pub async fn persist(&self, settings: &Settings) {
        let serialized_settings = match serde_json::to_string(settings) {
            Ok(serialized) => serialized,
            Err(e) => {
                error!("failed to serialize settings: {}", e);
                return;
            }
        };

        if let Err(e) = fs::write(&self.path, &serialized_settings).await {
            error!("failed to persist settings: {}", e);
            return;
        }

        info!("persisted settings");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{ApiKey, SettingsChange};
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_load_nonexistent_file_returns_default() {
        let loader = SettingsLoader::new("nonexistent_settings.json".to_string());
        assert_eq!(loader.load().await, Settings::default());
    }

    #[tokio::test]
    async fn test_persist_and_load() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap().to_string();
        let loader = SettingsLoader::new(path);

        let mut settings = Settings::default();
        settings.apply(SettingsChange::AttachRoom {
            room_id: "!mods:example.com".to_string(),
            inviter_id: "@owner:example.com".to_string(),
        });
        settings.apply(SettingsChange::SetApiKey {
            user_id: "@owner:example.com".to_string(),
            api_key: ApiKey::new("secret"),
        });

        loader.persist(&settings).await;

        assert_eq!(loader.load().await, settings);
    }

    #[tokio::test]
    async fn test_load_corrupted_json_returns_default() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap().to_string();

        fs::write(&path, "{ not json").await.unwrap();

        let loader = SettingsLoader::new(path);
        assert_eq!(loader.load().await, Settings::default());
    }

    #[tokio::test]
    async fn test_load_tolerates_missing_sections() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap().to_string();

        fs::write(&path, r#"{"users":{"@a:example.com":{"api_key":"k"}}}"#)
            .await
            .unwrap();

        let settings = SettingsLoader::new(path).load().await;
        assert!(settings.servers.is_empty());
        assert_eq!(
            settings
                .user("@a:example.com")
                .unwrap()
                .api_key
                .as_ref()
                .map(ApiKey::as_str),
            Some("k")
        );
    }
}
