//! Persistence of the Matrix SDK session.
//!
//! The data directory holds two entries:
//! - `session`: JSON file with the SDK session and the last sync token
//! - `sqlite`: SQLite store of the SDK

use log::{debug, trace, warn};
use matrix_sdk::authentication::matrix::MatrixSession;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::utils::get_path;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSession {
    user_session: MatrixSession,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sync_token: Option<String>,
}

/// Session files of the bot account.
#[derive(Clone)]
pub struct SessionStore {
    stored: Option<StoredSession>,
    sqlite_path: String,
    session_path: String,
}

impl SessionStore {
    /// Opens the session files of `dir_path`. A missing or unreadable session
    /// file means the bot has to log in again.
    pub async fn open(dir_path: &str) -> SessionStore {
        let sqlite_path = get_path(dir_path, "sqlite");
        let session_path = get_path(dir_path, "session");
        debug!("session file {}, sqlite store {}", session_path, sqlite_path);

        let stored = match read_session(&session_path).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!("ignoring session file {}: {:#}", session_path, e);
                None
            }
        };

        SessionStore {
            stored,
            sqlite_path,
            session_path,
        }
    }

    pub fn sqlite_path(&self) -> &str {
        &self.sqlite_path
    }

    pub fn user_session(&self) -> Option<&MatrixSession> {
        self.stored.as_ref().map(|s| &s.user_session)
    }

    pub fn sync_token(&self) -> Option<&str> {
        self.stored.as_ref().and_then(|s| s.sync_token.as_deref())
    }

    /// Writes a new SDK session, dropping any previous sync token.
    pub async fn save_user_session(&self, user_session: &MatrixSession) -> anyhow::Result<()> {
        trace!("persist user session");

        let stored = StoredSession {
            user_session: user_session.clone(),
            sync_token: None,
        };
        fs::write(&self.session_path, serde_json::to_string(&stored)?).await?;
        Ok(())
    }

    /// Records the sync token in the session file.
    pub async fn save_sync_token(&self, sync_token: &str) -> anyhow::Result<()> {
        trace!("persist sync token {}", sync_token);

        let Some(mut stored) = read_session(&self.session_path).await? else {
            anyhow::bail!("no session to attach the sync token to");
        };
        stored.sync_token = Some(sync_token.to_owned());
        fs::write(&self.session_path, serde_json::to_string(&stored)?).await?;
        Ok(())
    }
}

async fn read_session(session_path: &str) -> anyhow::Result<Option<StoredSession>> {
    if !fs::try_exists(session_path).await? {
        return Ok(None);
    }

    let data = fs::read_to_string(session_path).await?;
    Ok(Some(serde_json::from_str(&data)?))
}
