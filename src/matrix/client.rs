//! High level Matrix client used by the bot.

use log::{debug, error, info, warn};
use matrix_sdk::{
    Client, Room,
    ruma::{RoomId, UserId, events::room::message::RoomMessageEventContent},
};

use crate::{
    commands::IncomingMessage,
    matrix::{RoomInvite, UserCredentials, login::setup_client, session::SessionStore, sync::MatrixSync},
};

const DISPLAY_NAME: &str = "Bracket";

/// Sends messages and runs the sync loop.
///
/// Send failures are logged and never returned: a lost reply must not stop
/// the bot.
pub struct MatrixClient {
    matrix_sync: MatrixSync,
    client: Client,
}

impl MatrixClient {
    /// Logs in, or restores the session stored in `session_path`.
    pub async fn new(credentials: &UserCredentials, session_path: &str) -> anyhow::Result<Self> {
        let store = SessionStore::open(session_path).await;
        let client = setup_client(credentials, &store).await?;

        if let Err(e) = client.account().set_display_name(Some(DISPLAY_NAME)).await {
            warn!("failed to set display name: {:?}", e);
        }

        let matrix_sync = MatrixSync::new(&client, &store);

        Ok(MatrixClient {
            matrix_sync,
            client,
        })
    }

    /// Runs the sync loop until it fails.
    ///
    /// `on_message` receives every text message sent by someone else in a
    /// joined room, `on_invite` every room the bot joined after an invite.
    pub async fn sync<M, I>(&self, on_message: M, on_invite: I)
    where
        M: Fn(IncomingMessage) + Send + Sync + 'static,
        I: Fn(RoomInvite) + Send + Sync + 'static,
    {
        match self.matrix_sync.sync(on_message, on_invite).await {
            Ok(_) => info!("matrix sync ended successfully"),
            Err(e) => error!("matrix sync ended with error: {:?}", e),
        }
    }

    /// Sends a Markdown message to a joined room.
    pub async fn send_to_room(&self, room_id: &str, body: &str) {
        let Some(room) = self.joined_room(room_id) else {
            return;
        };
        self.send(&room, body).await;
    }

    /// Sends a Markdown message in the direct room shared with `user_id`,
    /// creating it when needed.
    pub async fn send_to_user(&self, user_id: &str, body: &str) {
        let user_id = match UserId::parse(user_id) {
            Ok(user_id) => user_id,
            Err(e) => {
                error!("invalid user id {}: {}", user_id, e);
                return;
            }
        };

        let room = match self.client.get_dm_room(&user_id) {
            Some(room) => room,
            None => match self.client.create_dm(&user_id).await {
                Ok(room) => {
                    debug!("created direct room {} with {}", room.room_id(), user_id);
                    room
                }
                Err(e) => {
                    error!("failed to create direct room with {}: {:?}", user_id, e);
                    return;
                }
            },
        };

        self.send(&room, body).await;
    }

    pub async fn leave_room(&self, room_id: &str) {
        let Some(room) = self.joined_room(room_id) else {
            return;
        };

        match room.leave().await {
            Ok(_) => info!("left room {}", room_id),
            Err(e) => error!("failed to leave room {}: {:?}", room_id, e),
        }
    }

    fn joined_room(&self, room_id: &str) -> Option<Room> {
        let room = RoomId::parse(room_id)
            .ok()
            .and_then(|room_id| self.client.get_room(&room_id));
        if room.is_none() {
            warn!("unknown room {}", room_id);
        }
        room
    }

    async fn send(&self, room: &Room, body: &str) {
        let content = RoomMessageEventContent::text_markdown(body);
        if let Err(e) = room.send(content).await {
            error!("failed to send message to {}: {:?}", room.room_id(), e);
        }
    }
}
