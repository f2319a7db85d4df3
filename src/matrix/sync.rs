//! Sync loop and event handling.
//!
//! [`MatrixSync::sync`]:
//! 1. registers the invite handler, so invites received while offline are
//!    handled during the first sync
//! 2. performs the first sync, retrying until it succeeds
//! 3. registers the message handler, so only new messages are seen
//! 4. loops forever, persisting the sync token after each response

use std::sync::Arc;

use log::{debug, error, info, warn};
use matrix_sdk::{
    Client, LoopCtrl, Room, RoomState,
    config::SyncSettings,
    ruma::{
        UserId,
        api::client::filter::FilterDefinition,
        events::room::{
            member::StrippedRoomMemberEvent,
            message::{MessageType, OriginalSyncRoomMessageEvent},
        },
    },
};
use tokio::time::{Duration, sleep};

use crate::{
    commands::{Caller, Channel, IncomingMessage},
    matrix::{RoomInvite, session::SessionStore},
};

/// Longest wait between two join attempts.
const MAX_JOIN_DELAY_SECS: u64 = 3600;

pub struct MatrixSync {
    client: Client,
    store: SessionStore,
}

impl MatrixSync {
    pub fn new(client: &Client, store: &SessionStore) -> Self {
        MatrixSync {
            client: client.clone(),
            store: store.clone(),
        }
    }

    pub async fn sync<M, I>(&self, on_message: M, on_invite: I) -> anyhow::Result<()>
    where
        M: Fn(IncomingMessage) + Send + Sync + 'static,
        I: Fn(RoomInvite) + Send + Sync + 'static,
    {
        info!("start syncing");

        let on_invite = Arc::new(on_invite);
        self.client.add_event_handler(
            move |event: StrippedRoomMemberEvent, client: Client, room: Room| {
                let on_invite = Arc::clone(&on_invite);
                async move { on_stripped_member(event, client, room, on_invite).await }
            },
        );

        let filter = FilterDefinition::with_lazy_loading();
        let mut sync_settings = SyncSettings::default().filter(filter.into());
        if let Some(sync_token) = self.store.sync_token() {
            sync_settings = sync_settings.token(sync_token);
        }

        let mut delay = 1;
        let response = loop {
            match self.client.sync_once(sync_settings.clone()).await {
                Ok(response) => break response,
                Err(e) => {
                    error!("first sync failed ({e}), retrying in {delay}s");
                    sleep(Duration::from_secs(delay)).await;
                    delay = (delay * 2).min(60);
                }
            }
        };
        if let Err(e) = self.store.save_sync_token(&response.next_batch).await {
            error!("failed to persist sync token: {:#}", e);
        }

        let on_message = Arc::new(on_message);
        self.client.add_event_handler(
            move |event: OriginalSyncRoomMessageEvent, client: Client, room: Room| {
                let on_message = Arc::clone(&on_message);
                async move { on_room_message(event, client, room, on_message).await }
            },
        );

        sync_settings = sync_settings.token(response.next_batch);

        let store = self.store.clone();
        self.client
            .sync_with_result_callback(sync_settings, move |sync_result| {
                let store = store.clone();
                async move {
                    let response = sync_result?;
                    if let Err(e) = store.save_sync_token(&response.next_batch).await {
                        error!("failed to persist sync token: {:#}", e);
                    }
                    Ok(LoopCtrl::Continue)
                }
            })
            .await?;

        Ok(())
    }
}

async fn on_stripped_member<I>(
    event: StrippedRoomMemberEvent,
    client: Client,
    room: Room,
    on_invite: Arc<I>,
) where
    I: Fn(RoomInvite) + Send + Sync + 'static,
{
    let Some(user_id) = client.user_id() else {
        warn!("could not get user id from client");
        return;
    };

    // not an invite for the bot
    if event.state_key != user_id {
        return;
    }

    let invite = RoomInvite {
        room_id: room.room_id().to_string(),
        inviter_id: event.sender.to_string(),
        is_direct: event.content.is_direct.unwrap_or(false),
    };

    tokio::spawn(async move {
        info!("joining room {} invited by {}", invite.room_id, invite.inviter_id);
        let mut delay = 2;

        // synapse may send the invite before the room can be joined
        while let Err(e) = room.join().await {
            if delay > MAX_JOIN_DELAY_SECS {
                error!("giving up joining room {} ({e:?})", invite.room_id);
                return;
            }
            warn!(
                "failed to join room {} ({e:?}), retrying in {delay}s",
                invite.room_id
            );
            sleep(Duration::from_secs(delay)).await;
            delay *= 2;
        }

        info!("joined room {}", invite.room_id);
        on_invite(invite);
    });
}

async fn on_room_message<M>(
    event: OriginalSyncRoomMessageEvent,
    client: Client,
    room: Room,
    on_message: Arc<M>,
) where
    M: Fn(IncomingMessage) + Send + Sync + 'static,
{
    if room.state() != RoomState::Joined {
        return;
    }

    let Some(own_id) = client.user_id() else {
        return;
    };
    if event.sender == own_id {
        return;
    }

    let MessageType::Text(text_content) = event.content.msgtype else {
        return;
    };

    let addressed = is_addressed(
        event.content.mentions.as_ref().map(|m| &m.user_ids),
        own_id,
    );
    let is_private = room.is_direct().await.unwrap_or_else(|e| {
        debug!("could not get direct flag of {}: {e:?}", room.room_id());
        false
    });

    let body = if addressed {
        let names = own_names(&room, own_id).await;
        strip_mention(&text_content.body, &names).to_string()
    } else {
        text_content.body
    };

    on_message(IncomingMessage {
        body,
        caller: Caller {
            id: event.sender.to_string(),
        },
        channel: Channel {
            id: room.room_id().to_string(),
            is_private,
        },
        addressed,
    });
}

/// Returns `true` if the bot is among the mentioned users.
fn is_addressed<'a, T>(mentioned: Option<T>, own_id: &UserId) -> bool
where
    T: IntoIterator<Item = &'a matrix_sdk::ruma::OwnedUserId>,
{
    mentioned.is_some_and(|users| users.into_iter().any(|user| user.as_str() == own_id.as_str()))
}

/// Names a client may use to mention the bot, longest first.
async fn own_names(room: &Room, own_id: &UserId) -> Vec<String> {
    let mut names = vec![own_id.to_string(), own_id.localpart().to_string()];

    match room.get_member_no_sync(own_id).await {
        Ok(Some(member)) => {
            if let Some(display_name) = member.display_name() {
                names.push(display_name.to_string());
            }
        }
        Ok(None) => {}
        Err(e) => debug!("could not get own member in {}: {e:?}", room.room_id()),
    }

    names.sort_by_key(|name| std::cmp::Reverse(name.len()));
    names
}

/// Removes a leading mention of the bot, such as `Bracket Bot: ` or
/// `@bracket:example.com, `.
///
/// The body is returned unchanged when it does not start with one of `names`
/// followed by a separator or the end of the message.
fn strip_mention<'a>(body: &'a str, names: &[String]) -> &'a str {
    let trimmed = body.trim_start();
    let candidates = [trimmed, trimmed.strip_prefix('@').unwrap_or(trimmed)];

    for candidate in candidates {
        for name in names {
            let Some(head) = candidate.get(..name.len()) else {
                continue;
            };
            if !head.eq_ignore_ascii_case(name) {
                continue;
            }

            let rest = &candidate[name.len()..];
            if rest.is_empty() || rest.starts_with(is_separator) {
                return rest.trim_start_matches(is_separator);
            }
        }
    }

    body
}

fn is_separator(c: char) -> bool {
    c == ':' || c == ',' || c.is_whitespace()
}

#[cfg(test)]
mod tests {
    use matrix_sdk::ruma::{OwnedUserId, user_id};

    use super::*;

    #[test]
    fn test_is_addressed() {
        let own_id = user_id!("@bracket:example.com");
        let mentioned: Vec<OwnedUserId> = vec![
            user_id!("@alice:example.com").to_owned(),
            own_id.to_owned(),
        ];

        assert!(is_addressed(Some(&mentioned), own_id));
        assert!(!is_addressed(Some(&mentioned[..1]), own_id));
        assert!(!is_addressed(None::<&Vec<OwnedUserId>>, own_id));
    }

    fn names() -> Vec<String> {
        vec![
            "@bracket:example.com".to_string(),
            "Bracket Bot".to_string(),
            "bracket".to_string(),
        ]
    }

    #[test]
    fn test_strip_display_name() {
        assert_eq!(strip_mention("Bracket Bot: help", &names()), "help");
        assert_eq!(strip_mention("bracket bot update 2-0", &names()), "update 2-0");
    }

    #[test]
    fn test_strip_user_id_and_localpart() {
        assert_eq!(
            strip_mention("@bracket:example.com: dump users", &names()),
            "dump users"
        );
        assert_eq!(strip_mention("bracket, help", &names()), "help");
        assert_eq!(strip_mention("@bracket help", &names()), "help");
    }

    #[test]
    fn test_body_without_leading_mention_is_unchanged() {
        assert_eq!(strip_mention("Bracketeer: help", &names()), "Bracketeer: help");
        assert_eq!(strip_mention("help", &names()), "help");
        assert_eq!(strip_mention("Bracket Bot", &names()), "");
    }
}
