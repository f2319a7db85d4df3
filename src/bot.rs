//! Main bot wiring the Matrix transport, the settings and the dispatcher.
//!
//! # Message flow
//!
//! ```text
//! Matrix Message → Dispatcher (on a settings snapshot) → CommandResult
//!                → apply settings changes → send replies → leave rooms
//! ```
//!
//! Every message is handled in its own tokio task. Handlers only see a
//! snapshot of the settings; their changes are applied afterwards, in order.
//!
//! # Tasks
//!
//! 1. **Matrix Sync**: receives messages and invites until a `shutdown` command
//! 2. **Settings Persistence**: saves the settings to disk every minute
//!
//! Settings are saved one last time when the bot stops.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::Notify;

use crate::{
    challonge::ChallongeResolver,
    commands::{
        AccessPolicy, CommandResult, DispatchOutcome, Dispatcher, IncomingMessage, Registry,
        Reply, Target,
    },
    config::Config,
    matrix::{MatrixClient, RoomInvite, UserCredentials},
    settings::{SettingsChange, SettingsController},
    utils::get_path,
};

/// Shared state of the message tasks.
#[derive(Clone)]
struct BotContext {
    matrix_client: Arc<MatrixClient>,
    settings: Arc<SettingsController>,
    dispatcher: Arc<Dispatcher<ChallongeResolver>>,
    shutdown: Arc<Notify>,
}

pub struct Bot {
    context: BotContext,
}

impl Bot {
    pub async fn new(config: Config, data_path: &str, registry: Registry) -> anyhow::Result<Self> {
        let matrix_client = Arc::new(
            MatrixClient::new(
                &UserCredentials {
                    user_id: config.matrix.user_id,
                    password: config.matrix.password,
                },
                &get_path(data_path, "session"),
            )
            .await?,
        );

        let settings =
            Arc::new(SettingsController::new(get_path(data_path, "settings")).await);

        let policy = AccessPolicy {
            dev_ids: config.bot.dev_ids,
            dev_rooms: config.bot.dev_rooms,
        };
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::new(registry),
            ChallongeResolver::new(&config.challonge.url),
            &config.bot.trigger,
            policy,
        ));
        info!(
            "{} commands registered, trigger is {}",
            dispatcher.registry().len(),
            config.bot.trigger
        );

        Ok(Bot {
            context: BotContext {
                matrix_client,
                settings,
                dispatcher,
                shutdown: Arc::new(Notify::new()),
            },
        })
    }

    /// Runs until a `shutdown` command is handled or the sync loop fails.
    pub async fn start(self) {
        self.context.settings.start_persistence_task();

        let on_message = {
            let context = self.context.clone();
            move |message: IncomingMessage| {
                let context = context.clone();
                tokio::spawn(async move { handle_message(context, message).await });
            }
        };

        let on_invite = {
            let context = self.context.clone();
            move |invite: RoomInvite| {
                let context = context.clone();
                tokio::spawn(async move { handle_invite(context, invite).await });
            }
        };

        tokio::select! {
            _ = self.context.matrix_client.sync(on_message, on_invite) => {}
            _ = self.context.shutdown.notified() => info!("shutdown requested"),
        }

        self.context.settings.persist().await;
        info!("bot stopped");
    }
}

async fn handle_invite(context: BotContext, invite: RoomInvite) {
    if invite.is_direct {
        debug!("direct room {} is not attached to any server", invite.room_id);
        return;
    }

    context
        .settings
        .apply(vec![SettingsChange::AttachRoom {
            room_id: invite.room_id,
            inviter_id: invite.inviter_id,
        }])
        .await;
}

async fn handle_message(context: BotContext, message: IncomingMessage) {
    if !context.dispatcher.is_command(&message) {
        return;
    }

    let snapshot = context.settings.snapshot().await;
    let outcome = context.dispatcher.dispatch(&message, snapshot).await;

    let Some(result) = into_result(outcome) else {
        return;
    };

    context.settings.apply(result.settings_changes).await;

    for reply in &result.replies {
        match &reply.target {
            Target::Channel => {
                context
                    .matrix_client
                    .send_to_room(&message.channel.id, &reply.body)
                    .await
            }
            Target::Caller => {
                context
                    .matrix_client
                    .send_to_user(&message.caller.id, &reply.body)
                    .await
            }
            Target::Room(room_id) => context.matrix_client.send_to_room(room_id, &reply.body).await,
            Target::User(user_id) => context.matrix_client.send_to_user(user_id, &reply.body).await,
        }
    }

    for room_id in &result.leave_rooms {
        context.matrix_client.leave_room(room_id).await;
    }

    if result.shutdown {
        warn!("shutdown requested by {}", message.caller.id);
        context.shutdown.notify_one();
    }
}

/// What the bot has to do once a message was dispatched.
fn into_result(outcome: DispatchOutcome) -> Option<CommandResult> {
    match outcome {
        DispatchOutcome::Ignored => None,
        DispatchOutcome::Rejected {
            command,
            rejection,
            reply,
        } => {
            info!("{} rejected: {}", command, rejection);
            Some(CommandResult::reply_in_channel(reply))
        }
        DispatchOutcome::Unresolved {
            command,
            error,
            reply,
        } => {
            warn!("{} not run: {}", command, error);
            Some(CommandResult::reply_in_channel(reply))
        }
        DispatchOutcome::Completed { command, result } => {
            debug!(
                "{} completed with {} replies and {} settings changes",
                command,
                result.replies.len(),
                result.settings_changes.len()
            );
            Some(result)
        }
        DispatchOutcome::Failed {
            command,
            error,
            reply,
        } => {
            warn!("{} failed, notifying the caller: {:#}", command, error);
            Some(CommandResult {
                replies: vec![Reply::caller(reply)],
                ..Default::default()
            })
        }
    }
}
