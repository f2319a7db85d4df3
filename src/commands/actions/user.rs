//! Commands open to every user.

use futures::FutureExt;
use log::{debug, warn};

use crate::{
    challonge::Requester,
    commands::{
        CommandResult, Invocation, Reply,
        actions::{HandlerFuture, account, caller_username, required, tournament_id},
        help::{describe, list_authorized, usage},
        markdown_response::{
            format_already_joined, format_authorized_commands, format_feedback,
            format_feedback_thanks, format_inexistent_command, format_joined,
            format_registration_closed, format_username_missing, format_username_set,
        },
        validator::{Rejection, check_access},
    },
    settings::SettingsChange,
};

/// Records the Challonge username of the caller.
pub fn handle_username(invocation: Invocation) -> HandlerFuture {
    async move {
        debug!("handling username command");

        let username = required(&invocation, "username")?;

        Ok(CommandResult {
            replies: vec![Reply::caller(format_username_set(username))],
            settings_changes: vec![SettingsChange::SetUsername {
                user_id: invocation.context.caller.id.clone(),
                username: username.to_string(),
            }],
            ..Default::default()
        })
    }
    .boxed()
}

/// Lists the usable commands, or describes one command.
///
/// A command is described when the caller has enough privileges to run it,
/// even from another channel. Unknown commands and commands above the caller's
/// level get the same answer.
///
/// # Arguments
///
/// * `invocation` - Invocation with an optional `command` argument
///
/// # Examples
///
/// ```no_run
/// // ">>> help launch" from a moderator describes `start`
/// let result = handle_help(invocation).await?;
/// ```
pub fn handle_help(invocation: Invocation) -> HandlerFuture {
    async move {
        debug!("handling help command");

        let body = match invocation.args.get("command") {
            Some(command) => match invocation.registry.resolve(command) {
                Some(descriptor) => match check_access(descriptor, &invocation.context) {
                    Err(Rejection::InsufficientPrivileges) => format_inexistent_command(),
                    _ => describe(descriptor, &invocation.trigger),
                },
                None => format_inexistent_command(),
            },
            None => {
                let usages: Vec<String> =
                    list_authorized(&invocation.registry, &invocation.context)
                        .into_iter()
                        .map(usage)
                        .collect();
                format_authorized_commands(&usages)
            }
        };

        Ok(CommandResult::reply_in_channel(body))
    }
    .boxed()
}

/// Registers the caller in the Challonge tournament of the room.
///
/// Only a tournament that has not started accepts participants.
pub fn handle_join(invocation: Invocation) -> HandlerFuture {
    async move {
        debug!("handling join command");

        let Some(username) = caller_username(&invocation) else {
            return Ok(CommandResult::reply_in_channel(format_username_missing(
                &invocation.trigger,
            )));
        };

        let room_id = invocation.context.channel.id.clone();
        let caller_id = invocation.context.caller.id.clone();
        let joined = invocation
            .settings
            .tournament(&room_id)
            .is_some_and(|link| link.participants.contains(&caller_id));
        if joined {
            return Ok(CommandResult::reply_in_channel(format_already_joined()));
        }

        let requester = account(&invocation)?;
        let tournament_id = tournament_id(&invocation)?;
        let tournament = requester.show_tournament(tournament_id).await?;
        if tournament.state != "pending" {
            debug!("{} is {}, not accepting participants", tournament_id, tournament.state);
            return Ok(CommandResult::reply_in_channel(format_registration_closed(
                &tournament.state,
            )));
        }

        requester.add_participant(tournament_id, &username).await?;

        Ok(CommandResult {
            replies: vec![Reply::channel(format_joined(&username))],
            settings_changes: vec![SettingsChange::AddParticipant {
                room_id,
                user_id: caller_id,
            }],
            ..Default::default()
        })
    }
    .boxed()
}

/// Forwards the rest of the message to every developer room.
pub fn handle_feedback(invocation: Invocation) -> HandlerFuture {
    async move {
        debug!("handling feedback command");

        let feedback = invocation.context.tokens[2..].join(" ");
        let message = format_feedback(&invocation.context.caller.id, &feedback);

        if invocation.policy.dev_rooms.is_empty() {
            warn!("no developer room configured, feedback is only logged: {}", feedback);
        }

        let mut replies: Vec<Reply> = invocation
            .policy
            .dev_rooms
            .iter()
            .map(|room| Reply::room(room, message.clone()))
            .collect();
        replies.push(Reply::channel(format_feedback_thanks()));

        Ok(CommandResult {
            replies,
            ..Default::default()
        })
    }
    .boxed()
}
