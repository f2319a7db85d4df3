//! Server owner commands.

use futures::FutureExt;
use log::{debug, info};

use crate::{
    commands::{
        CommandResult, Invocation, Reply,
        actions::{HandlerFuture, required, server_id},
        markdown_response::{
            format_invalid_key, format_key_stored, format_leaving_server,
            format_member_not_found, format_organization, format_promoted,
        },
    },
    settings::{ApiKey, SettingsChange},
};

/// Challonge API keys are made of 8 character blocks.
fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && key.len() % 8 == 0 && key.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Matrix user ids look like `@localpart:server`.
fn is_user_id(member: &str) -> bool {
    member.len() > 1
        && member.starts_with('@')
        && member
            .split_once(':')
            .is_some_and(|(local, server)| local.len() > 1 && !server.is_empty())
}

pub fn handle_key(invocation: Invocation) -> HandlerFuture {
    async move {
        debug!("handling key command");

        let key = required(&invocation, "key")?;
        if !is_valid_key(key) {
            return Ok(CommandResult::reply_in_channel(format_invalid_key()));
        }

        Ok(CommandResult {
            replies: vec![Reply::channel(format_key_stored())],
            settings_changes: vec![SettingsChange::SetApiKey {
                user_id: invocation.context.caller.id.clone(),
                api_key: ApiKey::new(key),
            }],
            ..Default::default()
        })
    }
    .boxed()
}

/// Without argument, the organization of the server is reset.
pub fn handle_organization(invocation: Invocation) -> HandlerFuture {
    async move {
        debug!("handling organization command");

        let server_id = server_id(&invocation)?;
        let organization = invocation.args.get("organization").map(str::to_string);

        Ok(CommandResult {
            replies: vec![Reply::channel(format_organization(
                organization.as_deref(),
            ))],
            settings_changes: vec![SettingsChange::SetOrganization {
                server_id,
                organization,
            }],
            ..Default::default()
        })
    }
    .boxed()
}

/// Gives the organizer level to a member of the server.
///
/// # Arguments
///
/// * `invocation` - Invocation with the `member` user id
///
/// # Examples
///
/// ```no_run
/// // ">>> promote @alice:example.com" in the management room
/// let result = handle_promote(invocation).await?;
/// ```
pub fn handle_promote(invocation: Invocation) -> HandlerFuture {
    async move {
        debug!("handling promote command");

        let member = required(&invocation, "member")?;
        if !is_user_id(member) {
            return Ok(CommandResult::reply_in_channel(format_member_not_found(
                member,
            )));
        }

        Ok(CommandResult {
            replies: vec![Reply::channel(format_promoted(member))],
            settings_changes: vec![SettingsChange::Promote {
                server_id: server_id(&invocation)?,
                user_id: member.to_string(),
            }],
            ..Default::default()
        })
    }
    .boxed()
}

/// Forgets the server and leaves every room attached to it.
pub fn handle_leaveserver(invocation: Invocation) -> HandlerFuture {
    async move {
        debug!("handling leaveserver command");

        let Some((server_id, server)) = invocation
            .settings
            .server_of_channel(&invocation.context.channel.id)
        else {
            anyhow::bail!("this room does not belong to a managed server");
        };

        let mut leave_rooms = vec![server.management_channel.clone()];
        leave_rooms.extend(server.rooms.iter().cloned());
        leave_rooms.extend(server.tournaments.keys().cloned());
        info!("leaving server {} ({} rooms)", server_id, leave_rooms.len());

        Ok(CommandResult {
            replies: vec![Reply::channel(format_leaving_server())],
            settings_changes: vec![SettingsChange::RemoveServer {
                server_id: server_id.clone(),
            }],
            leave_rooms,
            ..Default::default()
        })
    }
    .boxed()
}
