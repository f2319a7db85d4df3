//! Command action handlers.
//!
//! Each handler receives an [`Invocation`] holding the bound arguments, the
//! resolved helpers and a snapshot of the settings, and returns a
//! [`CommandResult`]. Handlers don't modify state directly; they request
//! changes through the result.
//!
//! [`build_registry`] declares every command with its requirements:
//!
//! | Command | Min permission | Channels |
//! |---------|----------------|----------|
//! | `shutdown`, `dump` | Dev | Any |
//! | `log`, `announce` | Dev | Private |
//! | `key` | ServerOwner | Private |
//! | `organization`, `promote`, `leaveserver` | ServerOwner | Mods |
//! | `create` | Organizer | NewTourney |
//! | `shuffleseeds`, `start`, `reset`, `checkin_start`, `checkin_stop`, `finalize`, `reopen` | Organizer | Tournament |
//! | `update`, `forfeit`, `next`, `checkin` | Participant | Tournament |
//! | `username`, `help` | User | Any |
//! | `join` | User | Tournament |
//! | `feedback` | User | Private |

use anyhow::Context;
use futures::future::BoxFuture;

use crate::{
    challonge::ChallongeRequester,
    commands::{
        CommandResult, Invocation,
        descriptor::CommandDescriptor,
        permissions::{ChannelRestrictions, PermissionLevel},
        registry::{RegistrationError, Registry},
        resources::Helper,
    },
};

mod dev;
mod organizer;
mod owner;
mod participant;
mod user;

type HandlerFuture = BoxFuture<'static, anyhow::Result<CommandResult>>;

const ACCOUNT_AND_TOURNAMENT: &[Helper] = &[Helper::Account, Helper::TournamentId];

/// Declares and registers every command of the bot.
pub fn build_registry() -> Result<Registry, RegistrationError> {
    use PermissionLevel::*;

    let mut registry = Registry::new();

    // Dev
    registry.register(
        CommandDescriptor::builder("shutdown", dev::handle_shutdown)
            .aliases(&["exit", "out"])
            .min_permission(Dev)
            .channels(ChannelRestrictions::ANY)
            .doc("Save the settings and stop the bot")
            .build(),
    )?;
    registry.register(
        CommandDescriptor::builder("dump", dev::handle_dump)
            .aliases(&["print"])
            .optional_args(&["what"])
            .min_permission(Dev)
            .channels(ChannelRestrictions::ANY)
            .doc("Send internal state privately\nOptional argument:\nwhat -- one of commands, servers, users")
            .build(),
    )?;
    registry.register(
        CommandDescriptor::builder("log", dev::handle_log)
            .required_args(&["level"])
            .optional_args(&["what"])
            .min_permission(Dev)
            .channels(ChannelRestrictions::PRIVATE)
            .doc("Change the log level\nArgument:\nlevel -- off, error, warn, info, debug or trace\nOptional argument:\nwhat -- module path, e.g. matrix_sdk; if not set, the global level changes")
            .build(),
    )?;
    registry.register(
        CommandDescriptor::builder("announce", dev::handle_announce)
            .required_args(&["announcement"])
            .min_permission(Dev)
            .channels(ChannelRestrictions::PRIVATE)
            .doc("Send a message to the owner of every server\nArgument:\nannouncement -- the rest of the message")
            .build(),
    )?;

    // Server owner
    registry.register(
        CommandDescriptor::builder("key", owner::handle_key)
            .required_args(&["key"])
            .min_permission(ServerOwner)
            .channels(ChannelRestrictions::PRIVATE)
            .doc("Store your Challonge API key\nLook for it here: https://challonge.com/settings/developer\nArgument:\nkey -- the Challonge API key")
            .build(),
    )?;
    registry.register(
        CommandDescriptor::builder("organization", owner::handle_organization)
            .optional_args(&["organization"])
            .min_permission(ServerOwner)
            .channels(ChannelRestrictions::MODS)
            .doc("Set up a Challonge organization for this server\nOptional argument:\norganization -- if not set, it will be reset for this server")
            .build(),
    )?;
    registry.register(
        CommandDescriptor::builder("promote", owner::handle_promote)
            .required_args(&["member"])
            .min_permission(ServerOwner)
            .channels(ChannelRestrictions::MODS)
            .doc("Allow a member to manage tournaments with you\nArgument:\nmember -- Matrix id of the member, e.g. @alice:matrix.org")
            .build(),
    )?;
    registry.register(
        CommandDescriptor::builder("leaveserver", owner::handle_leaveserver)
            .min_permission(ServerOwner)
            .channels(ChannelRestrictions::MODS)
            .doc("Forget this server and leave all of its rooms")
            .build(),
    )?;

    // Organizer
    registry.register(
        CommandDescriptor::builder("create", organizer::handle_create)
            .aliases(&["new"])
            .required_args(&["name", "url", "type"])
            .min_permission(Organizer)
            .channels(ChannelRestrictions::NEW_TOURNEY)
            .helpers(&[Helper::Account])
            .doc("Create a tournament linked to this room\nArguments:\nname -- the tournament name\nurl -- name used for the url http://challonge.com/url\ntype -- singleelim or doubleelim")
            .build(),
    )?;
    registry.register(
        CommandDescriptor::builder("shuffleseeds", organizer::handle_shuffleseeds)
            .aliases(&["shuffle", "randomize"])
            .min_permission(Organizer)
            .channels(ChannelRestrictions::TOURNAMENT)
            .helpers(ACCOUNT_AND_TOURNAMENT)
            .doc("Shuffle tournament seeds\nThe tournament must not have been started yet")
            .build(),
    )?;
    registry.register(
        CommandDescriptor::builder("start", organizer::handle_start)
            .aliases(&["launch"])
            .min_permission(Organizer)
            .channels(ChannelRestrictions::TOURNAMENT)
            .helpers(ACCOUNT_AND_TOURNAMENT)
            .doc("Start the tournament")
            .build(),
    )?;
    registry.register(
        CommandDescriptor::builder("reset", organizer::handle_reset)
            .min_permission(Organizer)
            .channels(ChannelRestrictions::TOURNAMENT)
            .helpers(ACCOUNT_AND_TOURNAMENT)
            .doc("Reset the tournament, clearing every score")
            .build(),
    )?;
    registry.register(
        CommandDescriptor::builder("checkin_start", organizer::handle_checkin_start)
            .min_permission(Organizer)
            .channels(ChannelRestrictions::TOURNAMENT)
            .helpers(&[Helper::TournamentId])
            .doc("Open check-ins for participants")
            .build(),
    )?;
    registry.register(
        CommandDescriptor::builder("checkin_stop", organizer::handle_checkin_stop)
            .min_permission(Organizer)
            .channels(ChannelRestrictions::TOURNAMENT)
            .helpers(ACCOUNT_AND_TOURNAMENT)
            .doc("Close check-ins and remove participants who did not check in")
            .build(),
    )?;
    registry.register(
        CommandDescriptor::builder("finalize", organizer::handle_finalize)
            .min_permission(Organizer)
            .channels(ChannelRestrictions::TOURNAMENT)
            .helpers(ACCOUNT_AND_TOURNAMENT)
            .doc("Finalize the tournament once every match is complete")
            .build(),
    )?;
    registry.register(
        CommandDescriptor::builder("reopen", organizer::handle_reopen)
            .required_args(&["player1", "player2"])
            .min_permission(Organizer)
            .channels(ChannelRestrictions::TOURNAMENT)
            .helpers(ACCOUNT_AND_TOURNAMENT)
            .doc("Reopen the last match played between two participants\nArguments:\nplayer1 -- first participant\nplayer2 -- second participant")
            .build(),
    )?;

    // Participant
    registry.register(
        CommandDescriptor::builder("update", participant::handle_update)
            .required_args(&["score"])
            .min_permission(Participant)
            .channels(ChannelRestrictions::TOURNAMENT)
            .helpers(ACCOUNT_AND_TOURNAMENT)
            .doc("Report the score of your open match\nArgument:\nscore -- your sets first, e.g. 2-0,1-2,2-1")
            .build(),
    )?;
    registry.register(
        CommandDescriptor::builder("forfeit", participant::handle_forfeit)
            .min_permission(Participant)
            .channels(ChannelRestrictions::TOURNAMENT)
            .helpers(ACCOUNT_AND_TOURNAMENT)
            .doc("Leave the tournament, forfeiting your remaining matches")
            .build(),
    )?;
    registry.register(
        CommandDescriptor::builder("next", participant::handle_next)
            .min_permission(Participant)
            .channels(ChannelRestrictions::TOURNAMENT)
            .helpers(ACCOUNT_AND_TOURNAMENT)
            .doc("Show your next match")
            .build(),
    )?;
    registry.register(
        CommandDescriptor::builder("checkin", participant::handle_checkin)
            .min_permission(Participant)
            .channels(ChannelRestrictions::TOURNAMENT)
            .helpers(ACCOUNT_AND_TOURNAMENT)
            .doc("Confirm you are here while check-ins are open")
            .build(),
    )?;

    // User
    registry.register(
        CommandDescriptor::builder("username", user::handle_username)
            .required_args(&["username"])
            .channels(ChannelRestrictions::ANY)
            .doc("Set your Challonge username\nArgument:\nusername -- if you don't have one, sign up for free at https://challonge.com/users/new")
            .build(),
    )?;
    registry.register(
        CommandDescriptor::builder("help", user::handle_help)
            .optional_args(&["command"])
            .channels(ChannelRestrictions::ANY)
            .doc("Get help on usable commands\nWithout argument, list the commands you can use here\nOptional argument:\ncommand -- the command you want more info on")
            .build(),
    )?;
    registry.register(
        CommandDescriptor::builder("join", user::handle_join)
            .channels(ChannelRestrictions::TOURNAMENT)
            .helpers(ACCOUNT_AND_TOURNAMENT)
            .doc("Join the tournament of this room with your Challonge username")
            .build(),
    )?;
    registry.register(
        CommandDescriptor::builder("feedback", user::handle_feedback)
            .required_args(&["feedback"])
            .channels(ChannelRestrictions::PRIVATE)
            .doc("Send a message to the bot developers\nArgument:\nfeedback -- the rest of the message is sent")
            .build(),
    )?;

    Ok(registry)
}

/// Challonge account resolved by the dispatcher.
fn account(invocation: &Invocation) -> anyhow::Result<&ChallongeRequester> {
    invocation
        .resources
        .account()
        .context("challonge account is not available")
}

/// Challonge id of the tournament resolved by the dispatcher.
fn tournament_id(invocation: &Invocation) -> anyhow::Result<&str> {
    invocation
        .resources
        .tournament_id()
        .context("tournament id is not available")
}

/// Id of the server owning the invoking room.
fn server_id(invocation: &Invocation) -> anyhow::Result<String> {
    invocation
        .settings
        .server_of_channel(&invocation.context.channel.id)
        .map(|(id, _)| id.clone())
        .context("this room does not belong to a managed server")
}

/// Challonge username of the caller, if set.
fn caller_username(invocation: &Invocation) -> Option<String> {
    invocation
        .settings
        .user(&invocation.context.caller.id)
        .and_then(|user| user.challonge_username.clone())
}

/// Required argument bound by the dispatcher.
fn required<'a>(invocation: &'a Invocation, name: &str) -> anyhow::Result<&'a str> {
    invocation
        .args
        .get(name)
        .with_context(|| format!("missing argument {}", name))
}
