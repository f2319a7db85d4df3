//! Developer commands: shutdown, state dumps, log levels and announcements.

use futures::FutureExt;
use log::{LevelFilter, debug, info};

use crate::{
    commands::{
        CommandResult, Invocation, Reply,
        actions::HandlerFuture,
        markdown_response::{
            format_announced, format_announcement, format_code_block, format_invalid_log_level,
            format_log_level, format_logging_out,
        },
    },
    logging,
    settings::Settings,
    utils::paginate,
};

/// Maximum length of one dumped page, below the message size most clients render.
const PAGE_SIZE: usize = 1700;

/// Replies in the channel, then asks the bot to stop. The bot saves the
/// settings before exiting.
pub fn handle_shutdown(_invocation: Invocation) -> HandlerFuture {
    async move {
        debug!("handling shutdown command");
        info!("shutdown requested");

        Ok(CommandResult {
            replies: vec![Reply::channel(format_logging_out())],
            shutdown: true,
            ..Default::default()
        })
    }
    .boxed()
}

/// Sends the registry and the settings to the caller, split in pages.
pub fn handle_dump(invocation: Invocation) -> HandlerFuture {
    async move {
        debug!("handling dump command");

        let what = invocation.args.get("what").unwrap_or("all");
        let mut sections = Vec::new();
        if matches!(what, "all" | "commands") {
            sections.push(invocation.registry.dump());
        }
        if matches!(what, "all" | "servers") {
            sections.push(serde_json::to_string_pretty(&invocation.settings.servers)?);
        }
        if matches!(what, "all" | "users") {
            sections.push(dump_users(&invocation.settings));
        }
        if sections.is_empty() {
            return Ok(CommandResult::reply_in_channel(format!(
                "Nothing to dump for `{}`, use commands, servers or users",
                what
            )));
        }

        let replies = sections
            .iter()
            .flat_map(|section| paginate(section, PAGE_SIZE))
            .map(|page| Reply::caller(format_code_block(&page)))
            .collect();

        Ok(CommandResult {
            replies,
            ..Default::default()
        })
    }
    .boxed()
}

/// One line per user. API keys are never printed.
fn dump_users(settings: &Settings) -> String {
    let mut lines: Vec<String> = settings
        .users
        .iter()
        .map(|(id, user)| {
            format!(
                "{} username={} api_key={}",
                id,
                user.challonge_username.as_deref().unwrap_or("-"),
                if user.api_key.is_some() { "set" } else { "unset" }
            )
        })
        .collect();
    lines.sort();

    if lines.is_empty() {
        "no users".to_owned()
    } else {
        lines.join("\n")
    }
}

/// Changes the global log level, or the level of the module path given as
/// `what`.
pub fn handle_log(invocation: Invocation) -> HandlerFuture {
    async move {
        debug!("handling log command");

        let level = invocation.args.get("level").unwrap_or_default();
        let Ok(filter) = level.parse::<LevelFilter>() else {
            return Ok(CommandResult::reply_in_channel(format_invalid_log_level(
                level,
            )));
        };
        let target = invocation.args.get("what");

        logging::set_level(filter, target);
        info!("log level of {} set to {}", target.unwrap_or("everything"), filter);

        Ok(CommandResult::reply_in_channel(format_log_level(
            &filter.to_string().to_lowercase(),
            target,
        )))
    }
    .boxed()
}

/// Sends the rest of the message privately to the owner of every server.
pub fn handle_announce(invocation: Invocation) -> HandlerFuture {
    async move {
        debug!("handling announce command");

        let announcement = invocation.context.tokens[2..].join(" ");
        let message = format_announcement(&announcement);

        let mut owners: Vec<&str> = invocation
            .settings
            .servers
            .values()
            .map(|server| server.owner_id.as_str())
            .collect();
        owners.sort_unstable();
        owners.dedup();
        info!("announcing to {} server owners", owners.len());

        let mut replies: Vec<Reply> = owners
            .iter()
            .map(|owner| Reply::user(owner, message.clone()))
            .collect();
        replies.push(Reply::channel(format_announced(owners.len())));

        Ok(CommandResult {
            replies,
            ..Default::default()
        })
    }
    .boxed()
}
