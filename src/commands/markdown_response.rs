//! Markdown messages sent by the bot.

use crate::{
    challonge::{
        Participant,
        flows::{NextMatch, Reopen, ScoreReport},
    },
    commands::{resources::ResolveError, validator::Rejection},
};

pub fn format_rejection(command: &str, rejection: &Rejection) -> String {
    match rejection {
        Rejection::InsufficientPrivileges => format!(
            "❌ You don't have enough privileges to use `{}`.",
            command
        ),
        Rejection::WrongChannel => format!("❌ `{}` cannot be used in this room.", command),
        Rejection::TooFewArguments { expected, supplied } => format!(
            "❌ `{}` expects {} arguments but {} were given.",
            command, expected, supplied
        ),
    }
}

pub fn format_resolve_error(command: &str, error: &ResolveError) -> String {
    format!("❌ Cannot run `{}`: {}.", command, error)
}

pub fn format_handler_failure(command: &str, error: &anyhow::Error) -> String {
    format!("❌ `{}` failed: {:#}", command, error)
}

pub fn format_authorized_commands(usages: &[String]) -> String {
    let lines = usages
        .iter()
        .map(|usage| format!("- `{}`", usage))
        .collect::<Vec<String>>()
        .join("\n");

    format!("`Usable commands for you in this channel:`\n{}", lines)
}

pub fn format_inexistent_command() -> String {
    "Inexistent command or you don't have enough privileges to use it".to_owned()
}

pub fn format_code_block(page: &str) -> String {
    format!("```\n{}\n```", page)
}

pub fn format_logging_out() -> String {
    "logging out...".to_owned()
}

pub fn format_log_level(level: &str, target: Option<&str>) -> String {
    match target {
        Some(target) => format!("Log level of `{}` set to `{}`", target, level),
        None => format!("Log level set to `{}`", level),
    }
}

pub fn format_announcement(announcement: &str) -> String {
    format!("📢 Message from the bot developers:\n```\n{}\n```", announcement)
}

pub fn format_announced(owners: usize) -> String {
    format!("Announcement sent to {} server owner(s)", owners)
}

pub fn format_invalid_log_level(level: &str) -> String {
    format!(
        "Unknown log level `{}`. Use one of off, error, warn, info, debug, trace.",
        level
    )
}

pub fn format_invalid_key() -> String {
    "Error: please check again your key".to_owned()
}

pub fn format_key_stored() -> String {
    "Thanks, your key has been stored!".to_owned()
}

pub fn format_organization(organization: Option<&str>) -> String {
    match organization {
        Some(organization) => format!(
            "Organization **{}** has been set for this server",
            organization
        ),
        None => "Organization has been reset for this server".to_owned(),
    }
}

pub fn format_promoted(member: &str) -> String {
    format!("Member **{}** has been promoted", member)
}

pub fn format_member_not_found(member: &str) -> String {
    format!("Could not find Member **{}**", member)
}

pub fn format_leaving_server() -> String {
    "Goodbye! The bot is leaving every room of this server.".to_owned()
}

pub fn format_invalid_tournament_type(tournament_type: &str) -> String {
    format!(
        "Unknown tournament type `{}`, use `singleelim` or `doubleelim`",
        tournament_type
    )
}

pub fn format_tournament_created(name: &str, url: &str) -> String {
    format!(
        "✅ Tournament **{}** has been created: {}\nEveryone in this room can now `join` it.",
        name, url
    )
}

pub fn format_seeds(participants: &[Participant]) -> String {
    let seeds = participants
        .iter()
        .map(|p| match p.seed {
            Some(seed) => format!("{}. {}", seed, p.label()),
            None => format!("- {}", p.label()),
        })
        .collect::<Vec<String>>()
        .join("\n");

    format!("Seeds for this tournament have been shuffled!\n{}", seeds)
}

pub fn format_tournament_started(url: &str) -> String {
    format!("✅ Tournament has started! Bracket: {}", url)
}

pub fn format_tournament_reset() -> String {
    "Tournament has been reset. Scores are cleared and participants can be edited again.".to_owned()
}

pub fn format_checkin_started() -> String {
    "✅ Check-ins are open! Participants, use `checkin` to confirm you are here.".to_owned()
}

pub fn format_checkin_stopped() -> String {
    "Check-ins are closed. Participants who did not check in have been removed.".to_owned()
}

pub fn format_tournament_finalized(url: &str) -> String {
    format!("🏆 Tournament is finished! Final standings: {}", url)
}

pub fn format_reopen(reopen: &Reopen) -> String {
    match reopen {
        Reopen::Reopened { match_id } => format!("✅ Match {} has been reopened", match_id),
        Reopen::PlayerNotFound(name) => format!("❌ Participant '{}' not found", name),
        Reopen::NoMatch => "❌ These players have no completed match together".to_owned(),
    }
}

pub fn format_score_report(report: &ScoreReport) -> String {
    match report {
        ScoreReport::Uploaded { winner, .. } => format!(
            "✅ These results have been uploaded to Challonge. Winner: **{}**",
            winner
        ),
        ScoreReport::NotParticipant => "❌ You are not a participant of this tournament".to_owned(),
        ScoreReport::NoOpenMatch => "❌ You have no open match to report".to_owned(),
        ScoreReport::InvalidScore => {
            "❌ Invalid score format, expected sets like `2-0,1-2,2-1`".to_owned()
        }
    }
}

pub fn format_next_match(name: &str, next: &NextMatch) -> String {
    match next {
        NextMatch::Open { opponent } => {
            format!("✅ {}, you have an open match 🆚 {}", name, opponent)
        }
        NextMatch::Waiting { loser, players } => format!(
            "✅ {}, you are waiting on the `{}` of {} 🆚 {}",
            name,
            if *loser { "Loser" } else { "Winner" },
            players.0,
            players.1
        ),
        NextMatch::WaitingForSeveral => {
            format!("✅ {}, you are waiting for more than one match", name)
        }
        NextMatch::Pending => format!(
            "✅ {}, you have a pending match. Please wait for it to open",
            name
        ),
        NextMatch::Eliminated => format!(
            "✅ {}, you have no pending nor open match. It seems you're out of the tournament",
            name
        ),
        NextMatch::NotParticipant => format!("❌ Participant '{}' not found", name),
    }
}

pub fn format_forfeit(name: &str) -> String {
    format!("🏳️ {} forfeited the tournament", name)
}

pub fn format_not_participant() -> String {
    "❌ You are not a participant of this tournament".to_owned()
}

pub fn format_checkin_closed() -> String {
    "❌ Check-ins are not open".to_owned()
}

pub fn format_checked_in(name: &str) -> String {
    format!("✅ {} is checked in", name)
}

pub fn format_username_set(username: &str) -> String {
    format!("Your username '{}' has been set!", username)
}

pub fn format_username_missing(trigger: &str) -> String {
    format!(
        "❌ Set your Challonge username first with `{} username <username>`",
        trigger
    )
}

pub fn format_joined(name: &str) -> String {
    format!("✅ {} joined the tournament", name)
}

pub fn format_already_joined() -> String {
    "You already joined this tournament".to_owned()
}

pub fn format_registration_closed(state: &str) -> String {
    format!("❌ Registrations are closed, the tournament is `{}`", state)
}

pub fn format_feedback(sender: &str, feedback: &str) -> String {
    format!("📝 Feedback from {}: {}", sender, feedback)
}

pub fn format_feedback_thanks() -> String {
    "Thanks for your feedback!".to_owned()
}
