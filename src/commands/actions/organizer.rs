//! Tournament organizer commands.
//!
//! Every command but `create` runs in a tournament room and acts on the
//! tournament linked to it.

use futures::FutureExt;
use log::{debug, info};

use crate::{
    challonge::{NewTournament, Requester, TournamentAction, flows::reopen_between},
    commands::{
        CommandResult, Invocation, Reply,
        actions::{HandlerFuture, account, required, server_id, tournament_id},
        markdown_response::{
            format_checkin_started, format_checkin_stopped, format_invalid_tournament_type,
            format_reopen, format_seeds, format_tournament_created, format_tournament_finalized,
            format_tournament_reset, format_tournament_started,
        },
    },
    settings::{SettingsChange, TournamentLink},
};

/// Maps the short type names users type to Challonge tournament types.
fn tournament_type(short: &str) -> Option<&'static str> {
    match short.to_lowercase().as_str() {
        "singleelim" => Some("single elimination"),
        "doubleelim" => Some("double elimination"),
        _ => None,
    }
}

/// Creates a tournament and links it to the invoking room.
pub fn handle_create(invocation: Invocation) -> HandlerFuture {
    async move {
        debug!("handling create command");

        let short_type = required(&invocation, "type")?;
        let Some(tournament_type) = tournament_type(short_type) else {
            return Ok(CommandResult::reply_in_channel(
                format_invalid_tournament_type(short_type),
            ));
        };

        let server_id = server_id(&invocation)?;
        let subdomain = invocation
            .settings
            .servers
            .get(&server_id)
            .and_then(|server| server.organization.clone());

        let tournament = account(&invocation)?
            .create_tournament(&NewTournament {
                name: required(&invocation, "name")?.to_string(),
                url: required(&invocation, "url")?.to_string(),
                tournament_type: tournament_type.to_string(),
                subdomain,
            })
            .await?;
        info!("created tournament {}", tournament);

        Ok(CommandResult {
            replies: vec![Reply::channel(format_tournament_created(
                &tournament.name,
                &tournament.full_challonge_url,
            ))],
            settings_changes: vec![SettingsChange::LinkTournament {
                server_id,
                room_id: invocation.context.channel.id.clone(),
                link: TournamentLink {
                    challonge_id: tournament.id.to_string(),
                    name: tournament.name,
                    url: tournament.full_challonge_url,
                    ..Default::default()
                },
            }],
            ..Default::default()
        })
    }
    .boxed()
}

/// Shuffles the seeds of the participants and lists the new order.
pub fn handle_shuffleseeds(invocation: Invocation) -> HandlerFuture {
    async move {
        debug!("handling shuffleseeds command");

        let participants = account(&invocation)?
            .randomize_participants(tournament_id(&invocation)?)
            .await?;

        Ok(CommandResult::reply_in_channel(format_seeds(&participants)))
    }
    .boxed()
}

/// Starts the tournament on Challonge.
pub fn handle_start(invocation: Invocation) -> HandlerFuture {
    async move {
        debug!("handling start command");

        let tournament = account(&invocation)?
            .tournament_action(tournament_id(&invocation)?, TournamentAction::Start)
            .await?;

        Ok(CommandResult::reply_in_channel(format_tournament_started(
            &tournament.full_challonge_url,
        )))
    }
    .boxed()
}

/// Resets a started tournament, discarding every reported score.
pub fn handle_reset(invocation: Invocation) -> HandlerFuture {
    async move {
        debug!("handling reset command");

        account(&invocation)?
            .tournament_action(tournament_id(&invocation)?, TournamentAction::Reset)
            .await?;

        Ok(CommandResult::reply_in_channel(format_tournament_reset()))
    }
    .boxed()
}

/// Opens check-ins locally; participants then confirm with `checkin`.
pub fn handle_checkin_start(invocation: Invocation) -> HandlerFuture {
    async move {
        debug!("handling checkin_start command");

        Ok(CommandResult {
            replies: vec![Reply::channel(format_checkin_started())],
            settings_changes: vec![SettingsChange::SetCheckIn {
                room_id: invocation.context.channel.id.clone(),
                open: true,
            }],
            ..Default::default()
        })
    }
    .boxed()
}

/// Closes check-ins. Challonge removes the participants who did not check in.
pub fn handle_checkin_stop(invocation: Invocation) -> HandlerFuture {
    async move {
        debug!("handling checkin_stop command");

        account(&invocation)?
            .tournament_action(
                tournament_id(&invocation)?,
                TournamentAction::ProcessCheckIns,
            )
            .await?;

        Ok(CommandResult {
            replies: vec![Reply::channel(format_checkin_stopped())],
            settings_changes: vec![SettingsChange::SetCheckIn {
                room_id: invocation.context.channel.id.clone(),
                open: false,
            }],
            ..Default::default()
        })
    }
    .boxed()
}

/// Finalizes a tournament whose matches are all complete.
pub fn handle_finalize(invocation: Invocation) -> HandlerFuture {
    async move {
        debug!("handling finalize command");

        let tournament = account(&invocation)?
            .tournament_action(tournament_id(&invocation)?, TournamentAction::Finalize)
            .await?;

        Ok(CommandResult::reply_in_channel(format_tournament_finalized(
            &tournament.full_challonge_url,
        )))
    }
    .boxed()
}

pub fn handle_reopen(invocation: Invocation) -> HandlerFuture {
    async move {
        debug!("handling reopen command");

        let reopen = reopen_between(
            account(&invocation)?,
            tournament_id(&invocation)?,
            required(&invocation, "player1")?,
            required(&invocation, "player2")?,
        )
        .await?;

        Ok(CommandResult::reply_in_channel(format_reopen(&reopen)))
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;
    use crate::{
        commands::actions::tests::{CUP, MODS, NEW_ROOM, ORGANIZER, create_settings, invocation},
        settings::Settings,
    };

    const CREATED_BODY: &str = r#"{"tournament": {"id": 77, "name": "Spring", "url": "spring", "full_challonge_url": "https://orga.challonge.com/spring", "state": "pending", "tournament_type": "double elimination"}}"#;
    const CUP_BODY: &str = r#"{"tournament": {"id": 42, "name": "Cup", "url": "cup", "full_challonge_url": "https://challonge.com/cup", "state": "underway", "tournament_type": "single elimination"}}"#;

    fn organized_settings() -> Settings {
        let mut settings = create_settings();
        settings.apply(SettingsChange::SetOrganization {
            server_id: MODS.to_string(),
            organization: Some("orga".to_string()),
        });
        settings
    }

    #[test]
    fn test_tournament_type() {
        assert_eq!(tournament_type("singleelim"), Some("single elimination"));
        assert_eq!(tournament_type("DoubleElim"), Some("double elimination"));
        assert_eq!(tournament_type("swiss"), None);
    }

    #[tokio::test]
    async fn test_handle_create() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("POST", "/tournaments.json")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("tournament[name]".to_owned(), "Spring".to_owned()),
                Matcher::UrlEncoded("tournament[url]".to_owned(), "spring".to_owned()),
                Matcher::UrlEncoded(
                    "tournament[tournament_type]".to_owned(),
                    "double elimination".to_owned(),
                ),
                Matcher::UrlEncoded("tournament[subdomain]".to_owned(), "orga".to_owned()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(CREATED_BODY)
            .create_async()
            .await;

        let result = handle_create(invocation(
            ">>> create Spring spring doubleelim",
            ORGANIZER,
            NEW_ROOM,
            organized_settings(),
            Some(&url),
        ))
        .await
        .unwrap();

        mock.assert_async().await;
        assert_eq!(
            result.settings_changes,
            [SettingsChange::LinkTournament {
                server_id: MODS.to_string(),
                room_id: NEW_ROOM.to_string(),
                link: TournamentLink {
                    challonge_id: "77".to_string(),
                    name: "Spring".to_string(),
                    url: "https://orga.challonge.com/spring".to_string(),
                    ..Default::default()
                },
            }]
        );
        assert!(result.replies[0].body.contains("https://orga.challonge.com/spring"));
    }

    #[tokio::test]
    async fn test_handle_create_invalid_type() {
        let server = mockito::Server::new_async().await;

        let result = handle_create(invocation(
            ">>> create Spring spring swiss",
            ORGANIZER,
            NEW_ROOM,
            create_settings(),
            Some(&server.url()),
        ))
        .await
        .unwrap();

        assert!(result.settings_changes.is_empty());
        assert!(result.replies[0].body.contains("swiss"));
    }

    #[tokio::test]
    async fn test_handle_create_challonge_error() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        server
            .mock("POST", "/tournaments.json")
            .with_status(422)
            .with_header("content-type", "application/json")
            .with_body(r#"{"errors": ["URL is already taken"]}"#)
            .create_async()
            .await;

        let result = handle_create(invocation(
            ">>> create Spring spring singleelim",
            ORGANIZER,
            NEW_ROOM,
            create_settings(),
            Some(&url),
        ))
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_handle_shuffleseeds() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        server
            .mock("POST", "/tournaments/42/participants/randomize.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"participant": {"id": 1, "name": "Bob", "seed": 1}}, {"participant": {"id": 2, "name": "Alice", "seed": 2}}]"#,
            )
            .create_async()
            .await;

        let result = handle_shuffleseeds(invocation(
            ">>> shuffle",
            ORGANIZER,
            CUP,
            create_settings(),
            Some(&url),
        ))
        .await
        .unwrap();

        assert_eq!(
            result.replies[0].body,
            "Seeds for this tournament have been shuffled!\n1. Bob\n2. Alice"
        );
    }

    #[tokio::test]
    async fn test_handle_start() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("POST", "/tournaments/42/start.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(CUP_BODY)
            .create_async()
            .await;

        let result = handle_start(invocation(">>> start", ORGANIZER, CUP, create_settings(), Some(&url)))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(
            result.replies[0].body,
            "✅ Tournament has started! Bracket: https://challonge.com/cup"
        );
    }

    #[tokio::test]
    async fn test_handle_reset() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("POST", "/tournaments/42/reset.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(CUP_BODY)
            .create_async()
            .await;

        let result = handle_reset(invocation(">>> reset", ORGANIZER, CUP, create_settings(), Some(&url)))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result.replies[0].body, format_tournament_reset());
    }

    #[tokio::test]
    async fn test_handle_checkin_start() {
        let result = handle_checkin_start(invocation(
            ">>> checkin_start",
            ORGANIZER,
            CUP,
            create_settings(),
            None,
        ))
        .await
        .unwrap();

        assert_eq!(
            result.settings_changes,
            [SettingsChange::SetCheckIn {
                room_id: CUP.to_string(),
                open: true
            }]
        );
    }

    #[tokio::test]
    async fn test_handle_checkin_stop() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("POST", "/tournaments/42/process_check_ins.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(CUP_BODY)
            .create_async()
            .await;

        let result = handle_checkin_stop(invocation(
            ">>> checkin_stop",
            ORGANIZER,
            CUP,
            create_settings(),
            Some(&url),
        ))
        .await
        .unwrap();

        mock.assert_async().await;
        assert_eq!(
            result.settings_changes,
            [SettingsChange::SetCheckIn {
                room_id: CUP.to_string(),
                open: false
            }]
        );
    }

    #[tokio::test]
    async fn test_handle_finalize() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        server
            .mock("POST", "/tournaments/42/finalize.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(CUP_BODY)
            .create_async()
            .await;

        let result = handle_finalize(invocation(">>> finalize", ORGANIZER, CUP, create_settings(), Some(&url)))
            .await
            .unwrap();

        assert!(result.replies[0].body.contains("https://challonge.com/cup"));
    }

    #[tokio::test]
    async fn test_handle_reopen() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        server
            .mock("GET", "/tournaments/42/participants.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"participant": {"id": 1, "name": "Alice"}}, {"participant": {"id": 2, "name": "Bob"}}]"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", "/tournaments/42/matches.json")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("state".to_owned(), "complete".to_owned()),
                Matcher::UrlEncoded("participant_id".to_owned(), "1".to_owned()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"match": {"id": 10, "state": "complete", "player1_id": 1, "player2_id": 2, "round": 1}}, {"match": {"id": 11, "state": "complete", "player1_id": 2, "player2_id": 1, "round": -2}}]"#,
            )
            .create_async()
            .await;
        let reopen = server
            .mock("POST", "/tournaments/42/matches/11/reopen.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"match": {"id": 11, "state": "open", "player1_id": 2, "player2_id": 1, "round": -2}}"#)
            .create_async()
            .await;

        let result = handle_reopen(invocation(
            ">>> reopen alice bob",
            ORGANIZER,
            CUP,
            create_settings(),
            Some(&url),
        ))
        .await
        .unwrap();

        reopen.assert_async().await;
        assert_eq!(result.replies[0].body, "✅ Match 11 has been reopened");
    }
}
