//! Participant commands. The caller is found in the Challonge tournament by
//! the username they registered with `username`.

use futures::FutureExt;
use log::debug;

use crate::{
    challonge::{
        Requester,
        flows::{ScoreReport, find_participant, forfeit, next_match, report_score},
        score::verify_score_format,
    },
    commands::{
        CommandResult, Invocation, Reply,
        actions::{HandlerFuture, account, caller_username, required, tournament_id},
        markdown_response::{
            format_checked_in, format_checkin_closed, format_forfeit, format_next_match,
            format_not_participant, format_score_report, format_username_missing,
        },
    },
    settings::SettingsChange,
};

/// Reply asking the caller to set their username first.
fn username_missing(invocation: &Invocation) -> CommandResult {
    CommandResult::reply_in_channel(format_username_missing(&invocation.trigger))
}

/// Reports the score of the caller's open match, written from their side.
///
/// A malformed score is refused before Challonge is queried.
pub fn handle_update(invocation: Invocation) -> HandlerFuture {
    async move {
        debug!("handling update command");

        let score = required(&invocation, "score")?;
        if !verify_score_format(score) {
            return Ok(CommandResult::reply_in_channel(format_score_report(
                &ScoreReport::InvalidScore,
            )));
        }

        let Some(username) = caller_username(&invocation) else {
            return Ok(username_missing(&invocation));
        };

        let report = report_score(
            account(&invocation)?,
            tournament_id(&invocation)?,
            &username,
            score,
        )
        .await?;

        Ok(CommandResult::reply_in_channel(format_score_report(&report)))
    }
    .boxed()
}

/// Removes the caller from the tournament, forfeiting their remaining matches.
pub fn handle_forfeit(invocation: Invocation) -> HandlerFuture {
    async move {
        debug!("handling forfeit command");

        let Some(username) = caller_username(&invocation) else {
            return Ok(username_missing(&invocation));
        };

        if !forfeit(account(&invocation)?, tournament_id(&invocation)?, &username).await? {
            return Ok(CommandResult::reply_in_channel(format_not_participant()));
        }

        Ok(CommandResult {
            replies: vec![Reply::channel(format_forfeit(&username))],
            settings_changes: vec![SettingsChange::RemoveParticipant {
                room_id: invocation.context.channel.id.clone(),
                user_id: invocation.context.caller.id.clone(),
            }],
            ..Default::default()
        })
    }
    .boxed()
}

/// Tells the caller who they play next.
pub fn handle_next(invocation: Invocation) -> HandlerFuture {
    async move {
        debug!("handling next command");

        let Some(username) = caller_username(&invocation) else {
            return Ok(username_missing(&invocation));
        };

        let next = next_match(account(&invocation)?, tournament_id(&invocation)?, &username).await?;

        Ok(CommandResult::reply_in_channel(format_next_match(
            &username, &next,
        )))
    }
    .boxed()
}

/// Checks the caller in while check-ins are open in the room.
pub fn handle_checkin(invocation: Invocation) -> HandlerFuture {
    async move {
        debug!("handling checkin command");

        let open = invocation
            .settings
            .tournament(&invocation.context.channel.id)
            .is_some_and(|link| link.checkin_open);
        if !open {
            return Ok(CommandResult::reply_in_channel(format_checkin_closed()));
        }

        let Some(username) = caller_username(&invocation) else {
            return Ok(username_missing(&invocation));
        };

        let requester = account(&invocation)?;
        let tournament_id = tournament_id(&invocation)?;
        let Some(participant) = find_participant(requester, tournament_id, &username).await? else {
            return Ok(CommandResult::reply_in_channel(format_not_participant()));
        };

        let participant = requester
            .check_in_participant(tournament_id, participant.id)
            .await?;

        Ok(CommandResult::reply_in_channel(format_checked_in(
            participant.label(),
        )))
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;
    use crate::commands::actions::tests::{CUP, OWNER, PLAYER, create_settings, invocation};

    const PARTICIPANTS_BODY: &str = r#"[{"participant": {"id": 1, "name": "Alice", "challonge_username": "alice"}}, {"participant": {"id": 2, "name": "Bob", "challonge_username": "bob"}}]"#;

    async fn mock_participants(server: &mut mockito::ServerGuard) {
        server
            .mock("GET", "/tournaments/42/participants.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(PARTICIPANTS_BODY)
            .create_async()
            .await;
    }

    #[tokio::test]
    async fn test_handle_update() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        mock_participants(&mut server).await;
        server
            .mock("GET", "/tournaments/42/matches.json")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("state".to_owned(), "open".to_owned()),
                Matcher::UrlEncoded("participant_id".to_owned(), "1".to_owned()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"match": {"id": 5, "state": "open", "player1_id": 2, "player2_id": 1, "round": 1}}]"#)
            .create_async()
            .await;
        let update = server
            .mock("PUT", "/tournaments/42/matches/5.json")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("match[scores_csv]".to_owned(), "0-2,1-2".to_owned()),
                Matcher::UrlEncoded("match[winner_id]".to_owned(), "1".to_owned()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"match": {"id": 5, "state": "complete", "player1_id": 2, "player2_id": 1, "winner_id": 1}}"#)
            .create_async()
            .await;

        let result = handle_update(invocation(
            ">>> update 2-0,2-1",
            PLAYER,
            CUP,
            create_settings(),
            Some(&url),
        ))
        .await
        .unwrap();

        update.assert_async().await;
        assert_eq!(
            result.replies[0].body,
            "✅ These results have been uploaded to Challonge. Winner: **Alice**"
        );
    }

    #[tokio::test]
    async fn test_handle_update_malformed_score() {
        let mut server = mockito::Server::new_async().await;
        let participants = server
            .mock("GET", "/tournaments/42/participants.json")
            .expect(0)
            .create_async()
            .await;

        let result = handle_update(invocation(
            ">>> update 2:0",
            PLAYER,
            CUP,
            create_settings(),
            Some(&server.url()),
        ))
        .await
        .unwrap();

        participants.assert_async().await;
        assert_eq!(
            result.replies[0].body,
            "❌ Invalid score format, expected sets like `2-0,1-2,2-1`"
        );
    }

    #[tokio::test]
    async fn test_handle_update_without_username() {
        let server = mockito::Server::new_async().await;

        let result = handle_update(invocation(
            ">>> update 2-0",
            OWNER,
            CUP,
            create_settings(),
            Some(&server.url()),
        ))
        .await
        .unwrap();

        assert_eq!(
            result.replies[0].body,
            "❌ Set your Challonge username first with `>>> username <username>`"
        );
    }

    #[tokio::test]
    async fn test_handle_forfeit() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        mock_participants(&mut server).await;
        let delete = server
            .mock("DELETE", "/tournaments/42/participants/1.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"participant": {"id": 1}}"#)
            .create_async()
            .await;

        let result = handle_forfeit(invocation(">>> forfeit", PLAYER, CUP, create_settings(), Some(&url)))
            .await
            .unwrap();

        delete.assert_async().await;
        assert_eq!(
            result.settings_changes,
            [SettingsChange::RemoveParticipant {
                room_id: CUP.to_string(),
                user_id: PLAYER.to_string()
            }]
        );
        assert_eq!(result.replies[0].body, "🏳️ alice forfeited the tournament");
    }

    #[tokio::test]
    async fn test_handle_next() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        mock_participants(&mut server).await;
        server
            .mock("GET", "/tournaments/42/matches.json")
            .match_query(Matcher::UrlEncoded("state".to_owned(), "open".to_owned()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"match": {"id": 5, "state": "open", "player1_id": 1, "player2_id": 2, "round": 1}}]"#)
            .create_async()
            .await;
        server
            .mock("GET", "/tournaments/42/participants/2.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"participant": {"id": 2, "name": "Bob"}}"#)
            .create_async()
            .await;

        let result = handle_next(invocation(">>> next", PLAYER, CUP, create_settings(), Some(&url)))
            .await
            .unwrap();

        assert_eq!(
            result.replies[0].body,
            "✅ alice, you have an open match 🆚 Bob"
        );
    }

    #[tokio::test]
    async fn test_handle_checkin_closed() {
        let server = mockito::Server::new_async().await;

        let result = handle_checkin(invocation(
            ">>> checkin",
            PLAYER,
            CUP,
            create_settings(),
            Some(&server.url()),
        ))
        .await
        .unwrap();

        assert_eq!(result.replies[0].body, format_checkin_closed());
    }

    #[tokio::test]
    async fn test_handle_checkin() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        mock_participants(&mut server).await;
        let check_in = server
            .mock("POST", "/tournaments/42/participants/1/check_in.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"participant": {"id": 1, "name": "Alice", "checked_in": true}}"#)
            .create_async()
            .await;

        let mut settings = create_settings();
        settings.apply(SettingsChange::SetCheckIn {
            room_id: CUP.to_string(),
            open: true,
        });

        let result = handle_checkin(invocation(">>> checkin", PLAYER, CUP, settings, Some(&url)))
            .await
            .unwrap();

        check_in.assert_async().await;
        assert_eq!(result.replies[0].body, "✅ Alice is checked in");
    }
}
