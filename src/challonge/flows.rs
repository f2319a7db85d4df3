//! Multi-request tournament operations built on a [`Requester`].

use log::{debug, info};
use reqwest::Error;

use crate::challonge::{
    requester::{MatchState, Requester},
    response_structs::{Match, Participant},
    score::{author_is_winner, reverse_score},
};

/// Result of a score report.
#[derive(Debug, PartialEq)]
pub enum ScoreReport {
    /// The match was updated; `scores_csv` is oriented player1-player2
    Uploaded {
        match_id: u64,
        scores_csv: String,
        winner: String,
    },
    NotParticipant,
    NoOpenMatch,
    InvalidScore,
}

/// Where a participant stands in the bracket.
#[derive(Debug, PartialEq)]
pub enum NextMatch {
    /// An open match against `opponent`
    Open { opponent: String },
    /// A pending match waiting for the winner (or loser) of another match
    Waiting {
        loser: bool,
        players: (String, String),
    },
    /// A pending match waiting for several matches to complete
    WaitingForSeveral,
    /// A pending match with no known dependency
    Pending,
    /// No pending nor open match left
    Eliminated,
    NotParticipant,
}

/// Result of reopening the match between two players.
#[derive(Debug, PartialEq)]
pub enum Reopen {
    Reopened { match_id: u64 },
    PlayerNotFound(String),
    NoMatch,
}

/// Finds the participant designated by `name` in the tournament.
pub async fn find_participant<R: Requester>(
    requester: &R,
    tournament_id: &str,
    name: &str,
) -> Result<Option<Participant>, Error> {
    let participants = requester.participants(tournament_id).await?;
    Ok(participants.into_iter().find(|p| p.is_named(name)))
}

/// Reports the score of the open match of `username`, written from their
/// point of view, and picks the winner from the sets.
pub async fn report_score<R: Requester>(
    requester: &R,
    tournament_id: &str,
    username: &str,
    score: &str,
) -> Result<ScoreReport, Error> {
    let Some(author_wins) = author_is_winner(score) else {
        return Ok(ScoreReport::InvalidScore);
    };

    let Some(participant) = find_participant(requester, tournament_id, username).await? else {
        debug!("{} is not a participant of {}", username, tournament_id);
        return Ok(ScoreReport::NotParticipant);
    };

    let open_matches = requester
        .matches(tournament_id, MatchState::Open, Some(participant.id))
        .await?;
    let Some(current) = open_matches.into_iter().next() else {
        return Ok(ScoreReport::NoOpenMatch);
    };
    let Some(opponent_id) = current.opponent_of(participant.id) else {
        return Ok(ScoreReport::NoOpenMatch);
    };

    let scores_csv = if current.player1_id == Some(participant.id) {
        score.to_string()
    } else {
        match reverse_score(score) {
            Some(reversed) => reversed,
            None => return Ok(ScoreReport::InvalidScore),
        }
    };

    let winner_id = if author_wins {
        participant.id
    } else {
        opponent_id
    };

    requester
        .update_match(tournament_id, current.id, &scores_csv, winner_id)
        .await?;

    let winner = if author_wins {
        participant.label().to_string()
    } else {
        requester
            .show_participant(tournament_id, opponent_id)
            .await?
            .label()
            .to_string()
    };

    info!(
        "score {} uploaded for match {} of {}",
        scores_csv, current.id, tournament_id
    );

    Ok(ScoreReport::Uploaded {
        match_id: current.id,
        scores_csv,
        winner,
    })
}

/// Looks up the next match of `username`.
pub async fn next_match<R: Requester>(
    requester: &R,
    tournament_id: &str,
    username: &str,
) -> Result<NextMatch, Error> {
    let Some(participant) = find_participant(requester, tournament_id, username).await? else {
        return Ok(NextMatch::NotParticipant);
    };

    let open_matches = requester
        .matches(tournament_id, MatchState::Open, Some(participant.id))
        .await?;
    if let Some(open) = open_matches.first() {
        let opponent = match open.opponent_of(participant.id) {
            Some(opponent_id) => requester
                .show_participant(tournament_id, opponent_id)
                .await?
                .label()
                .to_string(),
            None => "?".to_string(),
        };
        return Ok(NextMatch::Open { opponent });
    }

    let pending_matches = requester
        .matches(tournament_id, MatchState::Pending, Some(participant.id))
        .await?;
    let Some(pending) = pending_matches.first() else {
        return Ok(NextMatch::Eliminated);
    };

    awaited_match(requester, tournament_id, pending, participant.id).await
}

/// Describes which match a pending match is waiting on.
async fn awaited_match<R: Requester>(
    requester: &R,
    tournament_id: &str,
    pending: &Match,
    participant_id: u64,
) -> Result<NextMatch, Error> {
    let dependency = if pending.player1_id == Some(participant_id) {
        pending
            .player2_prereq_match_id
            .map(|id| (id, pending.player2_is_prereq_match_loser))
    } else if pending.player2_id == Some(participant_id) {
        pending
            .player1_prereq_match_id
            .map(|id| (id, pending.player1_is_prereq_match_loser))
    } else {
        None
    };

    let Some((awaited_id, loser)) = dependency else {
        return Ok(NextMatch::Pending);
    };

    let awaited = requester.show_match(tournament_id, awaited_id).await?;
    let (Some(player1_id), Some(player2_id)) = (awaited.player1_id, awaited.player2_id) else {
        return Ok(NextMatch::WaitingForSeveral);
    };

    let player1 = requester.show_participant(tournament_id, player1_id).await?;
    let player2 = requester.show_participant(tournament_id, player2_id).await?;

    Ok(NextMatch::Waiting {
        loser,
        players: (player1.label().to_string(), player2.label().to_string()),
    })
}

/// Reopens the most recent completed match between two players.
pub async fn reopen_between<R: Requester>(
    requester: &R,
    tournament_id: &str,
    first: &str,
    second: &str,
) -> Result<Reopen, Error> {
    let participants = requester.participants(tournament_id).await?;

    let Some(first_id) = participants.iter().find(|p| p.is_named(first)).map(|p| p.id) else {
        return Ok(Reopen::PlayerNotFound(first.to_string()));
    };
    let Some(second_id) = participants.iter().find(|p| p.is_named(second)).map(|p| p.id) else {
        return Ok(Reopen::PlayerNotFound(second.to_string()));
    };

    let completed = requester
        .matches(tournament_id, MatchState::Complete, Some(first_id))
        .await?;
    let Some(target) = completed
        .iter()
        .filter(|m| m.opposes(first_id, second_id))
        .max_by_key(|m| m.round.abs())
    else {
        return Ok(Reopen::NoMatch);
    };

    requester.reopen_match(tournament_id, target.id).await?;

    Ok(Reopen::Reopened {
        match_id: target.id,
    })
}

/// Removes `username` from the tournament, forfeiting their remaining matches.
/// Returns `false` if they are not a participant.
pub async fn forfeit<R: Requester>(
    requester: &R,
    tournament_id: &str,
    username: &str,
) -> Result<bool, Error> {
    let Some(participant) = find_participant(requester, tournament_id, username).await? else {
        return Ok(false);
    };

    requester
        .remove_participant(tournament_id, participant.id)
        .await?;

    Ok(true)
}
