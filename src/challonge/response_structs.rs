//! Response structures for the Challonge v1 API.
//!
//! Every object is wrapped in an envelope named after its type, e.g.
//! `{"tournament": {...}}`; lists are arrays of envelopes.

use std::fmt;

use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub(crate) struct TournamentEnvelope {
    pub tournament: Tournament,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ParticipantEnvelope {
    pub participant: Participant,
}

#[derive(Deserialize, Debug)]
pub(crate) struct MatchEnvelope {
    #[serde(rename = "match")]
    pub match_: Match,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Tournament {
    pub id: u64,
    pub name: String,
    pub url: String,
    pub full_challonge_url: String,
    /// `pending`, `underway`, `awaiting_review` or `complete`, plus the
    /// check-in states
    pub state: String,
    pub tournament_type: String,
    #[serde(default)]
    pub participants_count: u64,
}

impl fmt::Display for Tournament {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "id={}, name={}, state={}, type={}",
            self.id, self.name, self.state, self.tournament_type
        )
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Participant {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub challonge_username: Option<String>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub checked_in: bool,
}

impl Participant {
    /// Name shown to users.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.name.as_deref().filter(|n| !n.is_empty()))
            .or(self.challonge_username.as_deref())
            .unwrap_or("?")
    }

    /// Returns `true` if `name` designates this participant, by Challonge
    /// username or by participant name, ignoring case.
    pub fn is_named(&self, name: &str) -> bool {
        [&self.challonge_username, &self.name, &self.display_name]
            .into_iter()
            .flatten()
            .any(|candidate| candidate.eq_ignore_ascii_case(name))
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Match {
    pub id: u64,
    /// `pending`, `open` or `complete`
    pub state: String,
    #[serde(default)]
    pub player1_id: Option<u64>,
    #[serde(default)]
    pub player2_id: Option<u64>,
    #[serde(default)]
    pub winner_id: Option<u64>,
    #[serde(default)]
    pub loser_id: Option<u64>,
    #[serde(default)]
    pub player1_prereq_match_id: Option<u64>,
    #[serde(default)]
    pub player2_prereq_match_id: Option<u64>,
    #[serde(default)]
    pub player1_is_prereq_match_loser: bool,
    #[serde(default)]
    pub player2_is_prereq_match_loser: bool,
    #[serde(default)]
    pub round: i64,
    #[serde(default)]
    pub scores_csv: Option<String>,
}

impl Match {
    /// Returns the id of the other player of the match.
    pub fn opponent_of(&self, participant_id: u64) -> Option<u64> {
        if self.player1_id == Some(participant_id) {
            self.player2_id
        } else if self.player2_id == Some(participant_id) {
            self.player1_id
        } else {
            None
        }
    }

    /// Returns `true` if both participants play this match, in any order.
    pub fn opposes(&self, first: u64, second: u64) -> bool {
        (self.player1_id == Some(first) && self.player2_id == Some(second))
            || (self.player1_id == Some(second) && self.player2_id == Some(first))
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "id={}, state={}, player1={:?}, player2={:?}, round={}",
            self.id, self.state, self.player1_id, self.player2_id, self.round
        )
    }
}
