//! Challonge bracket service integration.
//!
//! - [`ChallongeRequester`] - authenticated HTTP client for the v1 REST API
//! - [`flows`] - score reporting, next match lookup and other multi-request operations
//! - [`score`] - parsing and orientation of reported scores
//! - [`ChallongeResolver`] - resolves the `account` and `tournament_id` command helpers

pub mod flows;
mod requester;
mod resolver;
mod response_structs;
pub mod score;

pub use crate::challonge::requester::{
    ChallongeRequester, NewTournament, Requester, TournamentAction,
};
#[cfg(test)]
pub use crate::challonge::requester::MockRequester;
pub use crate::challonge::resolver::ChallongeResolver;
pub use crate::challonge::response_structs::Participant;

/// Default base url of the Challonge API.
pub const DEFAULT_URL: &str = "https://api.challonge.com/v1";
