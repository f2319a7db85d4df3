//! HTTP client for the Challonge v1 API.
//!
//! Requests are authenticated with HTTP basic auth, using the Challonge
//! username and API key of the server owner.

use std::fmt;

use log::{debug, info};
use mockall::automock;
use reqwest::{Client, Error, RequestBuilder};

use crate::challonge::response_structs::{
    Match, MatchEnvelope, Participant, ParticipantEnvelope, Tournament, TournamentEnvelope,
};

/// State changes applied to a whole tournament.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TournamentAction {
    Start,
    Reset,
    Finalize,
    ProcessCheckIns,
}

impl TournamentAction {
    fn path(self) -> &'static str {
        match self {
            TournamentAction::Start => "start",
            TournamentAction::Reset => "reset",
            TournamentAction::Finalize => "finalize",
            TournamentAction::ProcessCheckIns => "process_check_ins",
        }
    }
}

/// Match state filter of the match index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchState {
    Pending,
    Open,
    Complete,
}

impl MatchState {
    fn as_str(self) -> &'static str {
        match self {
            MatchState::Pending => "pending",
            MatchState::Open => "open",
            MatchState::Complete => "complete",
        }
    }
}

/// Parameters of a new tournament.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTournament {
    pub name: String,
    pub url: String,
    /// `single elimination` or `double elimination`
    pub tournament_type: String,
    /// Organization subdomain hosting the tournament
    pub subdomain: Option<String>,
}

/// Challonge client authenticated as one user.
#[derive(Clone)]
pub struct ChallongeRequester {
    url: String,
    username: String,
    api_key: String,
    client: Client,
}

impl fmt::Debug for ChallongeRequester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChallongeRequester")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("api_key", &"<hidden>")
            .finish()
    }
}

#[automock]
pub trait Requester {
    async fn create_tournament(&self, tournament: &NewTournament) -> Result<Tournament, Error>;
    async fn show_tournament(&self, tournament_id: &str) -> Result<Tournament, Error>;
    async fn tournament_action(
        &self,
        tournament_id: &str,
        action: TournamentAction,
    ) -> Result<Tournament, Error>;
    async fn randomize_participants(&self, tournament_id: &str) -> Result<Vec<Participant>, Error>;
    async fn participants(&self, tournament_id: &str) -> Result<Vec<Participant>, Error>;
    async fn show_participant(
        &self,
        tournament_id: &str,
        participant_id: u64,
    ) -> Result<Participant, Error>;
    async fn add_participant(
        &self,
        tournament_id: &str,
        challonge_username: &str,
    ) -> Result<Participant, Error>;
    async fn remove_participant(&self, tournament_id: &str, participant_id: u64)
    -> Result<(), Error>;
    async fn check_in_participant(
        &self,
        tournament_id: &str,
        participant_id: u64,
    ) -> Result<Participant, Error>;
    async fn matches(
        &self,
        tournament_id: &str,
        state: MatchState,
        participant_id: Option<u64>,
    ) -> Result<Vec<Match>, Error>;
    async fn show_match(&self, tournament_id: &str, match_id: u64) -> Result<Match, Error>;
    async fn update_match(
        &self,
        tournament_id: &str,
        match_id: u64,
        scores_csv: &str,
        winner_id: u64,
    ) -> Result<Match, Error>;
    async fn reopen_match(&self, tournament_id: &str, match_id: u64) -> Result<Match, Error>;
}

impl ChallongeRequester {
    /// Creates a requester sharing the connection pool of `client`.
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client, cloned (clones share their pool)
    /// * `url` - Base url of the API, with or without a trailing slash
    /// * `username` - Challonge username
    /// * `api_key` - API key of `username`
    ///
    /// # Examples
    ///
    /// ```no_run
    /// let requester = ChallongeRequester::new(&Client::new(), DEFAULT_URL, "alice", "key12345");
    /// ```
    pub fn new(client: &Client, url: &str, username: &str, api_key: &str) -> Self {
        ChallongeRequester {
            url: url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            api_key: api_key.to_string(),
            client: client.clone(),
        }
    }

    /// Challonge username used to authenticate.
    pub fn username(&self) -> &str {
        &self.username
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}.json", self.url, path)
    }

    fn authenticated(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.username, Some(&self.api_key))
    }

    async fn send_tournament(&self, request: RequestBuilder) -> Result<Tournament, Error> {
        let envelope: TournamentEnvelope = self
            .authenticated(request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!("tournament response -> {}", envelope.tournament);
        Ok(envelope.tournament)
    }

    async fn send_participant(&self, request: RequestBuilder) -> Result<Participant, Error> {
        let envelope: ParticipantEnvelope = self
            .authenticated(request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!("participant response -> {:?}", envelope.participant);
        Ok(envelope.participant)
    }

    async fn send_match(&self, request: RequestBuilder) -> Result<Match, Error> {
        let envelope: MatchEnvelope = self
            .authenticated(request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!("match response -> {}", envelope.match_);
        Ok(envelope.match_)
    }

    async fn send_participants(&self, request: RequestBuilder) -> Result<Vec<Participant>, Error> {
        let envelopes: Vec<ParticipantEnvelope> = self
            .authenticated(request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(envelopes.into_iter().map(|e| e.participant).collect())
    }
}

impl Requester for ChallongeRequester {
    async fn create_tournament(&self, tournament: &NewTournament) -> Result<Tournament, Error> {
        let url = self.endpoint("tournaments");
        info!("create tournament {}", tournament.name);

        let mut form = vec![
            ("tournament[name]", tournament.name.clone()),
            ("tournament[url]", tournament.url.clone()),
            ("tournament[tournament_type]", tournament.tournament_type.clone()),
        ];
        if let Some(subdomain) = &tournament.subdomain {
            form.push(("tournament[subdomain]", subdomain.clone()));
        }

        self.send_tournament(self.client.post(&url).form(&form))
            .await
    }

    async fn show_tournament(&self, tournament_id: &str) -> Result<Tournament, Error> {
        let url = self.endpoint(&format!("tournaments/{}", tournament_id));
        debug!("request {}", url);

        self.send_tournament(self.client.get(&url)).await
    }

    async fn tournament_action(
        &self,
        tournament_id: &str,
        action: TournamentAction,
    ) -> Result<Tournament, Error> {
        let url = self.endpoint(&format!("tournaments/{}/{}", tournament_id, action.path()));
        info!("{:?} tournament {}", action, tournament_id);

        self.send_tournament(self.client.post(&url)).await
    }

    async fn randomize_participants(&self, tournament_id: &str) -> Result<Vec<Participant>, Error> {
        let url = self.endpoint(&format!("tournaments/{}/participants/randomize", tournament_id));
        info!("randomize participants of {}", tournament_id);

        self.send_participants(self.client.post(&url)).await
    }

    async fn participants(&self, tournament_id: &str) -> Result<Vec<Participant>, Error> {
        let url = self.endpoint(&format!("tournaments/{}/participants", tournament_id));
        debug!("request {}", url);

        self.send_participants(self.client.get(&url)).await
    }

    async fn show_participant(
        &self,
        tournament_id: &str,
        participant_id: u64,
    ) -> Result<Participant, Error> {
        let url = self.endpoint(&format!(
            "tournaments/{}/participants/{}",
            tournament_id, participant_id
        ));
        debug!("request {}", url);

        self.send_participant(self.client.get(&url)).await
    }

    async fn add_participant(
        &self,
        tournament_id: &str,
        challonge_username: &str,
    ) -> Result<Participant, Error> {
        let url = self.endpoint(&format!("tournaments/{}/participants", tournament_id));
        info!("add {} to tournament {}", challonge_username, tournament_id);

        let form = [("participant[challonge_username]", challonge_username)];
        self.send_participant(self.client.post(&url).form(&form))
            .await
    }

    async fn remove_participant(
        &self,
        tournament_id: &str,
        participant_id: u64,
    ) -> Result<(), Error> {
        let url = self.endpoint(&format!(
            "tournaments/{}/participants/{}",
            tournament_id, participant_id
        ));
        info!("remove participant {} from {}", participant_id, tournament_id);

        self.authenticated(self.client.delete(&url))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    async fn check_in_participant(
        &self,
        tournament_id: &str,
        participant_id: u64,
    ) -> Result<Participant, Error> {
        let url = self.endpoint(&format!(
            "tournaments/{}/participants/{}/check_in",
            tournament_id, participant_id
        ));
        info!("check in participant {} in {}", participant_id, tournament_id);

        self.send_participant(self.client.post(&url)).await
    }

    async fn matches(
        &self,
        tournament_id: &str,
        state: MatchState,
        participant_id: Option<u64>,
    ) -> Result<Vec<Match>, Error> {
        let url = self.endpoint(&format!("tournaments/{}/matches", tournament_id));
        debug!(
            "request {}?state={}&participant_id={:?}",
            url,
            state.as_str(),
            participant_id
        );

        let mut query = vec![("state", state.as_str().to_string())];
        if let Some(participant_id) = participant_id {
            query.push(("participant_id", participant_id.to_string()));
        }

        let envelopes: Vec<MatchEnvelope> = self
            .authenticated(self.client.get(&url).query(&query))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(envelopes.into_iter().map(|e| e.match_).collect())
    }

    async fn show_match(&self, tournament_id: &str, match_id: u64) -> Result<Match, Error> {
        let url = self.endpoint(&format!("tournaments/{}/matches/{}", tournament_id, match_id));
        debug!("request {}", url);

        self.send_match(self.client.get(&url)).await
    }

    async fn update_match(
        &self,
        tournament_id: &str,
        match_id: u64,
        scores_csv: &str,
        winner_id: u64,
    ) -> Result<Match, Error> {
        let url = self.endpoint(&format!("tournaments/{}/matches/{}", tournament_id, match_id));
        info!(
            "update match {} of {} with {}",
            match_id, tournament_id, scores_csv
        );

        let form = [
            ("match[scores_csv]", scores_csv.to_string()),
            ("match[winner_id]", winner_id.to_string()),
        ];
        self.send_match(self.client.put(&url).form(&form)).await
    }

    async fn reopen_match(&self, tournament_id: &str, match_id: u64) -> Result<Match, Error> {
        let url = self.endpoint(&format!(
            "tournaments/{}/matches/{}/reopen",
            tournament_id, match_id
        ));
        info!("reopen match {} of {}", match_id, tournament_id);

        self.send_match(self.client.post(&url)).await
    }
}
