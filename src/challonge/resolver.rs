//! Resolution of the `account` and `tournament_id` helpers from the settings.

use log::debug;
use reqwest::Client;

use crate::{
    challonge::ChallongeRequester,
    commands::{Helper, InvocationContext, ResolveError, Resource, ResourceResolver},
    settings::Settings,
};

/// Builds Challonge clients from the credentials of server owners.
///
/// Every resolved requester shares the connection pool of one HTTP client.
pub struct ChallongeResolver {
    /// Base url of the Challonge API
    url: String,
    client: Client,
}

impl ChallongeResolver {
    /// # Arguments
    ///
    /// * `url` - Base url of the Challonge API, see [`DEFAULT_URL`](crate::challonge::DEFAULT_URL)
    pub fn new(url: &str) -> Self {
        ChallongeResolver {
            url: url.to_string(),
            client: Client::new(),
        }
    }
}

impl ResourceResolver for ChallongeResolver {
    async fn resolve(
        &self,
        helper: Helper,
        context: &InvocationContext,
        settings: &Settings,
    ) -> Result<Resource, ResolveError> {
        debug!("resolving {} for {}", helper, context.channel.id);

        match helper {
            Helper::Account => {
                let Some((_, server)) = settings.server_of_channel(&context.channel.id) else {
                    return Err(ResolveError::NoServer);
                };

                let owner = settings
                    .user(&server.owner_id)
                    .ok_or(ResolveError::MissingCredentials)?;
                let (Some(username), Some(api_key)) = (&owner.challonge_username, &owner.api_key)
                else {
                    return Err(ResolveError::MissingCredentials);
                };

                let requester =
                    ChallongeRequester::new(&self.client, &self.url, username, api_key.as_str());
                debug!("authenticated as {} for {}", requester.username(), context.channel.id);
                Ok(Resource::Account(requester))
            }
            Helper::TournamentId => settings
                .tournament(&context.channel.id)
                .map(|link| Resource::TournamentId(link.challonge_id.clone()))
                .ok_or(ResolveError::TournamentNotLinked),
        }
    }
}
