//! External resources injected into handlers before they run.
//!
//! A command declares the [`Helper`]s it needs; the dispatcher asks a
//! [`ResourceResolver`] for each of them after validation succeeded.

use std::{collections::HashMap, fmt};

use mockall::automock;
use thiserror::Error;

use crate::{
    challonge::ChallongeRequester,
    commands::dispatcher::InvocationContext,
    settings::Settings,
};

/// Resource a command needs before it can run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Helper {
    /// Challonge client authenticated as the owner of the invoking server
    Account,
    /// Challonge id of the tournament linked to the invoking room
    TournamentId,
}

impl Helper {
    pub fn key(self) -> &'static str {
        match self {
            Helper::Account => "account",
            Helper::TournamentId => "tournament_id",
        }
    }
}

impl fmt::Display for Helper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A resolved helper.
#[derive(Clone, Debug)]
pub enum Resource {
    Account(ChallongeRequester),
    TournamentId(String),
}

/// Why a helper could not be resolved.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("this room does not belong to a managed server")]
    NoServer,
    #[error("the server owner has not set their Challonge username and API key")]
    MissingCredentials,
    #[error("no tournament is linked to this room")]
    TournamentNotLinked,
}

/// Resolved helpers of one invocation, by helper.
#[derive(Clone, Debug, Default)]
pub struct Resources {
    values: HashMap<Helper, Resource>,
}

impl Resources {
    pub fn insert(&mut self, helper: Helper, resource: Resource) {
        self.values.insert(helper, resource);
    }

    pub fn account(&self) -> Option<&ChallongeRequester> {
        match self.values.get(&Helper::Account) {
            Some(Resource::Account(account)) => Some(account),
            _ => None,
        }
    }

    pub fn tournament_id(&self) -> Option<&str> {
        match self.values.get(&Helper::TournamentId) {
            Some(Resource::TournamentId(id)) => Some(id),
            _ => None,
        }
    }
}

#[automock]
pub trait ResourceResolver {
    async fn resolve(
        &self,
        helper: Helper,
        context: &InvocationContext,
        settings: &Settings,
    ) -> Result<Resource, ResolveError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helper_keys() {
        assert_eq!(Helper::Account.key(), "account");
        assert_eq!(Helper::TournamentId.to_string(), "tournament_id");
    }

    #[test]
    fn test_resources_accessors() {
        let mut resources = Resources::default();
        assert!(resources.account().is_none());
        assert!(resources.tournament_id().is_none());

        resources.insert(
            Helper::TournamentId,
            Resource::TournamentId("42".to_string()),
        );
        resources.insert(
            Helper::Account,
            Resource::Account(ChallongeRequester::new(
                &reqwest::Client::new(),
                "http://localhost",
                "a",
                "secret12",
            )),
        );

        assert_eq!(resources.tournament_id(), Some("42"));
        assert_eq!(resources.account().unwrap().username(), "a");
        assert!(!format!("{:?}", resources).contains("secret12"));
    }
}
