//! Persisted settings for servers, tournament rooms and users.
//!
//! A server is the community the bot manages in Matrix. It is identified by the
//! id of its management room, the first room its owner invited the bot into.

use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use log::debug;
use serde::{Deserialize, Serialize};

/// Everything the bot remembers between restarts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Servers indexed by their management room id
    #[serde(default)]
    pub servers: HashMap<String, ServerSettings>,
    /// Users indexed by their Matrix user id
    #[serde(default)]
    pub users: HashMap<String, UserSettings>,
}

/// Settings of one managed server.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Matrix user id of the server owner
    pub owner_id: String,
    /// Room used to manage the server
    pub management_channel: String,
    /// Optional Challonge organization (subdomain) used for new tournaments
    #[serde(default)]
    pub organization: Option<String>,
    /// Members allowed to organize tournaments
    #[serde(default)]
    pub promoted: HashSet<String>,
    /// Rooms attached to the server but not linked to a tournament yet
    #[serde(default)]
    pub rooms: HashSet<String>,
    /// Tournament rooms indexed by room id
    #[serde(default)]
    pub tournaments: HashMap<String, TournamentLink>,
}

/// Link between a room and a Challonge tournament.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TournamentLink {
    /// Challonge tournament id
    pub challonge_id: String,
    /// Tournament display name
    pub name: String,
    /// Full Challonge url of the tournament
    pub url: String,
    /// Matrix users who joined the tournament
    #[serde(default)]
    pub participants: HashSet<String>,
    /// Whether participants may check in
    #[serde(default)]
    pub checkin_open: bool,
}

/// Settings of one Matrix user.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Challonge username
    #[serde(default)]
    pub challonge_username: Option<String>,
    /// Challonge API key
    #[serde(default)]
    pub api_key: Option<ApiKey>,
}

/// Challonge API key, stored as given and never printed.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: &str) -> Self {
        ApiKey(key.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<hidden>)")
    }
}

/// A modification requested by a command handler.
///
/// Handlers work on a snapshot and never mutate the settings themselves; the bot
/// applies the requested changes once the handler returns.
#[derive(Clone, Debug, PartialEq)]
pub enum SettingsChange {
    /// Attach an invited room to a server, or create a server from it
    AttachRoom { room_id: String, inviter_id: String },
    /// Store the Challonge API key of a user
    SetApiKey { user_id: String, api_key: ApiKey },
    /// Store the Challonge username of a user
    SetUsername { user_id: String, username: String },
    /// Set or reset the Challonge organization of a server
    SetOrganization {
        server_id: String,
        organization: Option<String>,
    },
    /// Allow a member to organize tournaments on a server
    Promote { server_id: String, user_id: String },
    /// Forget a server and all its rooms
    RemoveServer { server_id: String },
    /// Link a room of a server to a new tournament
    LinkTournament {
        server_id: String,
        room_id: String,
        link: TournamentLink,
    },
    /// Register a user as participant of a tournament room
    AddParticipant { room_id: String, user_id: String },
    /// Remove a user from the participants of a tournament room
    RemoveParticipant { room_id: String, user_id: String },
    /// Open or close check-ins in a tournament room
    SetCheckIn { room_id: String, open: bool },
}

impl Settings {
    /// Finds the server a room belongs to.
    pub fn server_of_channel(&self, room_id: &str) -> Option<(&String, &ServerSettings)> {
        self.servers.iter().find(|(_, server)| server.has_room(room_id))
    }

    /// Returns the tournament linked to a room, if any.
    pub fn tournament(&self, room_id: &str) -> Option<&TournamentLink> {
        self.servers
            .values()
            .find_map(|server| server.tournaments.get(room_id))
    }

    /// Returns `true` if the user owns at least one server.
    pub fn owns_any_server(&self, user_id: &str) -> bool {
        self.servers.values().any(|server| server.owner_id == user_id)
    }

    /// Returns the settings of a user, if any were stored.
    pub fn user(&self, user_id: &str) -> Option<&UserSettings> {
        self.users.get(user_id)
    }

    /// Applies a change requested by a handler or by an invite.
    pub fn apply(&mut self, change: SettingsChange) {
        debug!("applying settings change {:?}", change);

        match change {
            SettingsChange::AttachRoom {
                room_id,
                inviter_id,
            } => self.attach_room(room_id, inviter_id),
            SettingsChange::SetApiKey { user_id, api_key } => {
                self.users.entry(user_id).or_default().api_key = Some(api_key);
            }
            SettingsChange::SetUsername { user_id, username } => {
                self.users.entry(user_id).or_default().challonge_username = Some(username);
            }
            SettingsChange::SetOrganization {
                server_id,
                organization,
            } => {
                if let Some(server) = self.servers.get_mut(&server_id) {
                    server.organization = organization;
                }
            }
            SettingsChange::Promote { server_id, user_id } => {
                if let Some(server) = self.servers.get_mut(&server_id) {
                    server.promoted.insert(user_id);
                }
            }
            SettingsChange::RemoveServer { server_id } => {
                self.servers.remove(&server_id);
            }
            SettingsChange::LinkTournament {
                server_id,
                room_id,
                link,
            } => {
                if let Some(server) = self.servers.get_mut(&server_id) {
                    server.rooms.remove(&room_id);
                    server.tournaments.insert(room_id, link);
                }
            }
            SettingsChange::AddParticipant { room_id, user_id } => {
                if let Some(link) = self.tournament_mut(&room_id) {
                    link.participants.insert(user_id);
                }
            }
            SettingsChange::RemoveParticipant { room_id, user_id } => {
                if let Some(link) = self.tournament_mut(&room_id) {
                    link.participants.remove(&user_id);
                }
            }
            SettingsChange::SetCheckIn { room_id, open } => {
                if let Some(link) = self.tournament_mut(&room_id) {
                    link.checkin_open = open;
                }
            }
        }
    }

    /// Attaches a room to the first server the inviter manages. When the inviter
    /// manages none, the room becomes the management room of a new server they own.
    fn attach_room(&mut self, room_id: String, inviter_id: String) {
        if self.server_of_channel(&room_id).is_some() {
            return;
        }

        let managed = self
            .servers
            .values_mut()
            .find(|server| server.owner_id == inviter_id || server.promoted.contains(&inviter_id));

        match managed {
            Some(server) => {
                server.rooms.insert(room_id);
            }
            None => {
                self.servers.insert(
                    room_id.clone(),
                    ServerSettings {
                        owner_id: inviter_id,
                        management_channel: room_id,
                        ..Default::default()
                    },
                );
            }
        }
    }

    fn tournament_mut(&mut self, room_id: &str) -> Option<&mut TournamentLink> {
        self.servers
            .values_mut()
            .find_map(|server| server.tournaments.get_mut(room_id))
    }
}

impl ServerSettings {
    /// Returns `true` if the room is the management room, an attached room or a
    /// tournament room of this server.
    pub fn has_room(&self, room_id: &str) -> bool {
        self.management_channel == room_id
            || self.rooms.contains(room_id)
            || self.tournaments.contains_key(room_id)
    }
}
