//! Permission levels and channel classification.
//!
//! Both classifications are pure functions of the caller, the channel, the
//! access policy from the configuration and a read-only view of the settings.
//! Unknown callers are [`PermissionLevel::User`] and unknown channels are
//! [`ChannelClass::Other`].

use std::{fmt, ops::BitOr};

use crate::settings::Settings;

/// Ordered permission levels. Comparisons follow declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PermissionLevel {
    User,
    Participant,
    Organizer,
    ServerOwner,
    Dev,
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PermissionLevel::User => "User",
            PermissionLevel::Participant => "Participant",
            PermissionLevel::Organizer => "Organizer",
            PermissionLevel::ServerOwner => "ServerOwner",
            PermissionLevel::Dev => "Dev",
        };
        f.write_str(name)
    }
}

/// Functional role of a single channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelClass {
    /// Direct conversation with the bot
    Private,
    /// Management room of a server
    Mods,
    /// Room linked to a tournament
    Tournament,
    /// Room attached to a server, waiting for a tournament
    NewTourney,
    /// Configured developer room
    Dev,
    /// Any other room
    Other,
}

impl ChannelClass {
    /// Flag of this class inside a [`ChannelRestrictions`] set.
    pub fn flag(self) -> ChannelRestrictions {
        match self {
            ChannelClass::Private => ChannelRestrictions::PRIVATE,
            ChannelClass::Mods => ChannelRestrictions::MODS,
            ChannelClass::Tournament => ChannelRestrictions::TOURNAMENT,
            ChannelClass::NewTourney => ChannelRestrictions::NEW_TOURNEY,
            ChannelClass::Dev => ChannelRestrictions::DEV,
            ChannelClass::Other => ChannelRestrictions::OTHER,
        }
    }
}

impl fmt::Display for ChannelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Set of channel classes a command may run in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelRestrictions(u8);

impl ChannelRestrictions {
    pub const PRIVATE: Self = Self(1 << 0);
    pub const MODS: Self = Self(1 << 1);
    pub const TOURNAMENT: Self = Self(1 << 2);
    pub const NEW_TOURNEY: Self = Self(1 << 3);
    pub const DEV: Self = Self(1 << 4);
    pub const OTHER: Self = Self(1 << 5);
    /// Every channel class
    pub const ANY: Self = Self(0b11_1111);

    const NAMED: [(Self, &'static str); 6] = [
        (Self::PRIVATE, "Private"),
        (Self::MODS, "Mods"),
        (Self::TOURNAMENT, "Tournament"),
        (Self::NEW_TOURNEY, "NewTourney"),
        (Self::DEV, "Dev"),
        (Self::OTHER, "Other"),
    ];

    /// Returns `true` if `class` belongs to the set.
    pub fn contains(self, class: ChannelClass) -> bool {
        self.0 & class.flag().0 != 0
    }

    /// Returns `true` if a command with these restrictions may run in a channel
    /// of the given class. A [`ChannelClass::Dev`] channel satisfies any set.
    pub fn is_satisfied_by(self, class: ChannelClass) -> bool {
        class == ChannelClass::Dev || self.contains(class)
    }
}

impl BitOr for ChannelRestrictions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl Default for ChannelRestrictions {
    fn default() -> Self {
        Self::OTHER
    }
}

impl fmt::Display for ChannelRestrictions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::ANY {
            return f.write_str("Any");
        }

        let names = Self::NAMED
            .iter()
            .filter(|(flag, _)| self.0 & flag.0 != 0)
            .map(|(_, name)| *name)
            .collect::<Vec<&str>>();

        if names.is_empty() {
            f.write_str("None")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

/// Identity of the user who sent a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller {
    /// Matrix user id
    pub id: String,
}

/// Identity of the room a message was sent in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Channel {
    /// Matrix room id
    pub id: String,
    /// Whether the room is a direct conversation
    pub is_private: bool,
}

/// Developer accounts and rooms taken from the configuration.
#[derive(Clone, Debug, Default)]
pub struct AccessPolicy {
    pub dev_ids: Vec<String>,
    pub dev_rooms: Vec<String>,
}

/// Returns the permission level of `caller` in `channel`.
pub fn classify_caller(
    caller: &Caller,
    channel: &Channel,
    policy: &AccessPolicy,
    settings: &Settings,
) -> PermissionLevel {
    if policy.dev_ids.contains(&caller.id) {
        return PermissionLevel::Dev;
    }

    let server = settings.server_of_channel(&channel.id).map(|(_, s)| s);

    let is_owner = match server {
        Some(server) => server.owner_id == caller.id,
        None => channel.is_private && settings.owns_any_server(&caller.id),
    };
    if is_owner {
        return PermissionLevel::ServerOwner;
    }

    let Some(server) = server else {
        return PermissionLevel::User;
    };

    if server.promoted.contains(&caller.id) {
        return PermissionLevel::Organizer;
    }

    if server
        .tournaments
        .get(&channel.id)
        .is_some_and(|link| link.participants.contains(&caller.id))
    {
        return PermissionLevel::Participant;
    }

    PermissionLevel::User
}

/// Returns the functional class of `channel`.
pub fn classify_channel(channel: &Channel, policy: &AccessPolicy, settings: &Settings) -> ChannelClass {
    if policy.dev_rooms.contains(&channel.id) {
        return ChannelClass::Dev;
    }

    if channel.is_private {
        return ChannelClass::Private;
    }

    let Some((_, server)) = settings.server_of_channel(&channel.id) else {
        return ChannelClass::Other;
    };

    if server.management_channel == channel.id {
        ChannelClass::Mods
    } else if server.tournaments.contains_key(&channel.id) {
        ChannelClass::Tournament
    } else if server.rooms.contains(&channel.id) {
        ChannelClass::NewTourney
    } else {
        ChannelClass::Other
    }
}
