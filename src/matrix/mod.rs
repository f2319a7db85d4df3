//! Matrix transport of the bot.
//!
//! - [`MatrixClient`] sends messages to rooms and users, leaves rooms and runs
//!   the sync loop
//! - the login submodule creates or restores the SDK session
//! - the session submodule persists the SDK session and the sync token
//! - the sync submodule turns room events into [`IncomingMessage`]s and
//!   [`RoomInvite`]s
//!
//! [`IncomingMessage`]: crate::commands::IncomingMessage

mod client;
mod login;
mod session;
mod sync;

pub use crate::matrix::client::MatrixClient;

/// User credentials for a Matrix account
#[derive(Debug, Clone)]
pub struct UserCredentials {
    /// User ID of the matrix account
    pub user_id: String,
    /// Password of the matrix account
    pub password: String,
}

/// The bot joined a room it was invited into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInvite {
    pub room_id: String,
    /// User who sent the invite
    pub inviter_id: String,
    /// Whether the room is a direct conversation
    pub is_direct: bool,
}
