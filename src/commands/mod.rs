//! Command registry, authorization and dispatch.
//!
//! # Overview
//!
//! Every command is declared once at start-up as a [`CommandDescriptor`]
//! and registered in the [`Registry`]. Incoming messages go through the
//! [`Dispatcher`]:
//!
//! ```text
//! Matrix Message
//!      │
//!      ▼
//! ┌──────────────┐   tokenize, trigger or mention
//! │  Dispatcher  │── registry.resolve(token[1])
//! └──────────────┘── validator: permission → channel → arity
//!      │             bind arguments, resolve helpers
//!      ▼
//! ┌──────────────┐
//! │   Handler    │   returns a CommandResult
//! └──────────────┘
//!      │
//!      ▼
//! ┌──────────────────────┐
//! │  CommandResult       │
//! │  - replies           │
//! │  - settings changes  │
//! │  - rooms to leave    │
//! └──────────────────────┘
//! ```
//!
//! Handlers never touch shared state: the bot applies the returned
//! [`CommandResult`] after the handler completed.
//!
//! # Command Structure
//!
//! All commands follow the format `>>> <command> [args...]`. Mentioning the bot
//! instead of using the trigger works the same way.
//!
//! # Module Organization
//!
//! - [`permissions`] - permission levels and channel classes
//! - [`descriptor`] - command descriptors and their builder
//! - [`registry`] - registration and lookup
//! - [`validator`] - authorization and arity checks
//! - [`dispatcher`] - tokenizing, binding and invocation
//! - [`resources`] - helpers injected into handlers
//! - [`help`] - documentation and authorized command lists
//! - [`actions`] - handler bodies
//! - [`markdown_response`] - message templates

pub mod actions;
pub mod descriptor;
pub mod dispatcher;
pub mod help;
mod markdown_response;
pub mod permissions;
pub mod registry;
pub mod resources;
pub mod validator;

pub use crate::commands::dispatcher::{
    DispatchOutcome, Dispatcher, IncomingMessage, Invocation, InvocationContext,
};
pub use crate::commands::permissions::{AccessPolicy, Caller, Channel};
pub use crate::commands::registry::Registry;
pub use crate::commands::resources::{Helper, ResolveError, Resource, ResourceResolver};

use crate::settings::SettingsChange;

/// Destination of a reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// The room the command was sent in
    Channel,
    /// A direct conversation with the caller
    Caller,
    /// Any room known by id
    Room(String),
    /// A direct conversation with any user known by id
    User(String),
}

/// Markdown message to send once the command completed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub target: Target,
    pub body: String,
}

impl Reply {
    pub fn channel(body: String) -> Self {
        Reply {
            target: Target::Channel,
            body,
        }
    }

    pub fn caller(body: String) -> Self {
        Reply {
            target: Target::Caller,
            body,
        }
    }

    pub fn room(room_id: &str, body: String) -> Self {
        Reply {
            target: Target::Room(room_id.to_string()),
            body,
        }
    }

    pub fn user(user_id: &str, body: String) -> Self {
        Reply {
            target: Target::User(user_id.to_string()),
            body,
        }
    }
}

/// Result of command execution.
///
/// Command handlers don't directly modify state. Instead, they return state
/// change requests that the bot applies in order once the handler returns.
#[derive(Debug, Default)]
pub struct CommandResult {
    /// Messages to send
    pub replies: Vec<Reply>,
    /// Settings modifications
    pub settings_changes: Vec<SettingsChange>,
    /// Rooms the bot must leave
    pub leave_rooms: Vec<String>,
    /// Whether the bot must stop
    pub shutdown: bool,
}

impl CommandResult {
    /// A result with a single reply in the invoking channel.
    pub fn reply_in_channel(body: String) -> Self {
        CommandResult {
            replies: vec![Reply::channel(body)],
            ..Default::default()
        }
    }
}
