//! Declarative command descriptors.
//!
//! A [`CommandDescriptor`] is built once at start-up through
//! [`DescriptorBuilder`] and never changes afterwards.
//!
//! ```ignore
//! let update = CommandDescriptor::builder("update", handle_update)
//!     .required_args(&["score"])
//!     .min_permission(PermissionLevel::Participant)
//!     .channels(ChannelRestrictions::TOURNAMENT)
//!     .helpers(&[Helper::Account, Helper::TournamentId])
//!     .doc("Report the score of your current match")
//!     .build();
//! ```

use std::fmt;

use futures::future::BoxFuture;

use crate::commands::{
    CommandResult,
    dispatcher::Invocation,
    permissions::{ChannelRestrictions, PermissionLevel},
    resources::Helper,
};

/// Handler body of a command.
pub type Handler = fn(Invocation) -> BoxFuture<'static, anyhow::Result<CommandResult>>;

/// Immutable description of one invocable command.
#[derive(Clone)]
pub struct CommandDescriptor {
    name: String,
    aliases: Vec<String>,
    required: Vec<String>,
    optional: Vec<String>,
    min_permission: PermissionLevel,
    restrictions: ChannelRestrictions,
    helpers: Vec<Helper>,
    doc: String,
    handler: Handler,
}

impl CommandDescriptor {
    /// Starts a descriptor with the default requirements: [`PermissionLevel::User`]
    /// in [`ChannelRestrictions::OTHER`] channels, no parameters.
    ///
    /// # Arguments
    ///
    /// * `name` - Primary name, matched case-insensitively by the registry
    /// * `handler` - Function run once the invocation is validated
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let ping = CommandDescriptor::builder("ping", handle_ping)
    ///     .doc("Check that the bot answers")
    ///     .build();
    /// ```
    pub fn builder(name: &str, handler: Handler) -> DescriptorBuilder {
        DescriptorBuilder {
            descriptor: CommandDescriptor {
                name: name.to_string(),
                aliases: Vec::new(),
                required: Vec::new(),
                optional: Vec::new(),
                min_permission: PermissionLevel::User,
                restrictions: ChannelRestrictions::default(),
                helpers: Vec::new(),
                doc: String::new(),
                handler,
            },
        }
    }

    /// Primary name, shown by `help`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Other names resolving to this command.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Names of the arguments that must be supplied, in binding order.
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Names of the arguments bound after the required ones when present.
    pub fn optional(&self) -> &[String] {
        &self.optional
    }

    /// Lowest level allowed to run the command.
    pub fn min_permission(&self) -> PermissionLevel {
        self.min_permission
    }

    /// Channel classes the command may be run from.
    pub fn restrictions(&self) -> ChannelRestrictions {
        self.restrictions
    }

    /// Resources resolved before the handler runs.
    pub fn helpers(&self) -> &[Helper] {
        &self.helpers
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }

    pub fn handler(&self) -> Handler {
        self.handler
    }

    /// Name followed by every alias.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("min_permission", &self.min_permission)
            .field("restrictions", &self.restrictions)
            .field("helpers", &self.helpers)
            .finish_non_exhaustive()
    }
}

/// Chained configuration of a [`CommandDescriptor`].
pub struct DescriptorBuilder {
    descriptor: CommandDescriptor,
}

impl DescriptorBuilder {
    pub fn aliases(mut self, aliases: &[&str]) -> Self {
        self.descriptor.aliases = to_strings(aliases);
        self
    }

    pub fn required_args(mut self, names: &[&str]) -> Self {
        self.descriptor.required = to_strings(names);
        self
    }

    pub fn optional_args(mut self, names: &[&str]) -> Self {
        self.descriptor.optional = to_strings(names);
        self
    }

    pub fn min_permission(mut self, level: PermissionLevel) -> Self {
        self.descriptor.min_permission = level;
        self
    }

    pub fn channels(mut self, restrictions: ChannelRestrictions) -> Self {
        self.descriptor.restrictions = restrictions;
        self
    }

    pub fn helpers(mut self, helpers: &[Helper]) -> Self {
        self.descriptor.helpers = helpers.to_vec();
        self
    }

    /// Human readable documentation shown by `help <command>`.
    pub fn doc(mut self, doc: &str) -> Self {
        self.descriptor.doc = doc.to_string();
        self
    }

    pub fn build(self) -> CommandDescriptor {
        self.descriptor
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use futures::FutureExt;

    use super::*;

    pub(crate) fn noop_handler(_: Invocation) -> BoxFuture<'static, anyhow::Result<CommandResult>> {
        async { Ok(CommandResult::default()) }.boxed()
    }

    #[test]
    fn test_builder_defaults() {
        let descriptor = CommandDescriptor::builder("reset", noop_handler).build();

        assert_eq!(descriptor.name(), "reset");
        assert!(descriptor.aliases().is_empty());
        assert!(descriptor.required().is_empty());
        assert!(descriptor.optional().is_empty());
        assert!(descriptor.helpers().is_empty());
        assert_eq!(descriptor.min_permission(), PermissionLevel::User);
        assert_eq!(descriptor.restrictions(), ChannelRestrictions::OTHER);
    }

    #[test]
    fn test_builder_chaining() {
        let descriptor = CommandDescriptor::builder("shuffleseeds", noop_handler)
            .aliases(&["shuffle", "randomize"])
            .optional_args(&["what"])
            .required_args(&["a", "b"])
            .min_permission(PermissionLevel::Organizer)
            .channels(ChannelRestrictions::TOURNAMENT)
            .helpers(&[Helper::Account, Helper::TournamentId])
            .doc("Shuffle tournament seeds")
            .build();

        assert_eq!(descriptor.aliases(), ["shuffle", "randomize"]);
        assert_eq!(descriptor.required(), ["a", "b"]);
        assert_eq!(descriptor.optional(), ["what"]);
        assert_eq!(descriptor.min_permission(), PermissionLevel::Organizer);
        assert_eq!(descriptor.restrictions(), ChannelRestrictions::TOURNAMENT);
        assert_eq!(descriptor.helpers(), [Helper::Account, Helper::TournamentId]);
        assert_eq!(descriptor.doc(), "Shuffle tournament seeds");
    }

    #[test]
    fn test_names_start_with_name() {
        let descriptor = CommandDescriptor::builder("shutdown", noop_handler)
            .aliases(&["exit", "out"])
            .build();

        assert_eq!(
            descriptor.names().collect::<Vec<&str>>(),
            ["shutdown", "exit", "out"]
        );
    }
}
