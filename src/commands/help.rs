//! Command documentation and the list of commands a caller may use.
//!
//! Authorization goes through [`check_access`], the same checks the dispatcher
//! runs, so help never advertises a command that would be rejected.

use crate::commands::{
    descriptor::CommandDescriptor,
    dispatcher::InvocationContext,
    registry::Registry,
    validator::check_access,
};

/// One line usage, e.g. `reopen <player1> <player2> [note]`.
pub fn usage(descriptor: &CommandDescriptor) -> String {
    let mut parts = vec![descriptor.name().to_string()];
    parts.extend(descriptor.required().iter().map(|p| format!("<{}>", p)));
    parts.extend(descriptor.optional().iter().map(|p| format!("[{}]", p)));
    parts.join(" ")
}

/// Full documentation of a command.
pub fn describe(descriptor: &CommandDescriptor, trigger: &str) -> String {
    let mut lines = vec![format!("**{}**", descriptor.name())];

    if !descriptor.aliases().is_empty() {
        lines.push(format!("Aliases: {}", descriptor.aliases().join(", ")));
    }

    lines.push(format!("Usage: `{} {}`", trigger, usage(descriptor)));

    if !descriptor.doc().is_empty() {
        lines.push(String::new());
        lines.push(descriptor.doc().to_string());
    }

    lines.join("\n")
}

/// Commands the caller may run in the current channel, in registration order.
pub fn list_authorized<'a>(
    registry: &'a Registry,
    context: &InvocationContext,
) -> Vec<&'a CommandDescriptor> {
    registry
        .list()
        .iter()
        .filter(|descriptor| check_access(descriptor, context).is_ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{
        actions::build_registry,
        descriptor::tests::noop_handler,
        permissions::{Caller, Channel, ChannelClass, ChannelRestrictions, PermissionLevel},
        validator::{Rejection, validate},
    };

    fn context(permission: PermissionLevel, channel_class: ChannelClass) -> InvocationContext {
        InvocationContext {
            tokens: Vec::new(),
            caller: Caller {
                id: "@user:example.com".to_string(),
            },
            channel: Channel {
                id: "!room:example.com".to_string(),
                is_private: false,
            },
            permission,
            channel_class,
        }
    }

    const LEVELS: [PermissionLevel; 5] = [
        PermissionLevel::User,
        PermissionLevel::Participant,
        PermissionLevel::Organizer,
        PermissionLevel::ServerOwner,
        PermissionLevel::Dev,
    ];

    const CLASSES: [ChannelClass; 6] = [
        ChannelClass::Private,
        ChannelClass::Mods,
        ChannelClass::Tournament,
        ChannelClass::NewTourney,
        ChannelClass::Dev,
        ChannelClass::Other,
    ];

    #[test]
    fn test_usage() {
        let descriptor = CommandDescriptor::builder("reopen", noop_handler)
            .required_args(&["player1", "player2"])
            .optional_args(&["note"])
            .build();

        assert_eq!(usage(&descriptor), "reopen <player1> <player2> [note]");
    }

    #[test]
    fn test_describe() {
        let descriptor = CommandDescriptor::builder("shutdown", noop_handler)
            .aliases(&["exit", "out"])
            .doc("Stop the bot")
            .build();

        assert_eq!(
            describe(&descriptor, ">>>"),
            "**shutdown**\nAliases: exit, out\nUsage: `>>> shutdown`\n\nStop the bot"
        );
    }

    #[test]
    fn test_describe_every_name_and_alias() {
        let registry = build_registry().unwrap();

        for descriptor in registry.list() {
            for name in descriptor.names() {
                let resolved = registry.resolve(name).unwrap();
                let description = describe(resolved, ">>>");
                assert!(!description.is_empty());
                assert!(description.contains(descriptor.name()));
            }
        }
    }

    #[test]
    fn test_list_authorized_matches_validation() {
        let registry = build_registry().unwrap();

        for level in LEVELS {
            for class in CLASSES {
                let ctx = context(level, class);
                let authorized = list_authorized(&registry, &ctx);

                for descriptor in registry.list() {
                    let allowed = !matches!(
                        validate(descriptor, &ctx, 0),
                        Err(Rejection::InsufficientPrivileges) | Err(Rejection::WrongChannel)
                    );
                    let listed = authorized.iter().any(|d| d.name() == descriptor.name());
                    assert_eq!(allowed, listed, "{} {:?} {:?}", descriptor.name(), level, class);
                }
            }
        }
    }

    #[test]
    fn test_user_help_in_any_channel() {
        let registry = build_registry().unwrap();
        let ctx = context(PermissionLevel::User, ChannelClass::Other);

        let names: Vec<&str> = list_authorized(&registry, &ctx)
            .iter()
            .map(|d| d.name())
            .collect();

        let expected: Vec<&str> = registry
            .list()
            .iter()
            .filter(|d| {
                d.min_permission() <= PermissionLevel::User
                    && d.restrictions().contains(ChannelClass::Other)
            })
            .map(|d| d.name())
            .collect();

        assert_eq!(names, expected);
        assert_eq!(names, ["username", "help"]);
    }

    #[test]
    fn test_list_keeps_registration_order() {
        let mut registry = Registry::new();
        for name in ["b", "a", "c"] {
            registry
                .register(
                    CommandDescriptor::builder(name, noop_handler)
                        .channels(ChannelRestrictions::ANY)
                        .build(),
                )
                .unwrap();
        }

        let ctx = context(PermissionLevel::User, ChannelClass::Mods);
        let names: Vec<&str> = list_authorized(&registry, &ctx)
            .iter()
            .map(|d| d.name())
            .collect();
        assert_eq!(names, ["b", "a", "c"]);
    }
}
