//! Context validation shared by dispatch and help.
//!
//! Checks run in a fixed order and stop at the first failure: permission,
//! channel, then arity. Supplying more arguments than the command declares is
//! accepted; the extra tokens are never bound.

use log::debug;
use thiserror::Error;

use crate::commands::{descriptor::CommandDescriptor, dispatcher::InvocationContext};

/// Reason a command may not run in the current context.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("insufficient privileges")]
    InsufficientPrivileges,
    #[error("command not allowed in this channel")]
    WrongChannel,
    #[error("expected at least {expected} arguments, {supplied} given")]
    TooFewArguments { expected: usize, supplied: usize },
}

/// Permission and channel checks only.
pub fn check_access(
    descriptor: &CommandDescriptor,
    context: &InvocationContext,
) -> Result<(), Rejection> {
    if context.permission < descriptor.min_permission() {
        return Err(Rejection::InsufficientPrivileges);
    }

    if !descriptor
        .restrictions()
        .is_satisfied_by(context.channel_class)
    {
        return Err(Rejection::WrongChannel);
    }

    Ok(())
}

/// Full validation of an invocation with `supplied` arguments.
pub fn validate(
    descriptor: &CommandDescriptor,
    context: &InvocationContext,
    supplied: usize,
) -> Result<(), Rejection> {
    check_access(descriptor, context)?;

    let expected = descriptor.required().len();
    if supplied < expected {
        debug!(
            "{} expects {} arguments, {} supplied",
            descriptor.name(),
            expected,
            supplied
        );
        return Err(Rejection::TooFewArguments { expected, supplied });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{
        descriptor::tests::noop_handler,
        permissions::{Caller, Channel, ChannelClass, ChannelRestrictions, PermissionLevel},
    };

    fn update_descriptor() -> CommandDescriptor {
        CommandDescriptor::builder("update", noop_handler)
            .required_args(&["score"])
            .min_permission(PermissionLevel::Participant)
            .channels(ChannelRestrictions::TOURNAMENT)
            .build()
    }

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

    #[test]
    fn test_authorized() {
        let ctx = context(PermissionLevel::Participant, ChannelClass::Tournament);
        assert_eq!(validate(&update_descriptor(), &ctx, 1), Ok(()));
    }

    #[test]
    fn test_higher_permission_is_authorized() {
        let ctx = context(PermissionLevel::ServerOwner, ChannelClass::Tournament);
        assert_eq!(validate(&update_descriptor(), &ctx, 1), Ok(()));
    }

    #[test]
    fn test_insufficient_privileges() {
        let ctx = context(PermissionLevel::User, ChannelClass::Tournament);
        assert_eq!(
            validate(&update_descriptor(), &ctx, 1),
            Err(Rejection::InsufficientPrivileges)
        );
    }

    #[test]
    fn test_wrong_channel() {
        let ctx = context(PermissionLevel::Participant, ChannelClass::Other);
        assert_eq!(
            validate(&update_descriptor(), &ctx, 1),
            Err(Rejection::WrongChannel)
        );
    }

    #[test]
    fn test_dev_channel_bypass() {
        let ctx = context(PermissionLevel::Participant, ChannelClass::Dev);
        assert_eq!(validate(&update_descriptor(), &ctx, 1), Ok(()));
    }

    #[test]
    fn test_permission_is_checked_before_channel_and_arity() {
        let ctx = context(PermissionLevel::User, ChannelClass::Other);
        assert_eq!(
            validate(&update_descriptor(), &ctx, 0),
            Err(Rejection::InsufficientPrivileges)
        );
    }

    #[test]
    fn test_channel_is_checked_before_arity() {
        let ctx = context(PermissionLevel::Participant, ChannelClass::Mods);
        assert_eq!(
            validate(&update_descriptor(), &ctx, 0),
            Err(Rejection::WrongChannel)
        );
    }

    #[test]
    fn test_arity_is_monotonic() {
        let descriptor = CommandDescriptor::builder("reopen", noop_handler)
            .required_args(&["player1", "player2"])
            .optional_args(&["note"])
            .channels(ChannelRestrictions::ANY)
            .build();
        let ctx = context(PermissionLevel::User, ChannelClass::Other);

        assert_eq!(
            validate(&descriptor, &ctx, 1),
            Err(Rejection::TooFewArguments {
                expected: 2,
                supplied: 1
            })
        );
        for supplied in 2..8 {
            assert_eq!(validate(&descriptor, &ctx, supplied), Ok(()));
        }
    }

    #[test]
    fn test_too_few_arguments_with_none_supplied() {
        let ctx = context(PermissionLevel::Participant, ChannelClass::Tournament);
        assert_eq!(
            validate(&update_descriptor(), &ctx, 0),
            Err(Rejection::TooFewArguments {
                expected: 1,
                supplied: 0
            })
        );
    }

    #[test]
    fn test_check_access_ignores_arity() {
        let ctx = context(PermissionLevel::Participant, ChannelClass::Tournament);
        assert_eq!(check_access(&update_descriptor(), &ctx), Ok(()));
    }
}
