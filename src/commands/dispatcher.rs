//! Message dispatch: from raw text to a handler invocation.
//!
//! A message goes through the following steps, stopping early when it is not
//! a command or when a check fails:
//!
//! ```text
//! Received → Tokenized → Resolved → Validated → Bound → Invoked → Done
//! ```
//!
//! - **Tokenized**: the body is split on whitespace; the first token must be
//!   the trigger unless the message mentions the bot. The second token is the
//!   command name or alias. A message mentioning the bot may start with the
//!   command directly: the transport removes the mention from the body.
//! - **Resolved**: unknown commands are ignored without any reply.
//! - **Validated**: see [`validator`](crate::commands::validator); rejections
//!   are reported in the invoking channel.
//! - **Bound**: required parameters take the tokens following the command in
//!   order, then optional parameters take what is left. Extra tokens are ignored.
//! - Helpers declared by the command are resolved, then the handler runs.

use std::{fmt, sync::Arc};

use log::{debug, error, info};

use crate::{
    commands::{
        CommandResult,
        descriptor::CommandDescriptor,
        markdown_response::{format_handler_failure, format_rejection, format_resolve_error},
        permissions::{
            AccessPolicy, Caller, Channel, ChannelClass, PermissionLevel, classify_caller,
            classify_channel,
        },
        registry::Registry,
        resources::{ResolveError, ResourceResolver, Resources},
        validator::{Rejection, validate},
    },
    settings::Settings,
};

/// Message received from the chat transport.
#[derive(Clone, Debug)]
pub struct IncomingMessage {
    /// Text of the message, without the leading mention of the bot if any
    pub body: String,
    pub caller: Caller,
    pub channel: Channel,
    /// Whether the message mentions the bot
    pub addressed: bool,
}

/// Everything known about one command invocation before its handler runs.
#[derive(Clone, Debug)]
pub struct InvocationContext {
    /// Whitespace separated tokens of the message, trigger and command included.
    /// The trigger is always the first token, even when the message only
    /// mentioned the bot.
    pub tokens: Vec<String>,
    pub caller: Caller,
    pub channel: Channel,
    pub permission: PermissionLevel,
    pub channel_class: ChannelClass,
}

/// Parameter values bound from the message, in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Arguments {
    values: Vec<(String, String)>,
}

impl Arguments {
    /// Value bound to the parameter `name`, if a token was supplied for it.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        write!(f, "[{}]", pairs.join(", "))
    }
}

/// Input of a handler body.
pub struct Invocation {
    pub context: InvocationContext,
    pub args: Arguments,
    pub resources: Resources,
    /// Settings as they were when the message was received
    pub settings: Settings,
    pub registry: Arc<Registry>,
    pub policy: AccessPolicy,
    pub trigger: String,
}

/// How the dispatch of one message ended.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Not a command for the bot
    Ignored,
    /// Validation failed; `reply` goes to the invoking channel
    Rejected {
        command: String,
        rejection: Rejection,
        reply: String,
    },
    /// A helper could not be resolved; `reply` goes to the invoking channel
    Unresolved {
        command: String,
        error: ResolveError,
        reply: String,
    },
    /// The handler ran
    Completed {
        command: String,
        result: CommandResult,
    },
    /// The handler failed; `reply` goes privately to the caller
    Failed {
        command: String,
        error: anyhow::Error,
        reply: String,
    },
}

/// Splits a message body on whitespace.
pub fn tokenize(body: &str) -> Vec<String> {
    body.split_whitespace().map(str::to_string).collect()
}

/// Binds argument tokens (the tokens following the command) to the parameters
/// of `descriptor`.
///
/// Missing optional parameters are absent from the result.
pub fn bind_arguments(descriptor: &CommandDescriptor, tokens: &[String]) -> Arguments {
    let values = descriptor
        .required()
        .iter()
        .chain(descriptor.optional())
        .zip(tokens)
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    Arguments { values }
}

/// Resolves, validates and invokes commands.
pub struct Dispatcher<R: ResourceResolver> {
    registry: Arc<Registry>,
    resolver: R,
    trigger: String,
    policy: AccessPolicy,
}

impl<R: ResourceResolver> Dispatcher<R> {
    /// Creates a dispatcher.
    ///
    /// # Arguments
    ///
    /// * `registry` - Every command, shared with the handlers for `help` and `dump`
    /// * `resolver` - Source of the helpers commands declare
    /// * `trigger` - Prefix marking a message as a command, e.g. `>>>`
    /// * `policy` - Developer ids and rooms from the configuration
    ///
    /// # Examples
    ///
    /// ```no_run
    /// let dispatcher = Dispatcher::new(
    ///     Arc::new(build_registry()?),
    ///     ChallongeResolver::new(DEFAULT_URL),
    ///     ">>>",
    ///     AccessPolicy::default(),
    /// );
    /// ```
    pub fn new(registry: Arc<Registry>, resolver: R, trigger: &str, policy: AccessPolicy) -> Self {
        Dispatcher {
            registry,
            resolver,
            trigger: trigger.to_string(),
            policy,
        }
    }

    /// Commands known to the dispatcher.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Tokens of a message addressed to the bot, trigger first.
    ///
    /// A message mentioning the bot does not need the trigger: it is inserted
    /// so the command is always the second token.
    fn command_tokens(&self, message: &IncomingMessage) -> Option<Vec<String>> {
        let mut tokens = tokenize(&message.body);
        if tokens.first() != Some(&self.trigger) {
            if !message.addressed {
                return None;
            }
            tokens.insert(0, self.trigger.clone());
        }

        (tokens.len() >= 2).then_some(tokens)
    }

    /// Returns `true` if the message may be a command, without looking at the
    /// settings. Cheap enough to run on every room message.
    pub fn is_command(&self, message: &IncomingMessage) -> bool {
        self.command_tokens(message).is_some()
    }

    /// Builds the invocation context of a message, or `None` if the message is
    /// not addressed to the bot.
    pub fn context(&self, message: &IncomingMessage, settings: &Settings) -> Option<InvocationContext> {
        let tokens = self.command_tokens(message)?;

        Some(InvocationContext {
            permission: classify_caller(&message.caller, &message.channel, &self.policy, settings),
            channel_class: classify_channel(&message.channel, &self.policy, settings),
            tokens,
            caller: message.caller.clone(),
            channel: message.channel.clone(),
        })
    }

    /// Runs the whole pipeline for one message.
    pub async fn dispatch(&self, message: &IncomingMessage, settings: Settings) -> DispatchOutcome {
        let Some(context) = self.context(message, &settings) else {
            return DispatchOutcome::Ignored;
        };
        debug!("tokenized {:?}", context.tokens);

        let command = context.tokens[1].clone();
        let Some(descriptor) = self.registry.resolve(&command) else {
            debug!("no command named {}", command);
            return DispatchOutcome::Ignored;
        };
        debug!("resolved {} to {}", command, descriptor.name());

        let supplied = context.tokens.len() - 2;
        if let Err(rejection) = validate(descriptor, &context, supplied) {
            debug!(
                "rejected {} from {} ({}, {}): {}",
                descriptor.name(),
                context.caller.id,
                context.permission,
                context.channel_class,
                rejection
            );
            let reply = format_rejection(&command, &rejection);
            return DispatchOutcome::Rejected {
                command,
                rejection,
                reply,
            };
        }
        debug!("validated {}", descriptor.name());

        let args = bind_arguments(descriptor, &context.tokens[2..]);
        debug!("bound {}", args);

        let mut resources = Resources::default();
        for &helper in descriptor.helpers() {
            match self.resolver.resolve(helper, &context, &settings).await {
                Ok(resource) => resources.insert(helper, resource),
                Err(error) => {
                    debug!("could not resolve {} for {}: {}", helper, command, error);
                    let reply = format_resolve_error(&command, &error);
                    return DispatchOutcome::Unresolved {
                        command,
                        error,
                        reply,
                    };
                }
            }
        }

        info!(
            "invoking {} for {} in {}",
            descriptor.name(),
            context.caller.id,
            context.channel.id
        );

        let invocation = Invocation {
            context,
            args,
            resources,
            settings,
            registry: Arc::clone(&self.registry),
            policy: self.policy.clone(),
            trigger: self.trigger.clone(),
        };

        match (descriptor.handler())(invocation).await {
            Ok(result) => {
                debug!("{} completed", descriptor.name());
                DispatchOutcome::Completed {
                    command: descriptor.name().to_string(),
                    result,
                }
            }
            Err(error) => {
                error!("{} failed: {:#}", descriptor.name(), error);
                let reply = format_handler_failure(&command, &error);
                DispatchOutcome::Failed {
                    command: descriptor.name().to_string(),
                    error,
                    reply,
                }
            }
        }
    }
}
