//! Registry of every command the bot answers to.

use std::collections::HashMap;

use log::debug;
use thiserror::Error;

use crate::commands::descriptor::CommandDescriptor;

/// Errors raised while registering commands.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    /// The name or an alias is already taken by a registered command, or the
    /// descriptor repeats one of its own names.
    #[error("command name or alias '{0}' is already registered")]
    DuplicateName(String),
}

/// Insertion-ordered set of command descriptors with lookup by name or alias.
#[derive(Debug, Default)]
pub struct Registry {
    /// Descriptors in registration order
    commands: Vec<CommandDescriptor>,
    /// Every name and alias mapped to its index in `commands`
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a descriptor.
    ///
    /// Every name and alias of the descriptor is checked before anything is
    /// inserted, so a failed registration leaves the registry untouched.
    pub fn register(&mut self, descriptor: CommandDescriptor) -> Result<(), RegistrationError> {
        let mut names: Vec<&str> = Vec::new();
        for name in descriptor.names() {
            if self.index.contains_key(name) || names.contains(&name) {
                return Err(RegistrationError::DuplicateName(name.to_string()));
            }
            names.push(name);
        }

        let position = self.commands.len();
        for name in names {
            self.index.insert(name.to_string(), position);
        }

        debug!("registered command {}", descriptor.name());
        self.commands.push(descriptor);

        Ok(())
    }

    /// Exact, case-sensitive lookup by name or alias.
    pub fn resolve(&self, token: &str) -> Option<&CommandDescriptor> {
        self.index.get(token).map(|&position| &self.commands[position])
    }

    /// Descriptors in registration order.
    pub fn list(&self) -> &[CommandDescriptor] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Table of every command for diagnostics.
    pub fn dump(&self) -> String {
        let mut lines = vec![format!(
            "{:<16}{:<24}{:<14}{}",
            "name", "aliases", "permission", "channels"
        )];

        lines.extend(self.commands.iter().map(|command| {
            format!(
                "{:<16}{:<24}{:<14}{}",
                command.name(),
                command.aliases().join(","),
                command.min_permission().to_string(),
                command.restrictions()
            )
        }));

        lines.join("\n")
    }
}
