//! Named commands and the table they are dispatched from.
//!
//! The command table is built once at startup and handed to every
//! command it runs, so a command can invoke another one by name
//! (`collect` → `consolidate`).

pub mod collect;
pub mod consolidate;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use crate::error::CommandError;

pub use collect::{CollectCommand, CollectReport, CollectorFactory, Registry};
pub use consolidate::ConsolidateCommand;

#[async_trait]
pub trait Command: Send + Sync {
    /// Name the command is registered and invoked under.
    fn name(&self) -> &'static str;

    /// Runs the command with its positional arguments.
    async fn handle(&self, table: &CommandTable, args: &[String]) -> Result<(), CommandError>;
}

#[derive(Default, Clone)]
pub struct CommandTable {
    commands: BTreeMap<&'static str, Arc<dyn Command>>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `command`, replacing any command with the same name.
    pub fn register(&mut self, command: Arc<dyn Command>) -> &mut Self {
        self.commands.insert(command.name(), command);
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.keys().copied()
    }

    /// Invokes the command registered as `name`.
    pub async fn call(&self, name: &str, args: &[String]) -> Result<(), CommandError> {
        let command = self
            .commands
            .get(name)
            .ok_or_else(|| CommandError::UnknownCommand(name.to_string()))?;

        debug!("call_command {name} {args:?}");
        command.handle(self, args).await
    }
}
