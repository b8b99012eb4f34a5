//! Console: command table and message log
//!
//! Built-in commands are always present; loaded component systems contribute
//! the rest.

use bevy::log::{debug, info, warn};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::context::Context;
use crate::systems::ComponentSystemManager;

/// Handler invoked with the arguments following the command name
pub type CommandHandler = Arc<dyn Fn(&[&str]) -> anyhow::Result<String> + Send + Sync>;

/// A named console command
#[derive(Clone)]
pub struct ConsoleCommand {
    pub name: String,
    pub help: String,
    handler: CommandHandler,
}

impl ConsoleCommand {
    pub fn new<F>(name: &str, help: &str, handler: F) -> Self
    where
        F: Fn(&[&str]) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        Self {
            name: name.to_ascii_lowercase(),
            help: help.to_string(),
            handler: Arc::new(handler),
        }
    }

    pub fn run(&self, args: &[&str]) -> anyhow::Result<String> {
        (self.handler)(args)
    }
}

impl std::fmt::Debug for ConsoleCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleCommand").field("name", &self.name).finish()
    }
}

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("empty command line")]
    Empty,

    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("command `{command}` failed: {source:#}")]
    Failed {
        command: String,
        #[source]
        source: anyhow::Error,
    },
}

pub trait Console: Send + Sync {
    /// Parse and run one command line, logging the result
    fn execute(&self, line: &str) -> Result<String, ConsoleError>;

    fn add_message(&self, message: &str);

    /// Messages logged so far, oldest first
    fn messages(&self) -> Vec<String>;

    fn command_names(&self) -> Vec<String>;
}

const HELP_COMMAND: &str = "help";

pub struct ConsoleImpl {
    commands: BTreeMap<String, ConsoleCommand>,
    messages: Mutex<Vec<String>>,
}

impl ConsoleImpl {
    /// Console with built-ins plus the commands of the registered
    /// component system manager, if any
    pub fn new(context: &Context) -> Self {
        let mut console = Self {
            commands: BTreeMap::new(),
            messages: Mutex::new(Vec::new()),
        };

        console.register(ConsoleCommand::new("echo", "Print the arguments", |args| {
            Ok(args.join(" "))
        }));

        if let Ok(systems) = context.get::<ComponentSystemManager>() {
            for command in systems.commands() {
                if command.name == HELP_COMMAND {
                    warn!("Ignoring system command `{}`: name is reserved", command.name);
                    continue;
                }
                console.register(command);
            }
        }

        let mut names: Vec<String> = console.commands.keys().cloned().collect();
        names.push(HELP_COMMAND.to_string());
        names.sort();
        let help_text = names.join(", ");
        console.register(ConsoleCommand::new(HELP_COMMAND, "List commands", move |_| {
            Ok(help_text.clone())
        }));

        info!("Console ready with {} commands", console.commands.len());
        console
    }

    /// Add `command` unless its name is taken; the first registration wins
    fn register(&mut self, command: ConsoleCommand) -> bool {
        if self.commands.contains_key(&command.name) {
            warn!("Ignoring duplicate console command `{}`", command.name);
            return false;
        }
        debug!("Console command {}", command.name);
        self.commands.insert(command.name.clone(), command);
        true
    }
}

impl Console for ConsoleImpl {
    fn execute(&self, line: &str) -> Result<String, ConsoleError> {
        let mut parts = line.split_whitespace();
        let name = parts.next().ok_or(ConsoleError::Empty)?.to_ascii_lowercase();
        let args: Vec<&str> = parts.collect();
        let command = self
            .commands
            .get(&name)
            .ok_or_else(|| ConsoleError::UnknownCommand(name.clone()))?;
        let output = command.run(&args).map_err(|source| ConsoleError::Failed {
            command: name.clone(),
            source,
        })?;
        self.add_message(&output);
        Ok(output)
    }

    fn add_message(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }

    fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    fn command_names(&self) -> Vec<String> {
        self.commands.keys().cloned().collect()
    }
}
