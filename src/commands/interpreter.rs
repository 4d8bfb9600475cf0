//! Command interpreter
//!
//! Maps a command name and arguments to a [`CommandResult`]. Stateless: it
//! reads the table and the file inventory, and touches nothing else except
//! through the [`Fetch`] it is given.

use super::builtins::{self, Builtin};
use super::{Action, CommandKind, CommandLine, Link, TerminalConfig};
use crate::fetch::Fetch;
use crate::inventory::StaticFiles;
use serde::{Deserialize, Serialize};

fn is_false(value: &bool) -> bool {
    !*value
}

/// What a command produced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Link>>,
    /// Show as greeting-style output
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_greeting: bool,
    /// `output` is sanitized markup, not text
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_html: bool,
    /// The caller should replace the history with an empty list. Not part
    /// of the JSON shape; browser callers ask `TerminalConfig::action`.
    #[serde(skip)]
    pub clear: bool,
}

impl CommandResult {
    pub fn text(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            ..Self::default()
        }
    }

    pub fn html(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_html: true,
            ..Self::default()
        }
    }

    /// `{ output: "", links: [] }`, flagged as a clear
    pub fn clear() -> Self {
        Self {
            links: Some(Vec::new()),
            clear: true,
            ..Self::default()
        }
    }

    pub fn with_links(mut self, links: Vec<Link>) -> Self {
        self.links = Some(links);
        self
    }
}

/// The command interpreter
#[derive(Debug, Clone)]
pub struct Interpreter {
    config: TerminalConfig,
    files: StaticFiles,
}

impl Interpreter {
    pub fn new(config: TerminalConfig, files: StaticFiles) -> Self {
        Self { config, files }
    }

    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    pub fn files(&self) -> &StaticFiles {
        &self.files
    }

    /// Run one command
    pub async fn execute<F: Fetch>(&self, name: &str, args: &[String], fetch: &F) -> CommandResult {
        let Some(entry) = self.config.lookup(name) else {
            return CommandResult::text(format!("Command not found: {}", name));
        };

        match entry.kind {
            CommandKind::Control(Action::Clear) => CommandResult::clear(),
            CommandKind::Static => CommandResult {
                output: entry.config.response.clone().unwrap_or_default(),
                links: entry.config.links.clone(),
                ..CommandResult::default()
            },
            CommandKind::Inert => CommandResult::default(),
            CommandKind::Dynamic(builtin) => match builtin {
                Builtin::Help => builtins::help(&self.config),
                Builtin::Echo => builtins::echo(args),
                Builtin::Date => builtins::date(),
                Builtin::Neofetch => builtins::neofetch(),
                Builtin::Ls => builtins::ls(&self.files),
                Builtin::Cat => builtins::cat(args, fetch).await,
            },
        }
    }

    /// Run a parsed command line
    pub async fn execute_line<F: Fetch>(&self, line: &CommandLine, fetch: &F) -> CommandResult {
        self.execute(&line.program, &line.args, fetch).await
    }
}
