//! Command table and interpreter
//!
//! Commands are declared in `commands.json`:
//! - a fixed `response` (optionally with links)
//! - `"response": "dynamic"`, handled by a [`Builtin`]
//! - an `action` the caller carries out (only `clear` today)
//!
//! The table is parsed once into an immutable [`TerminalConfig`] and handed
//! to the [`Interpreter`] explicitly.

pub mod builtins;
pub mod interpreter;
pub mod line;

pub use builtins::Builtin;
pub use interpreter::{CommandResult, Interpreter};
pub use line::CommandLine;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The table shipped with the crate
const EMBEDDED_TABLE: &str = include_str!("commands.json");

/// Marker in `response` for commands computed by a builtin
pub const DYNAMIC_RESPONSE: &str = "dynamic";

/// Where a link goes when activated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    /// Re-enter the interpreter with `target` as a command line
    Command,
    /// Open `target` as an external URL
    Url,
}

/// An interactive element attached to output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: LinkType,
    pub target: String,
}

impl Link {
    pub fn command(text: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: LinkType::Command,
            target: target.into(),
        }
    }

    pub fn url(text: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: LinkType::Url,
            target: target.into(),
        }
    }
}

/// One command as declared in the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Link>>,
}

/// Control actions the caller performs instead of showing output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Replace the history with an empty list
    Clear,
}

impl Action {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "clear" => Some(Action::Clear),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Clear => "clear",
        }
    }
}

/// How a command produces its result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Configured response and links, verbatim
    Static,
    /// Computed by a builtin
    Dynamic(Builtin),
    /// Declared dynamic, but no builtin has that name: empty output
    Inert,
    /// A control action
    Control(Action),
}

/// A resolved table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEntry {
    /// Lowercase command name
    pub name: String,
    pub config: CommandConfig,
    pub kind: CommandKind,
}

/// Errors loading a command table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Not valid JSON, or the wrong shape
    Parse(String),
    /// Well-formed but inconsistent
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(msg) => write!(f, "command table parse error: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "invalid command table: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// The command table as it appears on disk
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    greeting: String,
    #[serde(default)]
    greeting_links: Option<Vec<Link>>,
    #[serde(deserialize_with = "ordered_commands")]
    commands: Vec<(String, CommandConfig)>,
}

/// Deserialize a JSON object into a list, keeping declaration order
fn ordered_commands<'de, D>(deserializer: D) -> Result<Vec<(String, CommandConfig)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedVisitor;

    impl<'de> Visitor<'de> for OrderedVisitor {
        type Value = Vec<(String, CommandConfig)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of command names to definitions")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut commands = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, config)) = map.next_entry::<String, CommandConfig>()? {
                commands.push((name, config));
            }
            Ok(commands)
        }
    }

    deserializer.deserialize_map(OrderedVisitor)
}

/// Immutable terminal configuration: greeting plus command table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalConfig {
    pub greeting: String,
    pub greeting_links: Option<Vec<Link>>,
    commands: Vec<CommandEntry>,
}

impl TerminalConfig {
    /// The table bundled with the crate
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_json(EMBEDDED_TABLE)
    }

    /// Parse and resolve a command table
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let mut commands: Vec<CommandEntry> = Vec::with_capacity(raw.commands.len());
        for (name, config) in raw.commands {
            let name = name.to_lowercase();
            if name.is_empty() || name.chars().any(char::is_whitespace) {
                return Err(ConfigError::Invalid(format!(
                    "command name {:?} must be a single word",
                    name
                )));
            }
            if commands.iter().any(|c| c.name == name) {
                return Err(ConfigError::Invalid(format!("duplicate command: {}", name)));
            }
            let kind = resolve_kind(&name, &config)?;
            commands.push(CommandEntry { name, config, kind });
        }

        Ok(Self {
            greeting: raw.greeting,
            greeting_links: raw.greeting_links,
            commands,
        })
    }

    /// Case-insensitive lookup
    pub fn lookup(&self, name: &str) -> Option<&CommandEntry> {
        let name = name.to_lowercase();
        self.commands.iter().find(|c| c.name == name)
    }

    /// The control action a command name triggers, if any
    pub fn action(&self, name: &str) -> Option<Action> {
        match self.lookup(name)?.kind {
            CommandKind::Control(action) => Some(action),
            _ => None,
        }
    }

    /// All commands in declaration order
    pub fn commands(&self) -> &[CommandEntry] {
        &self.commands
    }
}

fn resolve_kind(name: &str, config: &CommandConfig) -> Result<CommandKind, ConfigError> {
    match (&config.response, &config.action) {
        (Some(_), Some(_)) => Err(ConfigError::Invalid(format!(
            "{}: has both a response and an action",
            name
        ))),
        (None, Some(action)) => Action::from_name(action)
            .map(CommandKind::Control)
            .ok_or_else(|| ConfigError::Invalid(format!("{}: unknown action {:?}", name, action))),
        (Some(response), None) if response == DYNAMIC_RESPONSE => {
            match Builtin::from_name(name) {
                Some(builtin) => Ok(CommandKind::Dynamic(builtin)),
                None => {
                    crate::console_log!("[commands] {} is dynamic but has no builtin", name);
                    Ok(CommandKind::Inert)
                }
            }
        }
        _ => Ok(CommandKind::Static),
    }
}
