//! Terminal history entries
//!
//! A session's history is an ordered, append-only list of command echoes
//! and their output. It's bounded at [`MAX_HISTORY`]; the oldest entries go
//! first.
//!
//! The greeting is never stored. It's put in front of whatever was loaded
//! every time the page renders.

use crate::commands::{CommandLine, CommandResult, Link, TerminalConfig};
use serde::{Deserialize, Serialize};

/// Maximum entries kept per session
pub const MAX_HISTORY: usize = 100;

/// Entries kept when the full history won't fit in a cookie
pub const COOKIE_FALLBACK_ENTRIES: usize = 20;

/// What an entry shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Echo of a submitted line (`$ ls`)
    Command,
    /// Interpreter output
    Output,
    /// Greeting-style output
    Greeting,
}

/// One rendered line of history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Link>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_greeting: Option<bool>,
    /// `content` is markup from the sanitizing renderer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_html: Option<bool>,
}

impl HistoryEntry {
    pub fn command(line: &CommandLine) -> Self {
        Self {
            kind: EntryKind::Command,
            content: line.echo(),
            links: None,
            is_greeting: None,
            is_html: None,
        }
    }

    /// Output entry for a result; greeting-flagged results keep that kind
    pub fn from_result(result: &CommandResult) -> Self {
        Self {
            kind: if result.is_greeting {
                EntryKind::Greeting
            } else {
                EntryKind::Output
            },
            content: result.output.clone(),
            links: result.links.clone(),
            is_greeting: result.is_greeting.then_some(true),
            is_html: result.is_html.then_some(true),
        }
    }

    /// The synthetic first entry
    pub fn greeting(config: &TerminalConfig) -> Self {
        Self {
            kind: EntryKind::Greeting,
            content: config.greeting.clone(),
            links: config.greeting_links.clone(),
            is_greeting: None,
            is_html: None,
        }
    }

    pub fn is_html(&self) -> bool {
        self.is_html == Some(true)
    }
}

/// Drop the oldest entries so at most `max` remain
pub fn truncate_front(entries: &mut Vec<HistoryEntry>, max: usize) {
    if entries.len() > max {
        let excess = entries.len() - max;
        entries.drain(..excess);
    }
}

/// Record an executed line.
///
/// A clear empties the history. Otherwise the echo is appended, then the
/// output unless it's empty, and the list is truncated to [`MAX_HISTORY`].
pub fn record(entries: &mut Vec<HistoryEntry>, line: &CommandLine, result: &CommandResult) {
    if result.clear {
        entries.clear();
        return;
    }

    entries.push(HistoryEntry::command(line));
    if !result.output.is_empty() {
        entries.push(HistoryEntry::from_result(result));
    }
    truncate_front(entries, MAX_HISTORY);
}

/// The greeting followed by the stored entries
pub fn with_greeting(config: &TerminalConfig, stored: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
    let mut history = Vec::with_capacity(stored.len() + 1);
    history.push(HistoryEntry::greeting(config));
    history.extend(stored);
    history
}

/// Decode a stored history. Anything unreadable counts as empty.
pub fn decode(json: &str) -> Option<Vec<HistoryEntry>> {
    serde_json::from_str(json).ok()
}

pub fn encode(entries: &[HistoryEntry]) -> Result<String, serde_json::Error> {
    serde_json::to_string(entries)
}
