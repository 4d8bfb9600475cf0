//! Page controller
//!
//! Drives the two request cycles of the page:
//! - load: session id, stored history, greeting in front, theme flag
//! - submit: run a command (typed or from a link), record it, persist
//!
//! Both the no-JavaScript form post and a script-driven submission land in
//! [`Controller::execute`], and typed commands and command links share
//! [`Controller::run_line`]. The client-driven `persist` action saves a
//! history the browser assembled itself.

use crate::commands::{CommandLine, Interpreter};
use crate::fetch::Fetch;
use crate::history::{self, EntryKind, HistoryEntry, MAX_HISTORY};
use crate::session::{self, CookieJar, CookieOptions, HistoryStore, SessionId};
use serde::Serialize;
use std::collections::HashMap;

/// Cookie holding the theme flag
pub const DARK_MODE_COOKIE: &str = "dark-mode";

const DARK_MODE_MAX_AGE: u64 = 60 * 60 * 24 * 365;

/// Everything the page needs to render
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    /// Greeting first, then the stored entries
    pub history: Vec<HistoryEntry>,
    pub dark_mode: bool,
}

/// Result of a form action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dark_mode: Option<bool>,
}

impl ActionOutcome {
    pub fn success() -> Self {
        Self {
            success: true,
            dark_mode: None,
        }
    }

    pub fn failure() -> Self {
        Self {
            success: false,
            dark_mode: None,
        }
    }
}

/// Decoded `application/x-www-form-urlencoded` body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    fields: HashMap<String, String>,
}

impl Form {
    /// Parse a body; for repeated fields the first one wins
    pub fn parse(body: &[u8]) -> Self {
        let mut fields = HashMap::new();
        for (name, value) in url::form_urlencoded::parse(body) {
            fields
                .entry(name.into_owned())
                .or_insert_with(|| value.into_owned());
        }
        Self { fields }
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut form = Self::default();
        for (name, value) in pairs {
            form.fields
                .entry(name.to_string())
                .or_insert_with(|| value.to_string());
        }
        form
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Theme flag: dark unless the cookie says `false`
pub fn dark_mode(jar: &CookieJar) -> bool {
    jar.get(DARK_MODE_COOKIE).as_deref() != Some("false")
}

/// Page controller, one per host
pub struct Controller {
    interpreter: Interpreter,
    store: Box<dyn HistoryStore>,
    production: bool,
}

impl Controller {
    pub fn new(interpreter: Interpreter, store: Box<dyn HistoryStore>, production: bool) -> Self {
        Self {
            interpreter,
            store,
            production,
        }
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn store(&self) -> &dyn HistoryStore {
        self.store.as_ref()
    }

    fn session(&self, jar: &mut CookieJar) -> SessionId {
        session::get_or_create_session(jar, self.production)
    }

    /// Page load
    pub fn load(&self, jar: &mut CookieJar) -> PageData {
        let session = self.session(jar);
        let stored = self.store.load(&session, jar);
        PageData {
            history: history::with_greeting(self.interpreter.config(), stored),
            dark_mode: dark_mode(jar),
        }
    }

    /// The `execute` form action
    pub async fn execute<F: Fetch>(
        &self,
        form: &Form,
        jar: &mut CookieJar,
        fetch: &F,
    ) -> ActionOutcome {
        match form.get("action") {
            Some("toggle-theme") => self.toggle_theme(jar),
            Some("link-click") => match (form.get("link-type"), form.get("link-target")) {
                (Some("command"), Some(target)) if !target.is_empty() => {
                    self.run_line(target, jar, fetch).await
                }
                // URL links are opened by the page itself
                _ => ActionOutcome::success(),
            },
            _ => self.run_line(form.get("command").unwrap_or(""), jar, fetch).await,
        }
    }

    /// Run one command line against the session's history.
    ///
    /// Blank input changes nothing and writes nothing.
    pub async fn run_line<F: Fetch>(
        &self,
        raw: &str,
        jar: &mut CookieJar,
        fetch: &F,
    ) -> ActionOutcome {
        let Some(line) = CommandLine::parse(raw) else {
            return ActionOutcome::success();
        };

        let session = self.session(jar);
        let mut entries = self.store.load(&session, jar);

        let result = self.interpreter.execute_line(&line, fetch).await;
        history::record(&mut entries, &line, &result);

        self.store.save(&session, &entries, jar);
        ActionOutcome::success()
    }

    /// The `persist` form action: save a history assembled by the client
    pub async fn persist<F: Fetch>(
        &self,
        form: &Form,
        jar: &mut CookieJar,
        fetch: &F,
    ) -> ActionOutcome {
        let session = self.session(jar);
        let Some(json) = form.get("history") else {
            return ActionOutcome::failure();
        };
        let Some(mut entries) = history::decode(json) else {
            crate::console_log!("[history] Rejected malformed history from client");
            return ActionOutcome::failure();
        };

        // The greeting is synthesized on load, never stored
        let greeting = HistoryEntry::greeting(self.interpreter.config());
        if entries.first() == Some(&greeting) {
            entries.remove(0);
        }

        self.rebuild_html(&mut entries, fetch).await;
        history::truncate_front(&mut entries, MAX_HISTORY);

        self.store.save(&session, &entries, jar);
        ActionOutcome::success()
    }

    /// Markup from the client isn't trusted. Each HTML entry is rendered
    /// again from the command that precedes it; if that isn't possible it
    /// is kept as plain text.
    async fn rebuild_html<F: Fetch>(&self, entries: &mut [HistoryEntry], fetch: &F) {
        for i in 0..entries.len() {
            if !entries[i].is_html() {
                continue;
            }

            let rebuilt = match i.checked_sub(1).map(|p| &entries[p]) {
                Some(prev) if prev.kind == EntryKind::Command => {
                    let line = prev.content.strip_prefix("$ ").and_then(CommandLine::parse);
                    match line {
                        Some(line) => {
                            let result = self.interpreter.execute_line(&line, fetch).await;
                            result.is_html.then_some(result.output)
                        }
                        None => None,
                    }
                }
                _ => None,
            };

            match rebuilt {
                Some(output) => entries[i].content = output,
                None => entries[i].is_html = None,
            }
        }
    }

    /// Flip the theme cookie
    pub fn toggle_theme(&self, jar: &mut CookieJar) -> ActionOutcome {
        let dark = jar.get(DARK_MODE_COOKIE).as_deref() == Some("false");
        let value = if dark { "true" } else { "false" };
        let options = CookieOptions::new().max_age(DARK_MODE_MAX_AGE);
        if let Err(e) = jar.set(DARK_MODE_COOKIE, value, options) {
            crate::console_log!("[theme] Could not set theme cookie: {}", e);
            return ActionOutcome::failure();
        }
        ActionOutcome {
            success: true,
            dark_mode: Some(dark),
        }
    }
}
