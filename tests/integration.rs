//! Integration tests for termfolio
//!
//! Drives the page controller the way a browser would: each request gets a
//! fresh cookie jar built from the cookies earlier responses set.

use futures::executor::block_on;
use std::collections::HashMap;
use termfolio::controller::{Controller, Form};
use termfolio::fetch::{AssetFetch, DirFetch};
use termfolio::inventory::StaticFiles;
use termfolio::session::{CookieHistoryStore, CookieJar, KvHistoryStore, MemoryKv};
use termfolio::{EntryKind, HistoryEntry, Interpreter, TerminalConfig, MAX_HISTORY};

/// Cookie state carried between requests
#[derive(Default)]
struct Browser {
    cookies: HashMap<String, String>,
}

impl Browser {
    /// A jar for the next request
    fn jar(&self) -> CookieJar {
        let header = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ");
        CookieJar::from_header(Some(header.as_str()))
    }

    /// Keep whatever the response set
    fn accept(&mut self, jar: &CookieJar) {
        for header in jar.set_cookie_headers() {
            let pair = header.split(';').next().unwrap_or("");
            if let Some((name, value)) = pair.split_once('=') {
                self.cookies.insert(name.to_string(), value.to_string());
            }
        }
    }

    fn load(&mut self, ctl: &Controller) -> Vec<HistoryEntry> {
        let mut jar = self.jar();
        let page = ctl.load(&mut jar);
        self.accept(&jar);
        page.history
    }

    fn submit(&mut self, ctl: &Controller, fetch: &AssetFetch, fields: &[(&str, &str)]) -> bool {
        let mut jar = self.jar();
        let form = Form::from_pairs(fields.iter().copied());
        let outcome = block_on(ctl.execute(&form, &mut jar, fetch));
        self.accept(&jar);
        outcome.success
    }

    fn run(&mut self, ctl: &Controller, fetch: &AssetFetch, line: &str) -> bool {
        self.submit(ctl, fetch, &[("command", line)])
    }
}

fn interpreter() -> Interpreter {
    Interpreter::new(
        TerminalConfig::embedded().unwrap(),
        StaticFiles::from_names(["about.md", "contact.md", "public.asc"]),
    )
}

fn kv_controller() -> Controller {
    Controller::new(interpreter(), Box::new(KvHistoryStore::new(MemoryKv::new())), false)
}

fn cookie_controller() -> Controller {
    Controller::new(interpreter(), Box::new(CookieHistoryStore), false)
}

fn assets() -> AssetFetch {
    AssetFetch::new()
        .with("about.md", "# About\n\nRun [neofetch](cmd://neofetch).")
        .with("public.asc", "-----BEGIN PGP PUBLIC KEY BLOCK-----")
}

fn contents(history: &[HistoryEntry]) -> Vec<&str> {
    history.iter().map(|e| e.content.as_str()).collect()
}

// ============================================================================
// Page Load
// ============================================================================

#[test]
fn test_first_visit() {
    let ctl = kv_controller();
    let mut browser = Browser::default();
    let history = browser.load(&ctl);

    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, EntryKind::Greeting);
    assert!(history[0].links.as_ref().is_some_and(|l| !l.is_empty()));
    assert!(browser.cookies.contains_key("session-id"));
}

#[test]
fn test_session_is_stable() {
    let ctl = kv_controller();
    let mut browser = Browser::default();
    browser.load(&ctl);
    let id = browser.cookies["session-id"].clone();
    browser.load(&ctl);
    browser.run(&ctl, &assets(), "ping");
    assert_eq!(browser.cookies["session-id"], id);
}

// ============================================================================
// Command Execution
// ============================================================================

#[test]
fn test_commands_accumulate() {
    let ctl = kv_controller();
    let fetch = assets();
    let mut browser = Browser::default();

    browser.run(&ctl, &fetch, "whoami");
    browser.run(&ctl, &fetch, "echo hello   world");
    browser.run(&ctl, &fetch, "nope");

    let history = browser.load(&ctl);
    assert_eq!(
        &contents(&history)[1..],
        &[
            "$ whoami",
            "guest",
            "$ echo hello   world",
            "hello world",
            "$ nope",
            "Command not found: nope",
        ]
    );
}

#[test]
fn test_case_insensitive() {
    let ctl = kv_controller();
    let mut browser = Browser::default();
    browser.run(&ctl, &assets(), "PING");
    assert_eq!(browser.load(&ctl)[2].content, "pong");
}

#[test]
fn test_empty_input_is_noop() {
    let ctl = kv_controller();
    let fetch = assets();
    let mut browser = Browser::default();
    browser.run(&ctl, &fetch, "ping");

    assert!(browser.run(&ctl, &fetch, ""));
    assert!(browser.run(&ctl, &fetch, "   \t "));
    assert_eq!(browser.load(&ctl).len(), 3);
}

#[test]
fn test_clear_resets_to_greeting() {
    let ctl = kv_controller();
    let fetch = assets();
    let mut browser = Browser::default();
    browser.run(&ctl, &fetch, "ping");
    browser.run(&ctl, &fetch, "ls");
    browser.run(&ctl, &fetch, "clear");

    let history = browser.load(&ctl);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, EntryKind::Greeting);

    browser.run(&ctl, &fetch, "ping");
    assert_eq!(&contents(&browser.load(&ctl))[1..], &["$ ping", "pong"]);
}

#[test]
fn test_history_capped() {
    let ctl = kv_controller();
    let fetch = assets();
    let mut browser = Browser::default();
    for i in 0..60 {
        browser.run(&ctl, &fetch, &format!("echo {}", i));
    }

    let history = browser.load(&ctl);
    assert_eq!(history.len(), MAX_HISTORY + 1);
    assert_eq!(history[0].kind, EntryKind::Greeting);
    assert_eq!(history[1].content, "$ echo 10");
    assert_eq!(history[MAX_HISTORY].content, "59");
}

#[test]
fn test_neofetch_is_greeting_kind() {
    let ctl = kv_controller();
    let mut browser = Browser::default();
    browser.run(&ctl, &assets(), "neofetch");
    let history = browser.load(&ctl);
    assert_eq!(history[2].kind, EntryKind::Greeting);
    assert_eq!(history[2].links.as_ref().map(Vec::len), Some(4));
}

#[test]
fn test_cat_markdown() {
    let ctl = kv_controller();
    let mut browser = Browser::default();
    browser.run(&ctl, &assets(), "cat about.md");

    let output = &browser.load(&ctl)[2];
    assert!(output.is_html());
    assert!(output.content.contains("<h1>About</h1>"));
    assert!(output.content.contains("name=\"link-target\" value=\"neofetch\""));
}

#[test]
fn test_cat_missing() {
    let ctl = kv_controller();
    let mut browser = Browser::default();
    browser.run(&ctl, &assets(), "cat secrets.md");
    assert_eq!(
        browser.load(&ctl)[2].content,
        "cat: secrets.md: No such file or directory\n\nUse \"ls\" to see available files"
    );
}

#[test]
fn test_cat_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "plain notes").unwrap();
    let interp = Interpreter::new(
        TerminalConfig::embedded().unwrap(),
        StaticFiles::scan(dir.path()).unwrap(),
    );
    let fetch = DirFetch::new(dir.path());

    let result = block_on(interp.execute("cat", &["notes.txt".to_string()], &fetch));
    assert_eq!(result.output, "plain notes");
    assert!(!result.is_html);

    let listing = block_on(interp.execute("ls", &[], &fetch));
    assert_eq!(listing.output, "notes.txt");
}

#[test]
fn test_cat_hidden_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".env"), "SECRET=hunter2").unwrap();
    let interp = Interpreter::new(
        TerminalConfig::embedded().unwrap(),
        StaticFiles::scan(dir.path()).unwrap(),
    );
    let fetch = DirFetch::new(dir.path());

    let result = block_on(interp.execute("cat", &[".env".to_string()], &fetch));
    assert!(!result.output.contains("hunter2"));
    assert!(result.output.starts_with("cat: .env: No such file or directory"));
}

// ============================================================================
// Links
// ============================================================================

#[test]
fn test_link_click_matches_typed_command() {
    let ctl = kv_controller();
    let fetch = assets();

    let mut typed = Browser::default();
    typed.run(&ctl, &fetch, "cat public.asc");

    let mut clicked = Browser::default();
    clicked.submit(
        &ctl,
        &fetch,
        &[
            ("action", "link-click"),
            ("link-type", "command"),
            ("link-target", "cat public.asc"),
        ],
    );

    assert_eq!(typed.load(&ctl), clicked.load(&ctl));
}

#[test]
fn test_url_link_not_recorded() {
    let ctl = kv_controller();
    let mut browser = Browser::default();
    let ok = browser.submit(
        &ctl,
        &assets(),
        &[
            ("action", "link-click"),
            ("link-type", "url"),
            ("link-target", "https://github.com/devDariush"),
        ],
    );
    assert!(ok);
    assert_eq!(browser.load(&ctl).len(), 1);
}

// ============================================================================
// Theme
// ============================================================================

#[test]
fn test_theme_toggle_roundtrip() {
    let ctl = kv_controller();
    let fetch = assets();
    let mut browser = Browser::default();

    let page = ctl.load(&mut browser.jar());
    assert!(page.dark_mode);

    browser.submit(&ctl, &fetch, &[("action", "toggle-theme")]);
    assert_eq!(browser.cookies["dark-mode"], "false");
    assert!(!ctl.load(&mut browser.jar()).dark_mode);

    browser.submit(&ctl, &fetch, &[("action", "toggle-theme")]);
    assert!(ctl.load(&mut browser.jar()).dark_mode);
}

// ============================================================================
// Cookie Backend
// ============================================================================

#[test]
fn test_cookie_backend_roundtrip() {
    let ctl = cookie_controller();
    let fetch = assets();
    let mut browser = Browser::default();
    browser.run(&ctl, &fetch, "ping");
    browser.run(&ctl, &fetch, "whoami");

    assert!(browser.cookies.contains_key("terminal-history"));
    assert_eq!(
        &contents(&browser.load(&ctl))[1..],
        &["$ ping", "pong", "$ whoami", "guest"]
    );
}

#[test]
fn test_cookie_backend_overflow_keeps_recent() {
    let ctl = cookie_controller();
    let fetch = assets();
    let mut browser = Browser::default();
    for i in 0..60 {
        browser.run(&ctl, &fetch, &format!("echo {}", i));
    }

    let stored = &browser.cookies["terminal-history"];
    assert!("terminal-history".len() + stored.len() <= termfolio::session::cookie::MAX_COOKIE_SIZE);

    let history = browser.load(&ctl);
    assert!(history.len() < MAX_HISTORY);
    assert_eq!(history.last().map(|e| e.content.as_str()), Some("59"));
}

#[test]
fn test_corrupt_cookie_starts_fresh() {
    let ctl = cookie_controller();
    let mut browser = Browser::default();
    browser
        .cookies
        .insert("terminal-history".to_string(), "%7Bgarbage".to_string());
    assert_eq!(browser.load(&ctl).len(), 1);
}

// ============================================================================
// Persist
// ============================================================================

#[test]
fn test_persist_then_load() {
    let ctl = kv_controller();
    let fetch = assets();
    let mut browser = Browser::default();
    let mut history = browser.load(&ctl);

    let interp = interpreter();
    let line = termfolio::commands::CommandLine::parse("ping").unwrap();
    let result = block_on(interp.execute_line(&line, &fetch));
    termfolio::history::record(&mut history, &line, &result);

    let json = serde_json::to_string(&history).unwrap();
    let mut jar = browser.jar();
    let form = Form::from_pairs([("history", json.as_str())]);
    let outcome = block_on(ctl.persist(&form, &mut jar, &fetch));
    browser.accept(&jar);

    assert!(outcome.success);
    assert_eq!(browser.load(&ctl), history);
}

#[test]
fn test_persist_invalid() {
    let ctl = kv_controller();
    let fetch = assets();
    let mut jar = CookieJar::new();
    let bad = Form::from_pairs([("history", "[{\"type\":\"bogus\"}]")]);
    assert!(!block_on(ctl.persist(&bad, &mut jar, &fetch)).success);
    assert!(!block_on(ctl.persist(&Form::default(), &mut jar, &fetch)).success);
}
