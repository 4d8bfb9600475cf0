//! History persistence backends
//!
//! [`HistoryStore`] is what the controller talks to. The host picks the
//! implementation:
//! - [`KvHistoryStore`] when a KV store is configured
//! - [`CookieHistoryStore`] otherwise, keeping the history in the browser
//!
//! Losing history is acceptable. Backend failures are logged and the
//! request carries on; unreadable data loads as an empty history.
//!
//! Both backends keep at most [`MAX_HISTORY`] entries, newest last, on the
//! way in and on the way out.

use super::cookie::{CookieError, CookieJar, CookieOptions};
use super::kv::{KvStore, StoreError, StoreResult};
use super::SessionId;
use crate::history::{self, HistoryEntry, COOKIE_FALLBACK_ENTRIES, MAX_HISTORY};
use std::time::Duration;

/// History lives for a week after the last write
pub const HISTORY_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 7);

/// Cookie holding the history when no KV store is configured
pub const HISTORY_COOKIE: &str = "terminal-history";

/// Load and save a session's history (without the greeting)
pub trait HistoryStore {
    fn load(&self, session: &SessionId, jar: &CookieJar) -> Vec<HistoryEntry>;

    fn save(&self, session: &SessionId, entries: &[HistoryEntry], jar: &mut CookieJar);

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// The newest [`MAX_HISTORY`] entries
fn most_recent(entries: &[HistoryEntry]) -> &[HistoryEntry] {
    &entries[entries.len().saturating_sub(MAX_HISTORY)..]
}

/// KV key for a session's history
pub fn history_key(session: &SessionId) -> String {
    format!("history:{}", session.as_str())
}

/// History in a KV store, as a JSON array under `history:<session>`
pub struct KvHistoryStore {
    kv: Box<dyn KvStore>,
}

impl KvHistoryStore {
    pub fn new(kv: impl KvStore + 'static) -> Self {
        Self { kv: Box::new(kv) }
    }

    pub fn try_load(&self, session: &SessionId) -> StoreResult<Vec<HistoryEntry>> {
        let Some(json) = self.kv.get(&history_key(session))? else {
            return Ok(Vec::new());
        };
        let mut entries = history::decode(&json).ok_or_else(|| {
            StoreError::Serialize("stored history is not a list of entries".into())
        })?;
        history::truncate_front(&mut entries, MAX_HISTORY);
        Ok(entries)
    }

    pub fn try_save(&self, session: &SessionId, entries: &[HistoryEntry]) -> StoreResult<()> {
        let entries = most_recent(entries);
        let json = history::encode(entries).map_err(|e| StoreError::Serialize(e.to_string()))?;
        self.kv.put(&history_key(session), &json, HISTORY_TTL)
    }
}

impl HistoryStore for KvHistoryStore {
    fn load(&self, session: &SessionId, _jar: &CookieJar) -> Vec<HistoryEntry> {
        self.try_load(session).unwrap_or_else(|e| {
            crate::console_log!("[kv] Error loading history: {}", e);
            Vec::new()
        })
    }

    fn save(&self, session: &SessionId, entries: &[HistoryEntry], _jar: &mut CookieJar) {
        if let Err(e) = self.try_save(session, entries) {
            crate::console_log!("[kv] Error saving history: {}", e);
        }
    }

    fn name(&self) -> &'static str {
        "kv"
    }
}

/// History in the `terminal-history` cookie
#[derive(Debug, Clone, Copy, Default)]
pub struct CookieHistoryStore;

impl CookieHistoryStore {
    fn options() -> CookieOptions {
        CookieOptions::new().max_age(HISTORY_TTL.as_secs())
    }

    fn write(entries: &[HistoryEntry], jar: &mut CookieJar) -> Result<(), CookieError> {
        // Entries are plain data; encoding can't fail
        let json = history::encode(entries).unwrap_or_else(|_| "[]".to_string());
        jar.set(HISTORY_COOKIE, &json, Self::options())
    }

    /// Write the history, falling back to the most recent entries once if
    /// the whole list is over the cookie budget.
    pub fn try_save(entries: &[HistoryEntry], jar: &mut CookieJar) -> Result<usize, CookieError> {
        let entries = most_recent(entries);
        match Self::write(entries, jar) {
            Ok(()) => Ok(entries.len()),
            Err(CookieError::TooLarge { .. }) => {
                let start = entries.len().saturating_sub(COOKIE_FALLBACK_ENTRIES);
                let recent = &entries[start..];
                Self::write(recent, jar)?;
                Ok(recent.len())
            }
            Err(e) => Err(e),
        }
    }
}

impl HistoryStore for CookieHistoryStore {
    fn load(&self, _session: &SessionId, jar: &CookieJar) -> Vec<HistoryEntry> {
        let Some(json) = jar.get(HISTORY_COOKIE) else {
            return Vec::new();
        };
        let mut entries = history::decode(&json).unwrap_or_else(|| {
            crate::console_log!("[history] Ignoring unreadable history cookie");
            Vec::new()
        });
        history::truncate_front(&mut entries, MAX_HISTORY);
        entries
    }

    fn save(&self, _session: &SessionId, entries: &[HistoryEntry], jar: &mut CookieJar) {
        let entries = most_recent(entries);
        match Self::try_save(entries, jar) {
            Ok(kept) if kept < entries.len() => {
                crate::console_log!(
                    "[history] Cookie too large, kept last {} of {} entries",
                    kept,
                    entries.len()
                );
            }
            Ok(_) => {}
            Err(e) => crate::console_log!("[history] Error saving history cookie: {}", e),
        }
    }

    fn name(&self) -> &'static str {
        "cookie"
    }
}

/// Pick a backend: KV when one is available, else cookies
pub fn select_backend<K: KvStore + 'static>(kv: Option<K>) -> Box<dyn HistoryStore> {
    match kv {
        Some(kv) => Box::new(KvHistoryStore::new(kv)),
        None => Box::new(CookieHistoryStore),
    }
}
