//! Sessions
//!
//! Each browser gets an opaque random id in a long-lived, script-invisible
//! cookie. The id keys its history in the KV store.

pub mod cookie;
pub mod kv;
pub mod store;

pub use cookie::{CookieError, CookieJar, CookieOptions, SameSite};
pub use kv::{FileKv, KvStore, MemoryKv, StoreError, StoreResult};
pub use store::{select_backend, CookieHistoryStore, HistoryStore, KvHistoryStore};

use uuid::Uuid;

/// Cookie holding the session id
pub const SESSION_COOKIE: &str = "session-id";

/// Session cookies last a year
pub const SESSION_MAX_AGE: u64 = 60 * 60 * 24 * 365;

/// Longest cookie value accepted as a session id
const MAX_SESSION_ID_LEN: usize = 128;

/// Opaque per-browser identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// A fresh random id (UUID v4, hyphenated)
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept an id sent back by the browser. Ids are opaque, but they end
    /// up in storage keys, so empty, oversized or odd values are refused.
    pub fn from_cookie(value: &str) -> Option<Self> {
        let ok = !value.is_empty()
            && value.len() <= MAX_SESSION_ID_LEN
            && value
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        ok.then(|| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Attributes of the session cookie
pub fn session_cookie_options(production: bool) -> CookieOptions {
    CookieOptions::new()
        .max_age(SESSION_MAX_AGE)
        .http_only(true)
        .secure(production)
        .same_site(SameSite::Lax)
}

/// The request's session id, creating and setting one if there is none
pub fn get_or_create_session(jar: &mut CookieJar, production: bool) -> SessionId {
    if let Some(id) = jar.get(SESSION_COOKIE).and_then(|v| SessionId::from_cookie(&v)) {
        return id;
    }

    let id = SessionId::generate();
    if let Err(e) = jar.set(SESSION_COOKIE, id.as_str(), session_cookie_options(production)) {
        crate::console_log!("[session] Could not set session cookie: {}", e);
    }
    id
}
