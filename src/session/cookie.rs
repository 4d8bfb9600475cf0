//! Request/response cookies
//!
//! A [`CookieJar`] is built from the request's `Cookie` header and collects
//! the `Set-Cookie` values the response should carry. Reads see values set
//! earlier in the same request.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::HashMap;
use std::fmt;

/// Browsers reject cookies whose name plus value exceed this
pub const MAX_COOKIE_SIZE: usize = 4096;

/// Characters left alone when encoding a value (as `encodeURIComponent` does)
const VALUE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Cookie errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieError {
    /// Encoded cookie is over the size budget
    TooLarge {
        name: String,
        size: usize,
        limit: usize,
    },
    /// Name contains characters not allowed in a cookie name
    InvalidName(String),
}

impl fmt::Display for CookieError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CookieError::TooLarge { name, size, limit } => {
                write!(f, "cookie {} is {} bytes (limit {})", name, size, limit)
            }
            CookieError::InvalidName(name) => write!(f, "invalid cookie name: {:?}", name),
        }
    }
}

impl std::error::Error for CookieError {}

/// Cross-site policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Attributes for a cookie being set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    pub path: String,
    /// Seconds; `None` makes a session cookie
    pub max_age: Option<u64>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: Option<SameSite>,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            max_age: None,
            http_only: false,
            secure: false,
            same_site: None,
        }
    }
}

impl CookieOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_age(mut self, seconds: u64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }
}

/// A cookie queued for the response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    /// Decoded value
    pub value: String,
    pub options: CookieOptions,
}

impl SetCookie {
    /// The `Set-Cookie` header value
    pub fn header_value(&self) -> String {
        let mut out = format!("{}={}", self.name, encode_value(&self.value));
        out.push_str("; Path=");
        out.push_str(&self.options.path);
        if let Some(max_age) = self.options.max_age {
            out.push_str(&format!("; Max-Age={}", max_age));
        }
        if self.options.http_only {
            out.push_str("; HttpOnly");
        }
        if self.options.secure {
            out.push_str("; Secure");
        }
        if let Some(same_site) = self.options.same_site {
            out.push_str("; SameSite=");
            out.push_str(same_site.as_str());
        }
        out
    }
}

pub fn encode_value(value: &str) -> String {
    utf8_percent_encode(value, VALUE_ENCODE_SET).to_string()
}

pub fn decode_value(raw: &str) -> String {
    let raw = raw
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .unwrap_or(raw);
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b))
}

/// Cookies for one request/response cycle
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    incoming: HashMap<String, String>,
    outgoing: Vec<SetCookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `Cookie` request header. Malformed pairs are skipped; the
    /// first occurrence of a name wins.
    pub fn from_header(header: Option<&str>) -> Self {
        let mut incoming = HashMap::new();
        for pair in header.unwrap_or("").split(';') {
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if !is_valid_name(name) {
                continue;
            }
            incoming
                .entry(name.to_string())
                .or_insert_with(|| decode_value(value.trim()));
        }
        Self {
            incoming,
            outgoing: Vec::new(),
        }
    }

    /// Current value: set in this request, else sent by the browser
    pub fn get(&self, name: &str) -> Option<String> {
        if let Some(set) = self.outgoing.iter().rev().find(|c| c.name == name) {
            return Some(set.value.clone());
        }
        self.incoming.get(name).cloned()
    }

    /// Queue a cookie. Fails without side effects if it's over budget.
    pub fn set(
        &mut self,
        name: &str,
        value: &str,
        options: CookieOptions,
    ) -> Result<(), CookieError> {
        if !is_valid_name(name) {
            return Err(CookieError::InvalidName(name.to_string()));
        }
        let size = name.len() + encode_value(value).len();
        if size > MAX_COOKIE_SIZE {
            return Err(CookieError::TooLarge {
                name: name.to_string(),
                size,
                limit: MAX_COOKIE_SIZE,
            });
        }
        self.outgoing.retain(|c| c.name != name);
        self.outgoing.push(SetCookie {
            name: name.to_string(),
            value: value.to_string(),
            options,
        });
        Ok(())
    }

    /// Cookies queued for the response
    pub fn outgoing(&self) -> &[SetCookie] {
        &self.outgoing
    }

    /// `Set-Cookie` header values, in the order they were set
    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.outgoing.iter().map(SetCookie::header_value).collect()
    }
}
