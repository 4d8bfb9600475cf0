//! File content capability
//!
//! `cat` reads files through [`Fetch`] rather than the filesystem, so the
//! same interpreter works wherever the bytes live:
//! - [`DirFetch`]: a directory on disk (the native server)
//! - [`AssetFetch`]: an in-memory asset table
//! - `web::WebFetch`: the browser's fetch API (wasm32)

#[cfg(target_arch = "wasm32")]
pub mod web;

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::{Component, Path, PathBuf};

/// Result type for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Fetch failures (a non-2xx response is not an error)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Path can't be mapped to a file
    InvalidPath(String),
    /// I/O error reading the file
    Io(String),
    /// Transport failure
    Network(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::InvalidPath(p) => write!(f, "invalid path: {}", p),
            FetchError::Io(s) => write!(f, "I/O error: {}", s),
            FetchError::Network(s) => write!(f, "network error: {}", s),
        }
    }
}

impl std::error::Error for FetchError {}

/// Response to a fetch: status plus body bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: 404,
            body: Vec::new(),
        }
    }

    /// 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, lossy for invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Read a file by URL path (`/about.md`)
pub trait Fetch {
    fn fetch(&self, path: &str) -> impl Future<Output = FetchResult<FetchResponse>>;
}

/// Map a URL path onto a relative file path, refusing anything that would
/// leave the root.
pub fn relative_path(url_path: &str) -> FetchResult<PathBuf> {
    let trimmed = url_path.trim_start_matches('/');
    let path = Path::new(trimmed);
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => return Err(FetchError::InvalidPath(url_path.to_string())),
        }
    }
    if out.as_os_str().is_empty() {
        return Err(FetchError::InvalidPath(url_path.to_string()));
    }
    Ok(out)
}

/// Does any component of the path start with a dot?
pub fn is_hidden(relative: &Path) -> bool {
    relative
        .components()
        .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
}

/// Files served from a directory. Hidden files read as missing.
#[derive(Debug, Clone)]
pub struct DirFetch {
    root: PathBuf,
}

impl DirFetch {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Fetch for DirFetch {
    async fn fetch(&self, path: &str) -> FetchResult<FetchResponse> {
        let relative = relative_path(path)?;
        if is_hidden(&relative) {
            return Ok(FetchResponse::not_found());
        }
        let full = self.root.join(relative);
        if !full.is_file() {
            return Ok(FetchResponse::not_found());
        }
        std::fs::read(&full)
            .map(FetchResponse::ok)
            .map_err(|e| FetchError::Io(e.to_string()))
    }
}

/// Files held in memory, keyed by URL path
#[derive(Debug, Clone, Default)]
pub struct AssetFetch {
    assets: HashMap<String, Vec<u8>>,
}

impl AssetFetch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file; `name` may be given with or without the leading slash
    pub fn with(mut self, name: &str, body: impl Into<Vec<u8>>) -> Self {
        self.insert(name, body);
        self
    }

    pub fn insert(&mut self, name: &str, body: impl Into<Vec<u8>>) {
        let key = format!("/{}", name.trim_start_matches('/'));
        self.assets.insert(key, body.into());
    }
}

impl Fetch for AssetFetch {
    async fn fetch(&self, path: &str) -> FetchResult<FetchResponse> {
        Ok(self
            .assets
            .get(path)
            .map(|body| FetchResponse::ok(body.clone()))
            .unwrap_or_else(FetchResponse::not_found))
    }
}
