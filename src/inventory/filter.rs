//! Which files in the static directory are listed.
//!
//! Shared with `build.rs`, so this file must stay free of crate imports.

/// Served, but not listed by `ls` or `/api/files`
pub const HIDDEN_FILES: [&str; 2] = ["sitemap.xml", "robots.txt"];

/// Should a regular file with this name appear in the inventory?
pub fn is_listed(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('.') && !HIDDEN_FILES.contains(&name)
}
