//! Static file inventory
//!
//! The list of servable files under `static/`. It's computed by `build.rs`
//! so both hosts see the same list: the server answers `/api/files` from it
//! and the browser build runs `ls` against it without a filesystem.
//!
//! A server pointed at a different directory rescans with [`StaticFiles::scan`],
//! which applies the same filter.

mod filter;

pub use filter::{is_listed, HIDDEN_FILES};

use std::io;
use std::path::Path;

mod generated {
    include!(concat!(env!("OUT_DIR"), "/static_files.rs"));
}

/// Sorted, read-only list of listable file names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticFiles {
    files: Vec<String>,
}

impl StaticFiles {
    /// The inventory baked in at build time
    pub fn build_time() -> Self {
        Self::from_names(generated::STATIC_FILES.iter().copied())
    }

    /// Build from arbitrary names; filters and sorts them
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut files: Vec<String> = names
            .into_iter()
            .map(Into::into)
            .filter(|name| is_listed(name))
            .collect();
        files.sort();
        files.dedup();
        Self { files }
    }

    /// Read a directory's regular files
    pub fn scan(dir: &Path) -> io::Result<Self> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
        Ok(Self::from_names(names))
    }

    pub fn names(&self) -> &[String] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.binary_search_by(|f| f.as_str().cmp(name)).is_ok()
    }

    /// JSON array of names, as served by `/api/files`
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.files).unwrap_or_else(|_| "[]".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_from_names_filters_and_sorts() {
        let files = StaticFiles::from_names([
            "social.md",
            ".DS_Store",
            "robots.txt",
            "about.md",
            "sitemap.xml",
            "contact.md",
        ]);
        assert_eq!(files.names(), &["about.md", "contact.md", "social.md"]);
    }

    #[test]
    fn test_is_listed() {
        assert!(is_listed("about.md"));
        assert!(!is_listed(".env"));
        assert!(!is_listed("robots.txt"));
        assert!(!is_listed(""));
    }

    #[test]
    fn test_scan_skips_dirs_and_hidden() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::write(dir.path().join("a.md"), "a").unwrap();
        fs::write(dir.path().join(".hidden"), "h").unwrap();
        fs::write(dir.path().join("sitemap.xml"), "<urlset/>").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();

        let files = StaticFiles::scan(dir.path()).unwrap();
        assert_eq!(files.names(), &["a.md", "b.txt"]);
        assert!(files.contains("a.md"));
        assert!(!files.contains("nested"));
    }

    #[test]
    fn test_scan_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(StaticFiles::scan(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_build_time_inventory() {
        let files = StaticFiles::build_time();
        assert!(files.contains("about.md"));
        assert!(!files.contains("robots.txt"));
        let mut sorted = files.names().to_vec();
        sorted.sort();
        assert_eq!(files.names(), sorted.as_slice());
    }

    #[test]
    fn test_to_json() {
        let files = StaticFiles::from_names(["x.md", "a.txt"]);
        assert_eq!(files.to_json(), r#"["a.txt","x.md"]"#);
    }
}
