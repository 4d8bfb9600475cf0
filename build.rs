//! Bakes the static file inventory into the crate.
//!
//! The browser build has no filesystem, so `ls` reads this list instead.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[path = "src/inventory/filter.rs"]
mod filter;

fn main() {
    let static_dir = Path::new("static");
    println!("cargo:rerun-if-changed=static");
    println!("cargo:rerun-if-changed=src/inventory/filter.rs");

    let mut files: Vec<String> = match fs::read_dir(static_dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| filter::is_listed(name))
            .collect(),
        Err(_) => Vec::new(),
    };
    files.sort();

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR not set"));
    let list = files
        .iter()
        .map(|name| format!("    {:?},\n", name))
        .collect::<String>();
    let source = format!("pub static STATIC_FILES: &[&str] = &[\n{}];\n", list);
    fs::write(out_dir.join("static_files.rs"), source).expect("failed to write static_files.rs");
}
