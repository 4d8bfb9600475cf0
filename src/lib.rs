//! termfolio - A terminal-style portfolio page
//!
//! The page looks like a shell: type `help`, `ls`, `cat about.md`. Behind it
//! sits a small interpreter over a declarative command table, plus a
//! per-browser history that survives reloads.
//!
//! Layout:
//! - `commands`: the command table and the interpreter
//! - `session`: session ids, cookies, history persistence backends
//! - `controller`: the load / form-submit cycle of the page
//! - `ansi`, `markdown`, `view`: turning output into markup
//!
//! Two hosts drive the same interpreter:
//! - Native (`serve` binary): full page round-trips, works without JavaScript
//! - Browser (wasm32-unknown-unknown): `client` exports for in-page execution

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub mod ansi;
pub mod commands;
pub mod controller;
pub mod fetch;
pub mod history;
pub mod inventory;
pub mod markdown;
pub mod session;
pub mod view;

#[cfg(target_arch = "wasm32")]
pub mod client;

pub use commands::{CommandResult, Interpreter, Link, LinkType, TerminalConfig};
pub use history::{EntryKind, HistoryEntry, MAX_HISTORY};

/// Initialize panic hook for better error messages in browser console
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Console logging helper
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

/// Log to browser console (WASM)
#[cfg(target_arch = "wasm32")]
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => {
        $crate::log(&format!($($t)*))
    };
}

/// Log to stderr (native)
#[cfg(not(target_arch = "wasm32"))]
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => {
        eprintln!($($t)*)
    };
}
