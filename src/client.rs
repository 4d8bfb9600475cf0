//! Browser entry points
//!
//! With JavaScript available the page runs commands in-process instead of
//! posting a form. Results cross the boundary as JSON strings in the same
//! shape the server stores, so the page can append them to its history and
//! hand the whole list back through the `persist` action.

#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

use crate::commands::{CommandLine, Interpreter, TerminalConfig};
use crate::fetch::web::WebFetch;
use crate::history::HistoryEntry;
use crate::inventory::StaticFiles;

thread_local! {
    static INTERPRETER: RefCell<Option<Rc<Interpreter>>> = RefCell::new(None);
}

/// The shared interpreter, built on first use
fn interpreter() -> Result<Rc<Interpreter>, JsValue> {
    INTERPRETER.with(|slot| {
        if let Some(interp) = slot.borrow().as_ref() {
            return Ok(Rc::clone(interp));
        }

        let config = TerminalConfig::embedded()
            .map_err(|e| JsValue::from_str(&format!("Bad command table: {}", e)))?;
        let interp = Rc::new(Interpreter::new(config, StaticFiles::build_time()));
        *slot.borrow_mut() = Some(Rc::clone(&interp));
        Ok(interp)
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Run a command line. Resolves to a JSON command result, or `null` for
/// blank input.
#[wasm_bindgen]
pub fn execute(line: String) -> js_sys::Promise {
    wasm_bindgen_futures::future_to_promise(async move {
        let Some(line) = CommandLine::parse(&line) else {
            return Ok(JsValue::NULL);
        };
        let interp = interpreter()?;
        let result = interp.execute_line(&line, &WebFetch).await;
        Ok(JsValue::from_str(&to_json(&result)?))
    })
}

/// Control action a line triggers (`"clear"`), or `undefined`. The page
/// checks this to reset its history; results don't carry the flag.
#[wasm_bindgen]
pub fn action(line: &str) -> Result<Option<String>, JsValue> {
    let Some(line) = CommandLine::parse(line) else {
        return Ok(None);
    };
    let interp = interpreter()?;
    Ok(interp
        .config()
        .action(&line.program)
        .map(|action| action.name().to_string()))
}

/// The greeting entry that heads every history, as JSON
#[wasm_bindgen]
pub fn greeting() -> Result<String, JsValue> {
    let interp = interpreter()?;
    to_json(&HistoryEntry::greeting(interp.config()))
}

/// ANSI color segments of `text`, as JSON `[{ text, color }]`
#[wasm_bindgen]
pub fn parse_ansi(text: &str) -> Result<String, JsValue> {
    to_json(&crate::ansi::parse(text))
}

#[wasm_bindgen]
pub fn has_ansi_codes(text: &str) -> bool {
    crate::ansi::has_ansi_codes(text)
}

/// The file inventory, as a JSON array
#[wasm_bindgen]
pub fn static_files() -> String {
    StaticFiles::build_time().to_json()
}
