//! Built-in dynamic commands
//!
//! Commands declared with `"response": "dynamic"` compute their output here.
//! The set is closed: adding one means adding a [`Builtin`] variant, and the
//! interpreter's match won't compile until it's handled.

use super::interpreter::CommandResult;
use super::{Link, TerminalConfig};
use crate::fetch::Fetch;
use crate::inventory::StaticFiles;
use crate::markdown;

/// Builtins, keyed by command name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Help,
    Echo,
    Date,
    Neofetch,
    Ls,
    Cat,
}

impl Builtin {
    pub const ALL: [Builtin; 6] = [
        Builtin::Help,
        Builtin::Echo,
        Builtin::Date,
        Builtin::Neofetch,
        Builtin::Ls,
        Builtin::Cat,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "help" => Some(Builtin::Help),
            "echo" => Some(Builtin::Echo),
            "date" => Some(Builtin::Date),
            "neofetch" => Some(Builtin::Neofetch),
            "ls" => Some(Builtin::Ls),
            "cat" => Some(Builtin::Cat),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Help => "help",
            Builtin::Echo => "echo",
            Builtin::Date => "date",
            Builtin::Neofetch => "neofetch",
            Builtin::Ls => "ls",
            Builtin::Cat => "cat",
        }
    }
}

/// Column width for command names in `help`
const HELP_NAME_WIDTH: usize = 12;

const CAT_USAGE: &str = "Usage: cat <filename>\n\n\
    Try: cat about.md, cat social.md, or cat contact.md\n\
    Use \"ls\" to see all available files";

/// help - every command with its description, in table order
pub fn help(config: &TerminalConfig) -> CommandResult {
    let lines: Vec<String> = config
        .commands()
        .iter()
        .map(|cmd| {
            format!(
                "  {:<width$} - {}",
                cmd.name,
                cmd.config.description,
                width = HELP_NAME_WIDTH
            )
        })
        .collect();
    CommandResult::text(format!("Available commands:\n{}", lines.join("\n")))
}

/// echo - arguments joined by single spaces
pub fn echo(args: &[String]) -> CommandResult {
    CommandResult::text(args.join(" "))
}

/// date - local time, e.g. `10/17/2026, 3:04:05 PM`
pub fn date() -> CommandResult {
    let now = chrono::Local::now();
    CommandResult::text(now.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string())
}

/// neofetch - the business card
pub fn neofetch() -> CommandResult {
    let output = [
        String::new(),
        "  \x1b[36mdariush\x1b[0m@\x1b[36mdev\x1b[0m".to_string(),
        "  ───────────".to_string(),
        "  \x1b[33mName:\x1b[0m      Dariush Komeili".to_string(),
        "  \x1b[33mRole:\x1b[0m      CS Student @ HHU".to_string(),
        "  \x1b[33mLocation:\x1b[0m  Düsseldorf, Germany 🇩🇪".to_string(),
        "  \x1b[33mInterests:\x1b[0m Privacy · Monero · XR · Backend".to_string(),
        "  \x1b[33mStack:\x1b[0m     Python · FastAPI · Docker · Rust".to_string(),
        "  \x1b[33mBlog:\x1b[0m      blog.dariush.dev".to_string(),
        format!(
            "  \x1b[33mTerminal:\x1b[0m  termfolio v{}",
            env!("CARGO_PKG_VERSION")
        ),
        String::new(),
    ]
    .join("\n");

    let links = vec![
        Link::url("GitHub", "https://github.com/devDariush"),
        Link::url(
            "LinkedIn",
            "https://www.linkedin.com/in/dariush-komeili-a44796232",
        ),
        Link::url("Bluesky", "https://bsky.app/profile/dariush.dev"),
        Link::url("Blog", "https://blog.dariush.dev"),
    ];

    let mut result = CommandResult::text(output).with_links(links);
    result.is_greeting = true;
    result
}

/// ls - the static file inventory, one per line
pub fn ls(files: &StaticFiles) -> CommandResult {
    if files.is_empty() {
        return CommandResult::text("No files available");
    }
    CommandResult::text(files.names().join("\n"))
}

fn no_such_file(filename: &str) -> CommandResult {
    CommandResult::text(format!(
        "cat: {}: No such file or directory\n\nUse \"ls\" to see available files",
        filename
    ))
}

/// cat - print a file; markdown is rendered to sanitized HTML
pub async fn cat<F: Fetch>(args: &[String], fetch: &F) -> CommandResult {
    let Some(filename) = args.first() else {
        return CommandResult::text(CAT_USAGE);
    };

    let response = match fetch.fetch(&format!("/{}", filename)).await {
        Ok(resp) if resp.is_success() => resp,
        Ok(_) => return no_such_file(filename),
        Err(e) => {
            crate::console_log!("[cat] {}: {}", filename, e);
            return no_such_file(filename);
        }
    };

    let content = response.text();
    if filename.ends_with(".md") {
        CommandResult::html(markdown::render(&content))
    } else {
        CommandResult::text(content)
    }
}
