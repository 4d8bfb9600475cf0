//! Page markup
//!
//! Just enough HTML to use the terminal without JavaScript: the history,
//! a command form, a theme toggle. Command links are forms everywhere
//! (history links and links inside rendered markdown alike), so a click
//! behaves the same whether or not a script intercepts it.

use crate::ansi;
use crate::commands::{Link, LinkType};
use crate::controller::PageData;
use crate::history::{EntryKind, HistoryEntry};

/// Closes what [`command_form_open`] opened
pub const COMMAND_FORM_CLOSE: &str = "</button></form>";

/// Escape text for element content and quoted attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Start of a form that re-submits `line` as a link click; the button
/// label follows, then [`COMMAND_FORM_CLOSE`].
pub fn command_form_open(line: &str) -> String {
    format!(
        "<form method=\"POST\" action=\"?/execute\" class=\"terminal-cmd-form\">\
         <input type=\"hidden\" name=\"action\" value=\"link-click\">\
         <input type=\"hidden\" name=\"link-type\" value=\"command\">\
         <input type=\"hidden\" name=\"link-target\" value=\"{}\">\
         <button type=\"submit\" class=\"terminal-cmd-link\">",
        escape_html(line)
    )
}

/// One link: a form for commands, an anchor for URLs
pub fn render_link(link: &Link) -> String {
    match link.kind {
        LinkType::Command => format!(
            "{}{}{}",
            command_form_open(&link.target),
            escape_html(&link.text),
            COMMAND_FORM_CLOSE
        ),
        LinkType::Url => format!(
            "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\" class=\"terminal-url-link\">{}</a>",
            escape_html(crate::markdown::safe_url(&link.target)),
            escape_html(&link.text)
        ),
    }
}

/// One history entry
pub fn render_entry(entry: &HistoryEntry) -> String {
    let class = match entry.kind {
        EntryKind::Command => "entry entry-command",
        EntryKind::Output => "entry entry-output",
        EntryKind::Greeting => "entry entry-greeting",
    };

    let body = if entry.is_html() {
        format!("<div class=\"markdown\">{}</div>", entry.content)
    } else {
        format!("<pre>{}</pre>", ansi::to_html(&entry.content))
    };

    let links = match &entry.links {
        Some(links) if !links.is_empty() => {
            let items: String = links.iter().map(render_link).collect();
            format!("<nav class=\"entry-links\">{}</nav>", items)
        }
        _ => String::new(),
    };

    format!("<div class=\"{}\">{}{}</div>", class, body, links)
}

/// The whole page
pub fn render_page(page: &PageData) -> String {
    let entries: String = page.history.iter().map(render_entry).collect();
    let theme = if page.dark_mode { "dark" } else { "light" };

    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\" class=\"{theme}\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>termfolio</title>\n\
         </head>\n\
         <body>\n\
         <main id=\"terminal\">\n\
         <section id=\"history\">{entries}</section>\n\
         <form method=\"POST\" action=\"?/execute\" id=\"prompt\">\
         <label for=\"command\">$</label> \
         <input id=\"command\" name=\"command\" autocomplete=\"off\" autofocus>\
         </form>\n\
         </main>\n\
         <form method=\"POST\" action=\"?/execute\" id=\"theme\">\
         <input type=\"hidden\" name=\"action\" value=\"toggle-theme\">\
         <button type=\"submit\">{toggle}</button>\
         </form>\n\
         </body>\n\
         </html>\n",
        theme = theme,
        entries = entries,
        toggle = if page.dark_mode { "light mode" } else { "dark mode" },
    )
}
