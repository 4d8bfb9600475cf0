//! Markdown to HTML for `cat`
//!
//! Output goes straight into the page, so it's sanitized on the way out:
//! raw HTML in the source is escaped and URLs keep only http, https or
//! mailto schemes.
//!
//! Links get rewritten:
//! - `cmd://<command line>` becomes a small form that re-submits the command
//!   (works with JavaScript off)
//! - anything else opens in a new tab with no opener and no referrer

use crate::view::{self, escape_html};
use percent_encoding::percent_decode_str;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

/// Scheme for links that run a command
pub const COMMAND_SCHEME: &str = "cmd://";

/// Schemes allowed in link and image URLs; scheme-less URLs are relative
const SAFE_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

/// Command line carried by a `cmd://` link, percent-decoded
pub fn command_target(href: &str) -> Option<String> {
    let rest = href.strip_prefix(COMMAND_SCHEME)?;
    let line = percent_decode_str(rest).decode_utf8_lossy().into_owned();
    if line.trim().is_empty() {
        return None;
    }
    Some(line)
}

/// Scheme of a URL as a browser would read it: leading controls and spaces
/// skipped, tabs and newlines anywhere removed, lowercased.
fn url_scheme(href: &str) -> Option<String> {
    let cleaned: String = href
        .trim_start_matches(|c: char| c <= ' ')
        .chars()
        .filter(|c| !matches!(c, '\t' | '\n' | '\r'))
        .collect();
    let (scheme, _) = cleaned.split_once(':')?;
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then(|| scheme.to_ascii_lowercase())
}

/// Replace URLs with a scheme other than http, https or mailto with `#`
pub fn safe_url(href: &str) -> &str {
    match url_scheme(href) {
        Some(scheme) if !SAFE_SCHEMES.contains(&scheme.as_str()) => "#",
        _ => href,
    }
}

fn anchor_open(href: &str, title: &str) -> String {
    let mut out = format!(
        "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\"",
        escape_html(safe_url(href))
    );
    if !title.is_empty() {
        out.push_str(&format!(" title=\"{}\"", escape_html(title)));
    }
    out.push('>');
    out
}

/// Render markdown to sanitized HTML
pub fn render(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    // One entry per open link: was it a command link?
    let mut open_links: Vec<bool> = Vec::new();

    let events = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            dest_url, title, ..
        }) => match command_target(&dest_url) {
            Some(line) => {
                open_links.push(true);
                Event::Html(CowStr::from(view::command_form_open(&line)))
            }
            None => {
                open_links.push(false);
                Event::Html(CowStr::from(anchor_open(&dest_url, &title)))
            }
        },
        Event::End(TagEnd::Link) => match open_links.pop() {
            Some(true) => Event::Html(CowStr::from(view::COMMAND_FORM_CLOSE)),
            _ => Event::Html(CowStr::from("</a>")),
        },
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => {
            let blocked = safe_url(&dest_url) != &*dest_url;
            let dest_url = if blocked { CowStr::from("#") } else { dest_url };
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            })
        }
        other => other,
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_and_paragraph() {
        let html = render("# Hello\n\nWorld");
        assert!(html.contains("<h1>Hello</h1>"));
        assert!(html.contains("<p>World</p>"));
    }

    #[test]
    fn test_command_link_becomes_form() {
        let html = render("[PGP Key](cmd://cat%20public.asc)");
        assert!(html.contains("<form method=\"POST\" action=\"?/execute\""));
        assert!(html.contains("name=\"action\" value=\"link-click\""));
        assert!(html.contains("name=\"link-type\" value=\"command\""));
        assert!(html.contains("name=\"link-target\" value=\"cat public.asc\""));
        assert!(html.contains("class=\"terminal-cmd-link\""));
        assert!(html.contains("PGP Key</button>"));
        assert!(!html.contains("target=\"_blank\""));
    }

    #[test]
    fn test_regular_link_opens_new_tab() {
        let html = render("[Example](https://example.com \"Ex\")");
        assert!(html.contains("href=\"https://example.com\""));
        assert!(html.contains("target=\"_blank\""));
        assert!(html.contains("rel=\"noopener noreferrer\""));
        assert!(html.contains("title=\"Ex\""));
        assert!(html.contains("Example</a>"));
        assert!(!html.contains("terminal-cmd-link"));
        assert!(!html.contains("<form"));
    }

    #[test]
    fn test_raw_html_escaped() {
        let html = render("<script>alert(1)</script>\n\nhi <b onclick=\"x\">there</b>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<b onclick"));
    }

    #[test]
    fn test_javascript_url_neutralized() {
        let html = render("[click](javascript:alert(1)) ![img](JavaScript:evil)");
        assert!(!html.to_lowercase().contains("javascript:"));
        assert!(html.contains("href=\"#\""));
    }

    #[test]
    fn test_obfuscated_scheme_neutralized() {
        let html = render("[x](java&#9;script:alert(1)) [y](java&#10;script:alert(2))");
        assert!(!html.contains("script:alert"));
        assert_eq!(html.matches("href=\"#\"").count(), 2);
    }

    #[test]
    fn test_safe_url() {
        assert_eq!(safe_url("https://example.com"), "https://example.com");
        assert_eq!(safe_url("mailto:me@example.com"), "mailto:me@example.com");
        assert_eq!(safe_url("/public.asc"), "/public.asc");
        assert_eq!(safe_url("docs.md#a:b"), "docs.md#a:b");
        assert_eq!(safe_url("java\tscript:alert(1)"), "#");
        assert_eq!(safe_url("\x01 JAVASCRIPT:alert(1)"), "#");
        assert_eq!(safe_url("data:text/html,x"), "#");
        assert_eq!(safe_url("vbscript:x"), "#");
    }

    #[test]
    fn test_command_target() {
        assert_eq!(command_target("cmd://ls"), Some("ls".to_string()));
        assert_eq!(
            command_target("cmd://echo%20a%2Bb"),
            Some("echo a+b".to_string())
        );
        assert_eq!(command_target("cmd://"), None);
        assert_eq!(command_target("https://x"), None);
    }

    #[test]
    fn test_link_text_escaped_in_button() {
        let html = render("[a <b>](cmd://ls)");
        assert!(html.contains("a &lt;b&gt;</button>"));
    }

    #[test]
    fn test_table() {
        let html = render("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"));
    }
}
