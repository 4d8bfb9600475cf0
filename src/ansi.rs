//! ANSI color codes to styled segments
//!
//! Command output (neofetch, colors) carries SGR sequences like `\x1b[31m`.
//! The page can't show those, so they are split into segments, each tagged
//! with a CSS class for its foreground color.
//!
//! Only `ESC [ <digits> m` is recognized. Anything else is plain text.

use crate::view::escape_html;
use serde::Serialize;

/// A run of text sharing one color
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColorSegment {
    pub text: String,
    /// CSS classes for the color, `None` for the default foreground
    pub color: Option<&'static str>,
}

impl ColorSegment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
        }
    }

    pub fn colored(text: impl Into<String>, color: &'static str) -> Self {
        Self {
            text: text.into(),
            color: Some(color),
        }
    }
}

/// 8 standard + 8 bright foreground colors
const PALETTE: [(u32, &str); 16] = [
    (30, "text-black dark:text-gray-800"),
    (31, "text-red-600 dark:text-red-400"),
    (32, "text-green-600 dark:text-green-400"),
    (33, "text-yellow-600 dark:text-yellow-400"),
    (34, "text-blue-600 dark:text-blue-400"),
    (35, "text-magenta-600 dark:text-magenta-400"),
    (36, "text-cyan-600 dark:text-cyan-400"),
    (37, "text-white dark:text-gray-100"),
    (90, "text-gray-600 dark:text-gray-400"),
    (91, "text-red-500 dark:text-red-300"),
    (92, "text-green-500 dark:text-green-300"),
    (93, "text-yellow-500 dark:text-yellow-300"),
    (94, "text-blue-500 dark:text-blue-300"),
    (95, "text-magenta-500 dark:text-magenta-300"),
    (96, "text-cyan-500 dark:text-cyan-300"),
    (97, "text-gray-100 dark:text-white"),
];

const ESC: u8 = 0x1b;

/// Look up the classes for an SGR color code
pub fn color_for(code: u32) -> Option<&'static str> {
    PALETTE
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, class)| *class)
}

/// Try to match `ESC [ <digits> m` at `pos`.
///
/// Returns the numeric code and the index just past the sequence.
fn match_sequence(bytes: &[u8], pos: usize) -> Option<(&str, usize)> {
    if bytes.get(pos) != Some(&ESC) || bytes.get(pos + 1) != Some(&b'[') {
        return None;
    }
    let digits_start = pos + 2;
    let mut end = digits_start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start || bytes.get(end) != Some(&b'm') {
        return None;
    }
    // Digits are ASCII, so the slice is valid UTF-8
    let digits = std::str::from_utf8(&bytes[digits_start..end]).ok()?;
    Some((digits, end + 1))
}

/// Split text into color segments.
///
/// `0` resets to the default color. A palette code replaces the current
/// color; any other code leaves it unchanged.
pub fn parse(text: &str) -> Vec<ColorSegment> {
    let bytes = text.as_bytes();
    let mut segments = Vec::new();
    let mut current: Option<&'static str> = None;
    let mut last = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        let Some((code, next)) = match_sequence(bytes, pos) else {
            pos += 1;
            continue;
        };

        if pos > last {
            segments.push(ColorSegment {
                text: text[last..pos].to_string(),
                color: current,
            });
        }

        if code == "0" {
            current = None;
        } else if let Some(color) = code.parse().ok().and_then(color_for) {
            current = Some(color);
        }

        last = next;
        pos = next;
    }

    if last < text.len() {
        segments.push(ColorSegment {
            text: text[last..].to_string(),
            color: current,
        });
    }

    if segments.is_empty() {
        segments.push(ColorSegment::plain(text));
    }
    segments
}

/// Does the text contain at least one color sequence?
pub fn has_ansi_codes(text: &str) -> bool {
    let bytes = text.as_bytes();
    (0..bytes.len()).any(|pos| match_sequence(bytes, pos).is_some())
}

/// Render text as escaped HTML, wrapping colored runs in spans
pub fn to_html(text: &str) -> String {
    if !has_ansi_codes(text) {
        return escape_html(text);
    }

    let mut out = String::with_capacity(text.len());
    for segment in parse(text) {
        match segment.color {
            Some(class) => {
                out.push_str("<span class=\"");
                out.push_str(class);
                out.push_str("\">");
                out.push_str(&escape_html(&segment.text));
                out.push_str("</span>");
            }
            None => out.push_str(&escape_html(&segment.text)),
        }
    }
    out
}
