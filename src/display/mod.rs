use unicode_width::UnicodeWidthChar;

pub mod input;
pub mod renderer;
pub mod status;
pub mod theme;
pub mod tool_format;

/// Query the current terminal width, defaulting to 80.
pub(crate) fn term_width() -> usize {
    crossterm::terminal::size()
        .map(|(w, _)| w as usize)
        .unwrap_or(80)
        .max(1)
}

/// Truncate a string to fit within `max_width` display columns, appending
/// `...` if truncated.
pub(crate) fn truncate_to_width(s: &str, max_width: usize) -> String {
    let ellipsis_width = 3; // "..."
    let mut width = 0;
    // Track the byte position where we'd cut for ellipsis
    let mut cut_pos = 0;
    let mut result = String::new();
    for ch in s.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width {
            // Need to truncate — use the cut point we've been tracking
            if max_width >= ellipsis_width {
                result.truncate(cut_pos);
                result.push_str("...");
            } else {
                result.clear();
            }
            return result;
        }
        result.push(ch);
        width += ch_width;
        // Track the latest position that leaves room for "..."
        if width <= max_width.saturating_sub(ellipsis_width) {
            cut_pos = result.len();
        }
    }
    result
}

/// Column-aware truncation for strings carrying ANSI escape sequences.
///
/// Escapes are copied through without counting toward the width, and a
/// truncated string gets a trailing reset before the `...` so no attribute
/// leaks past the cut.
pub(crate) fn truncate_styled_to_width(s: &str, max_width: usize) -> String {
    let ellipsis_width = 3; // "..."
    let mut out = String::new();
    let mut width = 0;
    let mut cut_pos = 0;
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            out.push(ch);
            for esc in chars.by_ref() {
                out.push(esc);
                if esc.is_ascii_alphabetic() {
                    break;
                }
            }
            continue;
        }
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width {
            if max_width >= ellipsis_width {
                out.truncate(cut_pos);
                if out.contains('\u{1b}') {
                    out.push_str("\u{1b}[0m");
                }
                out.push_str("...");
            } else {
                out.clear();
            }
            return out;
        }
        out.push(ch);
        width += ch_width;
        if width <= max_width.saturating_sub(ellipsis_width) {
            cut_pos = out.len();
        }
    }
    out
}
