use serde_json::Value;

use super::theme;

/// Character limit for tool result text.
pub const RESULT_LIMIT: usize = 300;
/// Character limit for values in the generic key-value dump.
pub const VALUE_LIMIT: usize = 400;
/// Maximum list items shown in the generic dump.
pub const LIST_CAP: usize = 10;

/// Keys that carry no information worth showing in the generic dump.
const IGNORE_KEYS: &[&str] = &[
    "type",
    "durationms",
    "session_id",
    "uuid",
    "interrupted",
    "truncated",
    "search_path",
    "total_lines",
    "lines_returned",
    "numfiles",
    "count",
    "is_error",
    "num_matches",
    "parent_tool_use_id",
    "description",
    "subagent_type",
    "isimage",
    "istruncated",
];

/// Truncate to exactly `limit` characters, appending a dim note with the
/// omitted count. Strings of `limit` or fewer characters pass through.
pub fn truncate(text: &str, limit: usize) -> String {
    let total = text.chars().count();
    if total <= limit {
        return text.to_string();
    }
    let kept: String = text.chars().take(limit).collect();
    let omitted = total - limit;
    let note = theme::dim().apply(format!("... [{omitted} more chars]"));
    format!("{kept}{note}")
}

/// Format a compact one-line detail for a recognized tool call.
/// Returns `None` for tools that need the generic key-value dump.
pub fn format_tool_detail(name: &str, input: &Value) -> Option<String> {
    match name {
        "Edit" | "Write" => {
            let path = get_str(input, "file_path")?;
            Some(format!(
                "{} {path}",
                theme::field().apply("File:"),
            ))
        }
        "Read" => {
            let path = get_str(input, "file_path")?;
            Some(format!("{} {path}", theme::field().apply("Read:")))
        }
        "Bash" => {
            let cmd = get_str(input, "command")?;
            Some(format!(
                "{} {}",
                theme::dim().apply("$"),
                theme::bold().apply(first_line(cmd))
            ))
        }
        "Grep" => {
            let pattern = get_str(input, "pattern")?;
            Some(format!(
                "{} {}",
                theme::field().apply("Search:"),
                theme::bold().apply(pattern)
            ))
        }
        "Glob" => {
            let pattern = get_str(input, "pattern")?;
            Some(format!(
                "{} {}",
                theme::field().apply("Pattern:"),
                theme::bold().apply(pattern)
            ))
        }
        "Task" => {
            let agent = get_str(input, "subagent_type").unwrap_or("agent");
            let desc = get_str(input, "description").unwrap_or_default();
            Some(format!(
                "{} {agent} - {desc}",
                theme::field().apply("Agent:")
            ))
        }
        _ => None,
    }
}

/// Generic key-value dump for unrecognized tool inputs and result objects.
///
/// Skips denylisted keys and empty values; nested objects and lists are
/// indented two further spaces, lists capped at [`LIST_CAP`] items.
pub fn format_kv(data: &Value, indent: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let pad = " ".repeat(indent);
    match data {
        Value::Object(map) => {
            for (key, value) in map {
                if IGNORE_KEYS.contains(&key.to_lowercase().as_str()) || is_empty(value) {
                    continue;
                }
                let label = theme::field().apply(format!("{key}:"));
                match value {
                    Value::Object(_) | Value::Array(_) => {
                        lines.push(format!("{pad}{label}"));
                        lines.extend(format_kv(value, indent + 2));
                    }
                    other => {
                        let text = truncate(&scalar_to_string(other), VALUE_LIMIT);
                        lines.push(format!("{pad}{label} {text}"));
                    }
                }
            }
        }
        Value::Array(items) => {
            let bullet = theme::dim().apply("•");
            for item in items.iter().take(LIST_CAP) {
                match item {
                    Value::Object(_) | Value::Array(_) => {
                        lines.push(format!("{pad}{bullet}"));
                        lines.extend(format_kv(item, indent + 2));
                    }
                    other => lines.push(format!("{pad}{bullet} {}", scalar_to_string(other))),
                }
            }
            if items.len() > LIST_CAP {
                let more = items.len() - LIST_CAP;
                lines.push(format!("{pad}{}", theme::dim().apply(format!("... and {more} more"))));
            }
        }
        _ => {}
    }
    lines
}

/// Whether a value carries nothing worth displaying.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn get_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

/// Extract the first line of a string (no truncation).
pub(crate) fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or("")
}
