//! Optional subprocess collaborators: `delta` for diff coloring and `glow`
//! for markdown. Both are invoked synchronously with captured pipes; a
//! missing binary or nonzero exit degrades to plain text.

use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};
use serde_json::Value;

/// Render markdown through `glow`, falling back to the raw text.
pub fn render_markdown(text: &str) -> String {
    let mut cmd = Command::new("glow");
    cmd.args(["-s", "dark", "-w", "0"]);
    match pipe_through(&mut cmd, text) {
        Ok(out) if !out.trim().is_empty() => out.trim_end().to_string(),
        _ => text.to_string(),
    }
}

/// Color a structured patch through `delta --color-only`.
///
/// Returns `None` when delta is unavailable or fails; the caller prints a
/// plain fallback instead.
pub fn colorize_diff(file_path: &str, patches: &[Value]) -> Option<Vec<String>> {
    let diff = build_unified_diff(file_path, patches);
    let mut cmd = Command::new("delta");
    cmd.arg("--color-only");
    let out = pipe_through(&mut cmd, &diff).ok()?;
    if out.trim().is_empty() {
        return None;
    }
    Some(out.trim_end().lines().map(str::to_string).collect())
}

/// Assemble a unified diff from `structuredPatch` hunks.
pub fn build_unified_diff(file_path: &str, patches: &[Value]) -> String {
    let mut lines = vec![format!("--- {file_path}"), format!("+++ {file_path}")];
    for patch in patches {
        let old_start = get_u64(patch, "oldStart");
        let old_count = get_u64(patch, "oldLines");
        let new_start = get_u64(patch, "newStart");
        let new_count = get_u64(patch, "newLines");
        lines.push(format!(
            "@@ -{old_start},{old_count} +{new_start},{new_count} @@"
        ));
        if let Some(hunk) = patch.get("lines").and_then(Value::as_array) {
            for line in hunk {
                if let Some(text) = line.as_str() {
                    lines.push(text.to_string());
                }
            }
        }
    }
    lines.join("\n") + "\n"
}

fn get_u64(value: &Value, key: &str) -> u64 {
    value.get(key).and_then(Value::as_u64).unwrap_or(0)
}

/// Run a command with `input` on stdin and capture stdout.
fn pipe_through(cmd: &mut Command, input: &str) -> Result<String> {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .context("failed to spawn helper")?;

    if let Some(mut stdin) = child.stdin.take() {
        // The helper may exit early; a broken pipe here is not fatal.
        let _ = stdin.write_all(input.as_bytes());
    }

    let output = child.wait_with_output().context("helper did not exit")?;
    if !output.status.success() {
        bail!("helper exited with {}", output.status);
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unified_diff_has_headers_and_hunks() {
        let patches = vec![json!({
            "oldStart": 3, "oldLines": 2, "newStart": 3, "newLines": 3,
            "lines": [" fn main() {", "-    old();", "+    new();", "+    extra();"]
        })];
        let diff = build_unified_diff("src/main.rs", &patches);
        assert!(diff.starts_with("--- src/main.rs\n+++ src/main.rs\n"));
        assert!(diff.contains("@@ -3,2 +3,3 @@"));
        assert!(diff.contains("-    old();"));
        assert!(diff.contains("+    extra();"));
        assert!(diff.ends_with('\n'));
    }

    #[test]
    fn unified_diff_tolerates_missing_fields() {
        let patches = vec![json!({})];
        let diff = build_unified_diff("f", &patches);
        assert!(diff.contains("@@ -0,0 +0,0 @@"));
    }

    #[test]
    fn pipe_through_captures_stdout() {
        let out = pipe_through(&mut Command::new("cat"), "hello\n").unwrap();
        assert_eq!(out, "hello\n");
    }

    #[test]
    fn pipe_through_missing_binary_is_err() {
        assert!(pipe_through(&mut Command::new("definitely-not-a-real-helper"), "x").is_err());
    }

    #[test]
    fn markdown_falls_back_to_input_without_glow() {
        // Whether or not glow is installed, the result is non-empty and
        // derived from the input.
        let out = render_markdown("# Title");
        assert!(out.contains("Title"));
    }
}
