use anyhow::Result;

use super::types::InboundEvent;

/// Parse a single NDJSON line into an `InboundEvent`.
///
/// Returns `Ok(None)` for empty lines.
/// Returns `Err` for malformed JSON (caller should skip or echo, not crash).
pub fn parse_line(line: &str) -> Result<Option<InboundEvent>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let event: InboundEvent = serde_json::from_str(line)?;
    Ok(Some(event))
}

/// Whether a raw line looks like it was meant to be JSON.
///
/// Non-JSON-shaped lines (plain text from a wrapper script, say) are echoed
/// verbatim to the log; JSON-shaped lines that fail to parse are skipped.
pub fn looks_like_json(line: &str) -> bool {
    line.trim_start().starts_with('{')
}
