use std::io::{self, Write};

use crossterm::queue;
use crossterm::style::Print;
use serde_json::Value;

use super::tool_format::{self, RESULT_LIMIT, truncate};
use super::{theme, truncate_styled_to_width};
use crate::config::RunContext;

/// Produces the scrolling event log. The pinned status block is drawn
/// separately; callers clear it before rendering and redraw it after.
pub struct Renderer<W: Write = io::Stdout> {
    out: W,
}

impl Default for Renderer<io::Stdout> {
    fn default() -> Self {
        Self { out: io::stdout() }
    }
}

impl Renderer<io::Stdout> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<W: Write> Renderer<W> {
    pub fn with_writer(writer: W) -> Self {
        Self { out: writer }
    }

    /// Recover the writer (used by tests to inspect output).
    pub fn into_writer(self) -> W {
        self.out
    }

    /// The run header printed once at startup:
    /// ` RALPH  BUILD • Loop 3/20 • main • opus`.
    pub fn render_banner(&mut self, ctx: &RunContext) {
        let badge = theme::banner().apply(" RALPH ");
        let loop_count = match ctx.max_iterations {
            Some(max) => format!("{}/{max}", ctx.iteration),
            None => ctx.iteration.to_string(),
        };
        let line = format!(
            " {} • Loop {loop_count} • {} • {}",
            ctx.mode.to_uppercase(),
            ctx.branch,
            ctx.model
        );
        queue!(self.out, Print(badge), Print(line), Print("\r\n")).ok();
        self.print_line(&theme::dim().apply("─".repeat(60)).to_string());
        self.out.flush().ok();
    }

    pub fn render_assistant_text(&mut self, text: &str) {
        queue!(
            self.out,
            Print("\r\n"),
            Print(theme::assistant_label().apply("◆ Claude")),
            Print("\r\n"),
        )
        .ok();
        for line in text.lines() {
            self.print_line(&format!("  {line}"));
        }
        self.out.flush().ok();
    }

    pub fn render_thinking(&mut self) {
        queue!(
            self.out,
            Print("\r\n"),
            Print(theme::dim_italic().apply("◇ Thinking...")),
            Print("\r\n"),
        )
        .ok();
        self.out.flush().ok();
    }

    /// A tool invocation: `⚙ Name` plus a recognized one-line detail, or the
    /// generic key-value dump for tools we don't know.
    pub fn render_tool_use(&mut self, name: &str, input: &Value) {
        queue!(
            self.out,
            Print("\r\n"),
            Print(theme::tool_name().apply(format!("⚙ {name}"))),
            Print("\r\n"),
        )
        .ok();
        match tool_format::format_tool_detail(name, input) {
            Some(detail) => self.print_line(&format!("  {detail}")),
            None => {
                for line in tool_format::format_kv(input, 2) {
                    self.print_line(&line);
                }
            }
        }
        self.out.flush().ok();
    }

    /// Header-only tool line for calls whose effect shows up in the status
    /// block instead of the log (TodoWrite).
    pub fn render_tool_label(&mut self, name: &str) {
        queue!(
            self.out,
            Print("\r\n"),
            Print(theme::tool_name().apply(format!("⚙ {name}"))),
            Print("\r\n"),
        )
        .ok();
        self.out.flush().ok();
    }

    /// Dim, truncated output text with no error inspection (stdout dumps).
    pub fn render_output(&mut self, text: &str) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        let msg = truncate(trimmed, RESULT_LIMIT);
        self.print_line(&theme::dim().apply(format!("  {msg}")).to_string());
        self.out.flush().ok();
    }

    /// A plain-string tool result: red `✗` for errors, dim text otherwise.
    pub fn render_text_result(&mut self, text: &str) {
        let lowered = text.to_lowercase();
        if lowered.contains("error") || text.starts_with("<tool_use_error>") {
            let msg = text
                .replace("<tool_use_error>", "")
                .replace("</tool_use_error>", "");
            let msg = truncate(msg.trim(), RESULT_LIMIT);
            self.print_line(&format!("  {}", theme::error().apply(format!("✗ {msg}"))));
        } else if !text.trim().is_empty() {
            let msg = truncate(text.trim(), RESULT_LIMIT);
            self.print_line(&theme::dim().apply(format!("  {msg}")).to_string());
        }
        self.out.flush().ok();
    }

    /// Summary line for a file read: `📄 path (N lines)`.
    pub fn render_file_read(&mut self, path: &str, line_count: usize) {
        self.print_line(&format!(
            "  {} {path} ({line_count} lines)",
            theme::field().apply("📄")
        ));
        self.out.flush().ok();
    }

    pub fn render_file_created(&mut self, path: &str) {
        self.print_line(&format!(
            "  {} {path}",
            theme::success().apply("✨ Created:")
        ));
        self.out.flush().ok();
    }

    pub fn render_match_count(&mut self, count: usize) {
        self.print_line(&format!(
            "  {}",
            theme::field().apply(format!("✓ Found {count} items"))
        ));
        self.out.flush().ok();
    }

    /// Command output plus its exit code, green on zero and red otherwise.
    pub fn render_command_result(&mut self, output: &str, exit_code: i64) {
        let trimmed = output.trim();
        if !trimmed.is_empty() {
            let msg = truncate(trimmed, RESULT_LIMIT);
            self.print_line(&theme::dim().apply(format!("  {msg}")).to_string());
        }
        let style = if exit_code == 0 {
            theme::success()
        } else {
            theme::error()
        };
        self.print_line(&format!("  {}", style.apply(format!("Exit: {exit_code}"))));
        self.out.flush().ok();
    }

    pub fn render_agent_done(&mut self) {
        self.print_line(&format!("  {}", theme::field().apply("Agent done")));
        self.out.flush().ok();
    }

    /// A colored unified diff (already run through the external colorizer),
    /// or the plain fallback header when the colorizer is unavailable.
    pub fn render_diff(&mut self, lines: &[String]) {
        for line in lines {
            self.print_line(&format!("  {line}"));
        }
        self.out.flush().ok();
    }

    pub fn render_diff_fallback(&mut self, path: &str) {
        self.print_line(&format!(
            "  {}",
            theme::error_banner().apply(format!("DIFF: {path}"))
        ));
        self.out.flush().ok();
    }

    /// Generic key-value dump (unrecognized result objects).
    pub fn render_kv(&mut self, value: &Value) {
        for line in tool_format::format_kv(value, 2) {
            self.print_line(&line);
        }
        self.out.flush().ok();
    }

    pub fn render_system_error(&mut self, message: &str) {
        queue!(
            self.out,
            Print("\r\n"),
            Print(theme::error_banner().apply("✗ System Error:")),
            Print(format!(" {message}")),
            Print("\r\n"),
        )
        .ok();
        self.out.flush().ok();
    }

    /// Turn-completion summary: cost, wall time, turn count.
    pub fn render_result(&mut self, subtype: &str, cost: f64, duration_ms: u64, num_turns: u32) {
        let label = if subtype == "success" { "Done" } else { "Error" };
        let style = if subtype == "success" {
            theme::result_line()
        } else {
            theme::error_banner()
        };
        // Round to tenths of a second (add 50ms to round instead of truncate)
        let rounded = duration_ms + 50;
        let whole_secs = rounded / 1000;
        let tenths = (rounded % 1000) / 100;
        let turn_word = if num_turns == 1 { "turn" } else { "turns" };
        let stats = format!("  ${cost:.2} · {whole_secs}.{tenths}s · {num_turns} {turn_word}");
        queue!(
            self.out,
            Print("\r\n"),
            Print(style.apply(label)),
            Print(theme::dim().apply(stats)),
            Print("\r\n"),
        )
        .ok();
        self.out.flush().ok();
    }

    /// Echo a non-JSON line from the stream verbatim, dimmed.
    pub fn render_raw_line(&mut self, line: &str) {
        self.print_line(&theme::dim().apply(line.trim_end()).to_string());
        self.out.flush().ok();
    }

    pub fn render_warning(&mut self, warning: &str) {
        self.print_line(&theme::dim().apply(format!("[warn] {warning}")).to_string());
        self.out.flush().ok();
    }

    /// Shutdown notice shown when the operator aborts the run.
    pub fn render_abort_notice(&mut self) {
        queue!(
            self.out,
            Print("\r\n"),
            Print(theme::error_banner().apply("Aborted by operator")),
            Print("\r\n"),
        )
        .ok();
        self.out.flush().ok();
    }

    /// Single-interrupt hint: one more Ctrl+C within the window aborts.
    pub fn render_interrupt_hint(&mut self) {
        self.print_line(
            &theme::dim()
                .apply("(press Ctrl+C again within 2s to abort the loop)")
                .to_string(),
        );
        self.out.flush().ok();
    }

    pub fn write_raw(&mut self, text: &str) {
        queue!(self.out, Print(text)).ok();
        self.out.flush().ok();
    }

    fn print_line(&mut self, line: &str) {
        let line = truncate_long_line(line);
        queue!(self.out, Print(line), Print("\r\n")).ok();
    }
}

/// Cap pathological single lines at a generous multiple of the terminal
/// width so one megabyte of minified JSON can't wedge the log.
fn truncate_long_line(line: &str) -> String {
    let max = super::term_width() * 8;
    if line.chars().count() > max {
        truncate_styled_to_width(line, max)
    } else {
        line.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rendered(f: impl FnOnce(&mut Renderer<Vec<u8>>)) -> String {
        let mut renderer = Renderer::with_writer(Vec::new());
        f(&mut renderer);
        String::from_utf8(renderer.out).unwrap()
    }

    #[test]
    fn banner_includes_mode_iteration_branch_model() {
        let ctx = RunContext {
            mode: "build".to_string(),
            iteration: 3,
            branch: "main".to_string(),
            model: "opus".to_string(),
            ..RunContext::default()
        };
        let out = rendered(|r| r.render_banner(&ctx));
        assert!(out.contains("RALPH"));
        assert!(out.contains("BUILD • Loop 3 • main • opus"));

        let capped = RunContext {
            max_iterations: Some(20),
            ..ctx
        };
        let out = rendered(|r| r.render_banner(&capped));
        assert!(out.contains("Loop 3/20"));
    }

    #[test]
    fn assistant_text_is_labeled_and_indented() {
        let out = rendered(|r| r.render_assistant_text("first\nsecond"));
        assert!(out.contains("◆ Claude"));
        assert!(out.contains("  first\r\n"));
        assert!(out.contains("  second\r\n"));
    }

    #[test]
    fn tool_use_known_tool_one_liner() {
        let out = rendered(|r| r.render_tool_use("Read", &json!({"file_path": "/a.rs"})));
        assert!(out.contains("⚙ Read"));
        assert!(out.contains("/a.rs"));
    }

    #[test]
    fn tool_use_unknown_tool_dumps_kv() {
        let out = rendered(|r| {
            r.render_tool_use("mcp__custom__call", &json!({"query": "find things"}));
        });
        assert!(out.contains("⚙ mcp__custom__call"));
        assert!(out.contains("query:"));
        assert!(out.contains("find things"));
    }

    #[test]
    fn text_result_error_shape() {
        let out = rendered(|r| r.render_text_result("<tool_use_error>boom</tool_use_error>"));
        assert!(out.contains('✗'));
        assert!(out.contains("boom"));
        assert!(!out.contains("tool_use_error"));
    }

    #[test]
    fn text_result_truncates_at_limit() {
        let long = "x".repeat(RESULT_LIMIT + 25);
        let out = rendered(|r| r.render_text_result(&long));
        assert!(out.contains("[25 more chars]"));
        assert!(!out.contains(&"x".repeat(RESULT_LIMIT + 1)));
    }

    #[test]
    fn command_result_exit_code_styles() {
        let ok = rendered(|r| r.render_command_result("fine", 0));
        assert!(ok.contains("Exit: 0"));
        let bad = rendered(|r| r.render_command_result("", 2));
        assert!(bad.contains("Exit: 2"));
    }

    #[test]
    fn system_error_banner() {
        let out = rendered(|r| r.render_system_error("credit exhausted"));
        assert!(out.contains("✗ System Error:"));
        assert!(out.contains("credit exhausted"));
    }

    #[test]
    fn result_summary_success_and_failure() {
        let out = rendered(|r| r.render_result("success", 0.42, 61_950, 7));
        assert!(out.contains("Done"));
        assert!(out.contains("$0.42"));
        assert!(out.contains("62.0s"));
        assert!(out.contains("7 turns"));

        let err = rendered(|r| r.render_result("error_during_execution", 0.0, 100, 1));
        assert!(err.contains("Error"));
        assert!(err.contains("1 turn"));
    }

    #[test]
    fn raw_line_is_echoed_trimmed() {
        let out = rendered(|r| r.render_raw_line("plain wrapper output\n"));
        assert!(out.contains("plain wrapper output"));
    }
}
