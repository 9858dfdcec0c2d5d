//! The redrawable status block pinned beneath the scrolling event log.
//!
//! Line content is computed as a pure function of a [`StatusSnapshot`], so a
//! redraw with unchanged state reproduces the exact same bytes. The draw path
//! remembers how many lines it last produced and clears exactly that many
//! before reprinting.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use crossterm::{cursor, queue};

use super::{theme, truncate_styled_to_width, truncate_to_width};
use crate::protocol::types::{TodoItem, TodoStatus};

pub const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const BAR_CELLS: u64 = 20;
const TODO_CAP: usize = 3;

/// Everything the status block needs to render, captured at one instant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusSnapshot {
    pub context_tokens: u64,
    pub context_limit: u64,
    pub total_cost_usd: f64,
    pub elapsed: Duration,
    pub todos: Vec<TodoItem>,
    pub spinner_frame: usize,
    /// Preformatted summary of the upcoming iteration queue, when interactive.
    pub queue_line: Option<String>,
}

/// Compute the block's lines for a given terminal width.
pub fn compose_lines(snapshot: &StatusSnapshot, width: usize) -> Vec<String> {
    let mut lines = Vec::with_capacity(TODO_CAP + 3);
    lines.push(separator(width));
    lines.push(progress_line(snapshot));

    if snapshot.todos.is_empty() {
        let frame = SPINNER_FRAMES[snapshot.spinner_frame % SPINNER_FRAMES.len()];
        lines.push(format!(
            " {} {}",
            theme::todo_active().apply(frame),
            theme::dim().apply("working...")
        ));
    } else {
        for todo in snapshot.todos.iter().take(TODO_CAP) {
            lines.push(todo_line(todo, width));
        }
        if snapshot.todos.len() > TODO_CAP {
            let more = snapshot.todos.len() - TODO_CAP;
            lines.push(format!(
                " {}",
                theme::dim().apply(format!("... and {more} more"))
            ));
        }
    }

    if let Some(ref queue) = snapshot.queue_line {
        // Already styled; truncate on visible columns, not escape bytes.
        lines.push(truncate_styled_to_width(queue, width));
    }
    lines
}

fn separator(width: usize) -> String {
    theme::dim().apply("─".repeat(width)).to_string()
}

fn progress_line(snapshot: &StatusSnapshot) -> String {
    let pct = if snapshot.context_limit > 0 {
        (snapshot.context_tokens * 100 / snapshot.context_limit).min(100)
    } else {
        0
    };
    let filled = (pct / 5).min(BAR_CELLS);
    let empty = BAR_CELLS - filled;

    let bar_style = if pct < 50 {
        theme::bar_ok()
    } else if pct < 80 {
        theme::bar_warn()
    } else {
        theme::bar_hot()
    };

    let bar = format!(
        "{}{}",
        bar_style.apply("█".repeat(filled as usize)),
        theme::dim().apply("░".repeat(empty as usize))
    );
    let tokens = format!(
        "{}k/{}k",
        snapshot.context_tokens / 1000,
        snapshot.context_limit / 1000
    );
    format!(
        " {bar} {}  {}  {}",
        theme::dim().apply(format!("{pct}% ({tokens})")),
        theme::dim().apply(format!("${:.4}", snapshot.total_cost_usd)),
        theme::dim().apply(format!("⏱ {}", format_elapsed(snapshot.elapsed)))
    )
}

fn todo_line(todo: &TodoItem, width: usize) -> String {
    let budget = width.saturating_sub(4);
    match todo.status {
        TodoStatus::Completed => format!(
            " {} {}",
            theme::todo_done().apply("✓"),
            truncate_to_width(&todo.content, budget)
        ),
        TodoStatus::InProgress => format!(
            " {} {}",
            theme::todo_active().apply("▶"),
            theme::bold().apply(truncate_to_width(&todo.active_form, budget))
        ),
        TodoStatus::Pending => format!(
            " {} {}",
            theme::dim().apply("○"),
            truncate_to_width(&todo.content, budget)
        ),
    }
}

/// Render elapsed wall time as `42s` below a minute, `3m42s` above.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 60 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}

/// Owns the drawn block: tracks its height so the next draw can remove it.
pub struct StatusBlock<W: Write = io::Stdout> {
    last_height: usize,
    out: W,
}

impl Default for StatusBlock<io::Stdout> {
    fn default() -> Self {
        Self {
            last_height: 0,
            out: io::stdout(),
        }
    }
}

impl StatusBlock<io::Stdout> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<W: Write> StatusBlock<W> {
    pub fn with_writer(writer: W) -> Self {
        Self {
            last_height: 0,
            out: writer,
        }
    }

    pub fn last_height(&self) -> usize {
        self.last_height
    }

    /// Remove the previously drawn block, leaving the cursor where the
    /// scrolling log can continue. Safe to call when nothing is drawn.
    pub fn clear(&mut self) {
        if self.last_height == 0 {
            return;
        }
        queue!(self.out, Print("\r"), Clear(ClearType::CurrentLine)).ok();
        for _ in 1..self.last_height {
            queue!(self.out, cursor::MoveUp(1), Clear(ClearType::CurrentLine)).ok();
        }
        self.last_height = 0;
        self.out.flush().ok();
    }

    /// Redraw the block from a snapshot. Clears any previous drawing first,
    /// so calling this repeatedly with the same snapshot is idempotent.
    pub fn draw(&mut self, snapshot: &StatusSnapshot, width: usize) {
        self.clear();
        let lines = compose_lines(snapshot, width);
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                queue!(self.out, Print("\r\n")).ok();
            }
            queue!(self.out, Print(line)).ok();
        }
        self.last_height = lines.len();
        self.out.flush().ok();
    }
}
