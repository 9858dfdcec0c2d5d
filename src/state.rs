use std::time::Duration;

use crate::display::status::StatusSnapshot;
use crate::protocol::types::TodoItem;

/// Process-wide counters overwritten by events and read on every status
/// redraw. Last write wins; nothing here persists.
#[derive(Debug, Default)]
pub struct SessionState {
    pub context_tokens: u64,
    pub total_cost_usd: f64,
    pub todos: Vec<TodoItem>,
    pub spinner_frame: usize,
}

impl SessionState {
    /// Freeze the current counters into a status snapshot.
    pub fn snapshot(
        &self,
        context_limit: u64,
        elapsed: Duration,
        queue_line: Option<String>,
    ) -> StatusSnapshot {
        StatusSnapshot {
            context_tokens: self.context_tokens,
            context_limit,
            total_cost_usd: self.total_cost_usd,
            elapsed,
            todos: self.todos.clone(),
            spinner_frame: self.spinner_frame,
            queue_line,
        }
    }
}
