//! The editable queue of upcoming loop iterations.
//!
//! The loop runner precomputes one mode/model/wait-command/TUI entry per
//! upcoming iteration and passes them down as environment sequences. While
//! the current iteration streams, the operator can reshape what runs next;
//! the edited queue is persisted to the settings file on exit.

use crate::config::RunContext;
use crate::display::input::InputAction;
use crate::display::theme;

const DELAY_STEP_SECS: u64 = 5;

/// Configuration for one upcoming iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationSlot {
    pub mode: String,
    pub model: String,
    pub wait_cmd: Option<String>,
    pub delay_secs: u64,
    pub tui: bool,
}

#[derive(Debug, Clone)]
pub struct IterationQueue {
    slots: Vec<IterationSlot>,
    selected: usize,
    mode_choices: Vec<String>,
    model_choices: Vec<String>,
    /// Wait command restored when toggling wait back on.
    wait_template: Option<String>,
}

impl IterationQueue {
    /// Build the queue from the precomputed env sequences. With no sequences
    /// at all, a single slot mirroring the current iteration is offered so
    /// the operator can still steer the next run.
    pub fn from_context(ctx: &RunContext) -> Self {
        let len = ctx
            .modes
            .len()
            .max(ctx.models.len())
            .max(ctx.wait_cmds.len())
            .max(ctx.tui_flags.len())
            .max(1);

        let slots = (0..len)
            .map(|i| IterationSlot {
                mode: ctx.modes.get(i).unwrap_or(&ctx.mode).clone(),
                model: ctx.models.get(i).unwrap_or(&ctx.model).clone(),
                wait_cmd: ctx.wait_cmds.get(i).filter(|c| !c.is_empty()).cloned(),
                delay_secs: ctx.delay_secs,
                tui: ctx.tui_flags.get(i).copied().unwrap_or(false),
            })
            .collect::<Vec<_>>();

        let mode_choices = distinct(ctx.modes.iter().chain(std::iter::once(&ctx.mode)));
        let model_choices = distinct(ctx.models.iter().chain(std::iter::once(&ctx.model)));
        let wait_template = ctx.wait_cmds.iter().find(|c| !c.is_empty()).cloned();

        Self {
            slots,
            selected: 0,
            mode_choices,
            model_choices,
            wait_template,
        }
    }

    pub fn slots(&self) -> &[IterationSlot] {
        &self.slots
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Apply one operator action. Returns true when anything changed
    /// (the status block needs a redraw).
    pub fn apply(&mut self, action: InputAction) -> bool {
        if self.slots.is_empty() {
            return false;
        }
        match action {
            InputAction::NextSlot => {
                self.selected = (self.selected + 1) % self.slots.len();
                return true;
            }
            InputAction::PrevSlot => {
                self.selected = (self.selected + self.slots.len() - 1) % self.slots.len();
                return true;
            }
            _ => {}
        }
        let slot = &mut self.slots[self.selected];
        match action {
            InputAction::CycleMode => {
                cycle(&mut slot.mode, &self.mode_choices);
                true
            }
            InputAction::CycleModel => {
                cycle(&mut slot.model, &self.model_choices);
                true
            }
            InputAction::ToggleWait => {
                if slot.wait_cmd.is_some() {
                    slot.wait_cmd = None;
                    true
                } else if let Some(ref template) = self.wait_template {
                    slot.wait_cmd = Some(template.clone());
                    true
                } else {
                    false
                }
            }
            InputAction::ToggleTui => {
                slot.tui = !slot.tui;
                true
            }
            InputAction::DelayUp => {
                slot.delay_secs += DELAY_STEP_SECS;
                true
            }
            InputAction::DelayDown => {
                let before = slot.delay_secs;
                slot.delay_secs = slot.delay_secs.saturating_sub(DELAY_STEP_SECS);
                before != slot.delay_secs
            }
            _ => false,
        }
    }

    /// One-line summary for the status block, selected slot highlighted.
    pub fn summary_line(&self) -> String {
        let mut parts = Vec::with_capacity(self.slots.len());
        for (i, slot) in self.slots.iter().enumerate() {
            let wait = if slot.wait_cmd.is_some() { "·wait" } else { "" };
            let tui = if slot.tui { "·tui" } else { "" };
            let text = format!(
                "[{}·{}·{}s{wait}{tui}]",
                slot.mode, slot.model, slot.delay_secs
            );
            if i == self.selected {
                parts.push(theme::queue_selected().apply(text).to_string());
            } else {
                parts.push(theme::dim().apply(text).to_string());
            }
        }
        format!(" {} {}", theme::dim().apply("next ▸"), parts.join(" "))
    }
}

fn cycle(current: &mut String, choices: &[String]) {
    if choices.is_empty() {
        return;
    }
    let pos = choices.iter().position(|c| c == current);
    let next = match pos {
        Some(i) => (i + 1) % choices.len(),
        None => 0,
    };
    current.clone_from(&choices[next]);
}

fn distinct<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        if !value.is_empty() && !out.contains(value) {
            out.push(value.clone());
        }
    }
    out
}
