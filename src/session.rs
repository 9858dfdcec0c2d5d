//! The single consuming task: stdin lines, operator keys, and the spinner
//! tick all funnel into one select loop, so every status-block redraw is
//! serialized with the scrolling log and the cursor never races.

use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{Event, EventStream};
use crossterm::terminal;
use futures::StreamExt;
use tokio::io::AsyncBufReadExt;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;

use crate::config::RunContext;
use crate::display::input::{InputAction, decode_key};
use crate::display::renderer::Renderer;
use crate::display::status::StatusBlock;
use crate::display::term_width;
use crate::event::AppEvent;
use crate::handle_inbound;
use crate::protocol::parse::{looks_like_json, parse_line};
use crate::queue::IterationQueue;
use crate::settings::Settings;
use crate::state::SessionState;

const TICK: Duration = Duration::from_millis(120);

/// Two interrupts inside this window abort the whole loop run.
pub const ABORT_WINDOW: Duration = Duration::from_secs(2);

/// Tracks interrupt presses; only a second press inside the window aborts.
#[derive(Debug, Default)]
pub struct InterruptWindow {
    last: Option<Instant>,
}

impl InterruptWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press at `now`; returns true when it lands within
    /// [`ABORT_WINDOW`] of the previous press.
    pub fn register(&mut self, now: Instant) -> bool {
        let abort = matches!(self.last, Some(prev) if now.duration_since(prev) <= ABORT_WINDOW);
        self.last = Some(now);
        abort
    }
}

/// Enables raw mode for the keypress side channel; restores it on drop.
/// Failure (no controlling terminal) silently disables interactivity.
struct RawModeGuard {
    active: bool,
}

impl RawModeGuard {
    fn acquire() -> Self {
        Self {
            active: terminal::enable_raw_mode().is_ok(),
        }
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.active {
            terminal::disable_raw_mode().ok();
        }
    }
}

/// Consume the event stream until EOF or operator abort.
pub async fn run(ctx: &RunContext, interactive: bool) -> Result<()> {
    let mut renderer = Renderer::new();
    let mut status = StatusBlock::new();
    let mut state = SessionState::default();
    let mut queue = IterationQueue::from_context(ctx);
    let mut interrupts = InterruptWindow::new();
    let started = Instant::now();

    let raw = interactive.then(RawModeGuard::acquire);
    let interactive = raw.as_ref().is_some_and(|guard| guard.active);
    let mut keys = interactive.then(EventStream::new);

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    spawn_stdin_reader(event_tx);

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut ticker = tokio::time::interval(TICK);

    renderer.render_banner(ctx);
    let queue_line = interactive.then(|| queue.summary_line());
    redraw(&mut status, &state, ctx, started, queue_line);

    let mut aborted = false;
    loop {
        tokio::select! {
            maybe_event = event_rx.recv() => {
                match maybe_event {
                    Some(AppEvent::Inbound(event)) => {
                        status.clear();
                        handle_inbound(&event, &mut state, &mut renderer);
                        let queue_line = interactive.then(|| queue.summary_line());
                        redraw(&mut status, &state, ctx, started, queue_line);
                    }
                    Some(AppEvent::RawLine(line)) => {
                        status.clear();
                        renderer.render_raw_line(&line);
                        let queue_line = interactive.then(|| queue.summary_line());
                        redraw(&mut status, &state, ctx, started, queue_line);
                    }
                    Some(AppEvent::Eof) | None => break,
                }
            }
            _ = ticker.tick() => {
                state.spinner_frame = state.spinner_frame.wrapping_add(1);
                let queue_line = interactive.then(|| queue.summary_line());
                redraw(&mut status, &state, ctx, started, queue_line);
            }
            _ = sigint.recv() => {
                if on_interrupt(&mut interrupts, &mut status, &mut renderer) {
                    aborted = true;
                    break;
                }
                let queue_line = interactive.then(|| queue.summary_line());
                redraw(&mut status, &state, ctx, started, queue_line);
            }
            maybe_key = next_key(&mut keys) => {
                let Some(key) = maybe_key else {
                    // Key stream closed; stop polling it.
                    keys = None;
                    continue;
                };
                match decode_key(&key) {
                    InputAction::Interrupt => {
                        if on_interrupt(&mut interrupts, &mut status, &mut renderer) {
                            aborted = true;
                            break;
                        }
                        let queue_line = interactive.then(|| queue.summary_line());
                        redraw(&mut status, &state, ctx, started, queue_line);
                    }
                    action => {
                        if queue.apply(action) {
                            redraw(&mut status, &state, ctx, started, Some(queue.summary_line()));
                        }
                    }
                }
            }
        }
    }

    if aborted {
        signal_companion(ctx.pid_path.as_deref(), &mut renderer);
    }
    write_settings(ctx, &queue, aborted, &mut renderer);
    renderer.write_raw("\r\n");
    drop(raw);
    Ok(())
}

/// Read NDJSON lines from stdin and forward them as app events.
/// Malformed JSON-shaped lines are skipped; plain text is echoed.
fn spawn_stdin_reader(event_tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let reader = tokio::io::BufReader::new(tokio::io::stdin());
        forward_lines(reader, &event_tx).await;
        let _ = event_tx.send(AppEvent::Eof);
    });
}

/// Forward lines from a reader until EOF or the receiver hangs up.
/// An undecodable line (invalid UTF-8, say) is skipped, not treated as EOF.
async fn forward_lines<R>(reader: R, event_tx: &mpsc::UnboundedSender<AppEvent>)
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return,
            // Invalid UTF-8 consumes the bad line; anything else is fatal.
            Err(err) if err.kind() == std::io::ErrorKind::InvalidData => continue,
            Err(_) => return,
        };
        match parse_line(&line) {
            Ok(Some(event)) => {
                if event_tx.send(AppEvent::Inbound(Box::new(event))).is_err() {
                    return;
                }
            }
            Ok(None) => {}
            Err(_) => {
                if !looks_like_json(&line)
                    && !line.trim().is_empty()
                    && event_tx.send(AppEvent::RawLine(line)).is_err()
                {
                    return;
                }
            }
        }
    }
}

/// Poll the key stream if one exists; otherwise park this arm forever.
async fn next_key(keys: &mut Option<EventStream>) -> Option<crossterm::event::KeyEvent> {
    match keys {
        Some(stream) => loop {
            match stream.next().await {
                Some(Ok(Event::Key(key))) => return Some(key),
                Some(Ok(_)) => {}
                Some(Err(_)) | None => return None,
            }
        },
        None => std::future::pending().await,
    }
}

/// Handle one interrupt press. Returns true when the run should abort.
fn on_interrupt<W: Write>(
    interrupts: &mut InterruptWindow,
    status: &mut StatusBlock,
    renderer: &mut Renderer<W>,
) -> bool {
    status.clear();
    if interrupts.register(Instant::now()) {
        renderer.render_abort_notice();
        true
    } else {
        renderer.render_interrupt_hint();
        false
    }
}

fn redraw(
    status: &mut StatusBlock,
    state: &SessionState,
    ctx: &RunContext,
    started: Instant,
    queue_line: Option<String>,
) {
    let snapshot = state.snapshot(ctx.context_limit, started.elapsed(), queue_line);
    status.draw(&snapshot, term_width());
}

/// Persist the next run's queue. Failures are reported but never fatal.
fn write_settings<W: Write>(
    ctx: &RunContext,
    queue: &IterationQueue,
    aborted: bool,
    renderer: &mut Renderer<W>,
) {
    let Some(ref path) = ctx.settings_path else {
        return;
    };
    let settings = Settings::from_queue(ctx.iteration + 1, aborted, queue.slots());
    if let Err(err) = settings.write_to(path) {
        renderer.render_warning(&format!("could not write settings: {err}"));
    }
}

/// Tell the companion loop process to stop: read its pid file, SIGTERM it.
fn signal_companion<W: Write>(pid_path: Option<&Path>, renderer: &mut Renderer<W>) {
    let Some(path) = pid_path else { return };
    let pid = std::fs::read_to_string(path)
        .ok()
        .and_then(|raw| raw.trim().parse::<i32>().ok());
    match pid {
        Some(pid) if pid > 0 => {
            // SAFETY: plain kill(2) with a validated positive pid.
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
        _ => renderer.render_warning("abort: no companion pid to signal"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_interrupt_does_not_abort() {
        let mut window = InterruptWindow::new();
        assert!(!window.register(Instant::now()));
    }

    #[test]
    fn double_interrupt_within_window_aborts() {
        let mut window = InterruptWindow::new();
        let first = Instant::now();
        assert!(!window.register(first));
        assert!(window.register(first + Duration::from_millis(500)));
    }

    #[test]
    fn interrupt_after_window_expires_starts_over() {
        let mut window = InterruptWindow::new();
        let first = Instant::now();
        assert!(!window.register(first));
        let late = first + ABORT_WINDOW + Duration::from_millis(1);
        assert!(!window.register(late));
        // But the late press re-arms the window
        assert!(window.register(late + Duration::from_millis(100)));
    }

    #[test]
    fn interrupt_exactly_at_window_edge_aborts() {
        let mut window = InterruptWindow::new();
        let first = Instant::now();
        window.register(first);
        assert!(window.register(first + ABORT_WINDOW));
    }

    #[tokio::test]
    #[allow(clippy::panic)]
    async fn reader_skips_undecodable_lines_and_continues() {
        let input: &[u8] = b"\xff\xfe not utf-8\n{\"type\":\"result\",\"subtype\":\"success\"}\nplain wrapper text\n";
        let (tx, mut rx) = mpsc::unbounded_channel();
        forward_lines(tokio::io::BufReader::new(input), &tx).await;
        drop(tx);

        assert!(matches!(rx.recv().await, Some(AppEvent::Inbound(_))));
        match rx.recv().await {
            Some(AppEvent::RawLine(line)) => assert!(line.contains("plain wrapper text")),
            other => panic!("expected an echoed raw line, got {other:?}"),
        }
        assert!(rx.recv().await.is_none());
    }
}
