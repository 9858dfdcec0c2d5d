use std::io::Write;

use serde_json::Value;

use display::renderer::Renderer;
use protocol::types::{ContentBlock, InboundEvent, TodoItem};
use state::SessionState;

pub mod config;
pub mod display;
pub mod event;
pub mod external;
pub mod protocol;
pub mod queue;
pub mod session;
pub mod settings;
pub mod state;

/// Handle one inbound event: update the status counters and render the
/// scrolling log. Returns true when the status block needs a redraw.
///
/// Unexpected shapes degrade to the generic key-value dump or are skipped;
/// nothing in here can take down the stream consumer.
pub fn handle_inbound<W: Write>(
    event: &InboundEvent,
    state: &mut SessionState,
    renderer: &mut Renderer<W>,
) -> bool {
    match event {
        InboundEvent::Assistant(msg) => {
            let mut changed = false;
            if let Some(ref usage) = msg.message.usage {
                state.context_tokens = usage.context_tokens();
                changed = true;
            }
            for block in &msg.message.content {
                match block {
                    ContentBlock::Text { text } => {
                        if !text.trim().is_empty() {
                            let rendered = external::render_markdown(text);
                            renderer.render_assistant_text(&rendered);
                        }
                    }
                    ContentBlock::Thinking { thinking } => {
                        if !thinking.trim().is_empty() {
                            renderer.render_thinking();
                        }
                    }
                    ContentBlock::ToolUse { name, input, .. } => {
                        if name == "TodoWrite" {
                            renderer.render_tool_label(name);
                            if let Some(todos) = parse_todos(input.get("todos")) {
                                state.todos = todos;
                                changed = true;
                            }
                        } else {
                            renderer.render_tool_use(name, input);
                        }
                    }
                    ContentBlock::Other => {}
                }
            }
            changed
        }
        InboundEvent::User(user) => match user.tool_use_result {
            Some(ref result) => handle_tool_result(result, state, renderer),
            None => false,
        },
        InboundEvent::System(sys) => {
            if sys.is_error {
                renderer.render_system_error(sys.message.as_deref().unwrap_or("unknown"));
            }
            false
        }
        InboundEvent::Result(result) => {
            state.total_cost_usd += result.total_cost_usd;
            if let Some(ref usage) = result.usage {
                state.context_tokens = usage.context_tokens();
            }
            renderer.render_result(
                &result.subtype,
                result.total_cost_usd,
                result.duration_ms,
                result.num_turns,
            );
            true
        }
        InboundEvent::Other => false,
    }
}

/// Dispatch a tool result by shape. Returns true when todos changed.
fn handle_tool_result<W: Write>(
    result: &Value,
    state: &mut SessionState,
    renderer: &mut Renderer<W>,
) -> bool {
    match result {
        Value::String(text) => {
            renderer.render_text_result(text);
            false
        }
        Value::Object(map) => {
            if map.contains_key("newTodos") {
                if let Some(todos) = parse_todos(map.get("newTodos")) {
                    state.todos = todos;
                    return true;
                }
                return false;
            }
            if map.get("type").and_then(Value::as_str) == Some("text")
                && let Some(file) = map.get("file")
            {
                let path = file
                    .get("filePath")
                    .and_then(Value::as_str)
                    .unwrap_or("?");
                let lines = file
                    .get("content")
                    .and_then(Value::as_str)
                    .map_or(0, |c| c.split('\n').count());
                renderer.render_file_read(path, lines);
                return false;
            }
            if let Some(patches) = map.get("structuredPatch").and_then(Value::as_array) {
                let path = map
                    .get("filePath")
                    .and_then(Value::as_str)
                    .unwrap_or("?");
                match external::colorize_diff(path, patches) {
                    Some(lines) => renderer.render_diff(&lines),
                    None => renderer.render_diff_fallback(path),
                }
                return false;
            }
            if map.get("type").and_then(Value::as_str) == Some("create") {
                let path = map
                    .get("filePath")
                    .and_then(Value::as_str)
                    .unwrap_or("?");
                renderer.render_file_created(path);
                return false;
            }
            if let Some(items) = map
                .get("filenames")
                .or_else(|| map.get("matches"))
                .and_then(Value::as_array)
            {
                renderer.render_match_count(items.len());
                return false;
            }
            if let (Some(output), Some(code)) = (
                map.get("output").and_then(Value::as_str),
                map.get("exitCode").and_then(Value::as_i64),
            ) {
                renderer.render_command_result(output, code);
                return false;
            }
            if map.contains_key("result") && map.contains_key("usage") {
                renderer.render_agent_done();
                return false;
            }
            if let Some(stdout) = map.get("stdout").and_then(Value::as_str) {
                renderer.render_output(stdout);
                return false;
            }
            renderer.render_kv(result);
            false
        }
        other => {
            renderer.render_kv(other);
            false
        }
    }
}

fn parse_todos(value: Option<&Value>) -> Option<Vec<TodoItem>> {
    serde_json::from_value(value?.clone()).ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::protocol::parse::parse_line;
    use crate::protocol::types::TodoStatus;

    fn dispatch(line: &str, state: &mut SessionState) -> (bool, String) {
        let event = parse_line(line).unwrap().unwrap();
        let mut renderer = Renderer::with_writer(Vec::new());
        let changed = handle_inbound(&event, state, &mut renderer);
        (changed, String::from_utf8(renderer.into_writer()).unwrap())
    }

    #[test]
    fn assistant_usage_updates_context_tokens() {
        let mut state = SessionState::default();
        let line = r#"{"type":"assistant","message":{"content":[],"usage":{"input_tokens":10,"cache_read_input_tokens":60,"cache_creation_input_tokens":30,"output_tokens":500}}}"#;
        let (changed, _) = dispatch(line, &mut state);
        assert!(changed);
        assert_eq!(state.context_tokens, 100);
    }

    #[test]
    fn todo_write_replaces_todo_list_wholesale() {
        let mut state = SessionState::default();
        state.todos = vec![TodoItem {
            content: "old".to_string(),
            active_form: String::new(),
            status: TodoStatus::Pending,
        }];
        let line = r#"{"type":"assistant","message":{"content":[{"type":"tool_use","id":"t1","name":"TodoWrite","input":{"todos":[{"content":"a","activeForm":"doing a","status":"in_progress"}]}}]}}"#;
        let (changed, out) = dispatch(line, &mut state);
        assert!(changed);
        assert_eq!(state.todos.len(), 1);
        assert_eq!(state.todos[0].status, TodoStatus::InProgress);
        assert!(out.contains("⚙ TodoWrite"));
    }

    #[test]
    fn new_todos_result_replaces_list() {
        let mut state = SessionState::default();
        let line = r#"{"type":"user","tool_use_result":{"newTodos":[{"content":"x","activeForm":"","status":"completed"},{"content":"y","activeForm":"","status":"pending"}]}}"#;
        let (changed, _) = dispatch(line, &mut state);
        assert!(changed);
        assert_eq!(state.todos.len(), 2);
    }

    #[test]
    fn string_result_error_goes_through_error_path() {
        let mut state = SessionState::default();
        let line = r#"{"type":"user","tool_use_result":"Error: file not found"}"#;
        let (_, out) = dispatch(line, &mut state);
        assert!(out.contains('✗'));
    }

    #[test]
    fn file_read_result_summarized() {
        let mut state = SessionState::default();
        let line = r#"{"type":"user","tool_use_result":{"type":"text","file":{"filePath":"/src/lib.rs","content":"a\nb\nc"}}}"#;
        let (_, out) = dispatch(line, &mut state);
        assert!(out.contains("/src/lib.rs"));
        assert!(out.contains("(3 lines)"));
    }

    #[test]
    fn command_result_shows_exit_code() {
        let mut state = SessionState::default();
        let line = r#"{"type":"user","tool_use_result":{"output":"built ok","exitCode":0}}"#;
        let (_, out) = dispatch(line, &mut state);
        assert!(out.contains("built ok"));
        assert!(out.contains("Exit: 0"));
    }

    #[test]
    fn match_results_counted() {
        let mut state = SessionState::default();
        let line = r#"{"type":"user","tool_use_result":{"filenames":["a.rs","b.rs","c.rs"]}}"#;
        let (_, out) = dispatch(line, &mut state);
        assert!(out.contains("Found 3 items"));
    }

    #[test]
    fn unknown_result_shape_dumps_kv() {
        let mut state = SessionState::default();
        let line = r#"{"type":"user","tool_use_result":{"mystery":"value","empty":""}}"#;
        let (_, out) = dispatch(line, &mut state);
        assert!(out.contains("mystery:"));
        assert!(out.contains("value"));
        assert!(!out.contains("empty"));
    }

    #[test]
    fn system_error_renders_banner() {
        let mut state = SessionState::default();
        let line = r#"{"type":"system","subtype":"status","is_error":true,"message":"out of credit"}"#;
        let (changed, out) = dispatch(line, &mut state);
        assert!(!changed);
        assert!(out.contains("System Error"));
        assert!(out.contains("out of credit"));
    }

    #[test]
    fn system_non_error_is_silent() {
        let mut state = SessionState::default();
        let line = r#"{"type":"system","subtype":"init","model":"opus"}"#;
        let (_, out) = dispatch(line, &mut state);
        assert!(out.is_empty());
    }

    #[test]
    fn result_accumulates_cost() {
        let mut state = SessionState::default();
        let line = r#"{"type":"result","subtype":"success","total_cost_usd":0.5,"duration_ms":1000,"num_turns":2,"result":"done"}"#;
        dispatch(line, &mut state);
        let (changed, out) = dispatch(line, &mut state);
        assert!(changed);
        assert!((state.total_cost_usd - 1.0).abs() < f64::EPSILON);
        assert!(out.contains("Done"));
    }

    #[test]
    fn unknown_event_type_is_ignored() {
        let mut state = SessionState::default();
        let (changed, out) = dispatch(r#"{"type":"stream_event","event":{}}"#, &mut state);
        assert!(!changed);
        assert!(out.is_empty());
    }

    #[test]
    fn subagent_completion_noted() {
        let mut state = SessionState::default();
        let line = r#"{"type":"user","tool_use_result":{"result":"all done","usage":{"input_tokens":1}}}"#;
        let (_, out) = dispatch(line, &mut state);
        assert!(out.contains("Agent done"));
    }
}
