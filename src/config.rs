use std::path::PathBuf;

/// Read-only run configuration handed down by the loop runner through
/// `RALPH_*` environment variables.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub mode: String,
    pub iteration: u32,
    pub max_iterations: Option<u32>,
    pub model: String,
    pub branch: String,
    /// Where to persist the next run's queue on exit.
    pub settings_path: Option<PathBuf>,
    /// Pid file of the companion loop process, signalled on abort.
    pub pid_path: Option<PathBuf>,
    /// Precomputed sequences for the upcoming iterations, one entry each.
    pub modes: Vec<String>,
    pub models: Vec<String>,
    pub wait_cmds: Vec<String>,
    pub tui_flags: Vec<bool>,
    pub delay_secs: u64,
    /// Token budget for the context progress bar.
    pub context_limit: u64,
}

impl Default for RunContext {
    fn default() -> Self {
        Self {
            mode: "?".to_string(),
            iteration: 1,
            max_iterations: None,
            model: "?".to_string(),
            branch: "?".to_string(),
            settings_path: None,
            pid_path: None,
            modes: Vec::new(),
            models: Vec::new(),
            wait_cmds: Vec::new(),
            tui_flags: Vec::new(),
            delay_secs: 0,
            context_limit: 200_000,
        }
    }
}

impl RunContext {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup (injectable for tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        Self {
            mode: get("RALPH_MODE").unwrap_or(defaults.mode),
            iteration: get("RALPH_ITERATION")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.iteration),
            max_iterations: get("RALPH_MAX_ITERATIONS").and_then(|v| v.parse().ok()),
            model: get("RALPH_MODEL").unwrap_or(defaults.model),
            branch: get("RALPH_BRANCH").unwrap_or(defaults.branch),
            settings_path: get("RALPH_SETTINGS_FILE").map(PathBuf::from),
            pid_path: get("RALPH_PID_FILE").map(PathBuf::from),
            modes: get("RALPH_MODES").map(|v| split_list(&v)).unwrap_or_default(),
            models: get("RALPH_MODELS")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            wait_cmds: get("RALPH_WAIT_CMDS")
                .map(|v| split_list_keep_empty(&v))
                .unwrap_or_default(),
            tui_flags: get("RALPH_TUI_FLAGS")
                .map(|v| split_list(&v).iter().map(|f| f == "1" || f == "true").collect())
                .unwrap_or_default(),
            delay_secs: get("RALPH_DELAY_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.delay_secs),
            context_limit: get("RALPH_CONTEXT_LIMIT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.context_limit),
        }
    }
}

/// Split a comma-separated sequence, trimming whitespace around entries.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Like [`split_list`] but keeps empty entries. Wait commands are positional:
/// an empty entry means "no wait command for that iteration".
fn split_list_keep_empty(value: &str) -> Vec<String> {
    value.split(',').map(|s| s.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn ctx(vars: &[(&str, &str)]) -> RunContext {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        RunContext::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let context = ctx(&[]);
        assert_eq!(context.mode, "?");
        assert_eq!(context.iteration, 1);
        assert_eq!(context.context_limit, 200_000);
        assert!(context.settings_path.is_none());
        assert!(context.modes.is_empty());
    }

    #[test]
    fn reads_scalar_vars() {
        let context = ctx(&[
            ("RALPH_MODE", "build"),
            ("RALPH_ITERATION", "4"),
            ("RALPH_MODEL", "opus"),
            ("RALPH_BRANCH", "feature/x"),
            ("RALPH_DELAY_SECS", "15"),
            ("RALPH_CONTEXT_LIMIT", "100000"),
        ]);
        assert_eq!(context.mode, "build");
        assert_eq!(context.iteration, 4);
        assert_eq!(context.model, "opus");
        assert_eq!(context.branch, "feature/x");
        assert_eq!(context.delay_secs, 15);
        assert_eq!(context.context_limit, 100_000);
    }

    #[test]
    fn splits_sequences_and_parses_flags() {
        let context = ctx(&[
            ("RALPH_MODES", "build, test ,polish"),
            ("RALPH_MODELS", "opus,sonnet"),
            ("RALPH_TUI_FLAGS", "1,0,true"),
        ]);
        assert_eq!(context.modes, vec!["build", "test", "polish"]);
        assert_eq!(context.models, vec!["opus", "sonnet"]);
        assert_eq!(context.tui_flags, vec![true, false, true]);
    }

    #[test]
    fn wait_cmds_keep_empty_positions() {
        let context = ctx(&[("RALPH_WAIT_CMDS", ",make check,")]);
        assert_eq!(context.wait_cmds, vec!["", "make check", ""]);
    }

    #[test]
    fn garbage_numbers_fall_back_to_defaults() {
        let context = ctx(&[("RALPH_ITERATION", "not-a-number")]);
        assert_eq!(context.iteration, 1);
    }
}
