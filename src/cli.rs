use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "ralph-format",
    about = "Streaming terminal formatter for a Claude Code agent loop",
    version
)]
pub struct Cli {
    /// Accept keypresses to edit the queue of upcoming loop iterations.
    #[arg(long)]
    pub interactive: bool,

    /// Token budget for the context progress bar (overrides RALPH_CONTEXT_LIMIT).
    #[arg(long, value_name = "TOKENS")]
    pub context_limit: Option<u64>,
}
