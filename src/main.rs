mod cli;

use anyhow::Result;
use clap::Parser;
use ralph_format::config::RunContext;
use ralph_format::session;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    install_panic_hook();
    let cli = Cli::parse();
    let mut ctx = RunContext::from_env();
    if let Some(limit) = cli.context_limit {
        ctx.context_limit = limit;
    }
    session::run(&ctx, cli.interactive).await
}

/// Install a panic hook that restores terminal state before printing the panic.
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        crossterm::terminal::disable_raw_mode().ok();
        default_hook(info);
    }));
}
