//! nhoru CLI entry point.
//!
//! Binary name: `nhoru`
//!
//! Parses CLI arguments, initializes tracing and application state, then
//! dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use nhoru_observe::tracing_setup::{init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_filter(), cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "nhoru", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;

    let result = match cli.command {
        Commands::Chat => cli::chat::loop_runner::run_chat_loop(&state).await,
        Commands::Config => cli::config::show_config(&state, cli.json),
        Commands::Check => cli::check::check(&state, cli.json).await,
        Commands::Completions { .. } => unreachable!("handled above"),
    };

    state.shutdown();
    shutdown_tracing();
    result
}
