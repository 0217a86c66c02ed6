//! CLI command definitions for the `nhoru` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod chat;
pub mod check;
pub mod config;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// A quiet place to talk, a few messages at a time.
#[derive(Parser)]
#[command(name = "nhoru", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans to stdout via OpenTelemetry.
    #[arg(long, global = true, env = "NHORU_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log filter for the chosen verbosity. `RUST_LOG` still wins.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 if self.quiet => "error",
            0 => "warn",
            1 => "info,nhoru=debug,nhoru_core=debug,nhoru_infra=debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat.
    Chat,

    /// Print the effective configuration.
    Config,

    /// Check connectivity and API key setup.
    Check,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
