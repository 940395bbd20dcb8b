//! CLI module for relquery
//!
//! Provides command-line interface for:
//! - normalize: print the canonical query
//! - explain: print the assembled plan for a model

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{explain, explain_plan, normalize, normalize_value, run_command};
pub use errors::{CliError, CliResult};
pub use io::{parse_query, read_query, write_response, write_text};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Parses arguments, installs logging and runs the command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    run_command(cli.command)
}
