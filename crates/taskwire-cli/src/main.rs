//! taskwire - command-line client for the task service.
//!
//! A thin wrapper over `taskwire-http`: log in, list and complete tasks,
//! and watch the push channel from a terminal.

mod cli;
mod commands;
mod output;
mod session;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    commands::handle(cli.command, &cli.service).await
}

/// Filter used when `RUST_LOG` is unset. Each `-v` opens one more level
/// for the taskwire crates; dependencies stay at `warn` until `-vvv`.
fn default_directives(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "warn,taskwire_http=info,taskwire_store=info,taskwire_core=info",
        2 => "warn,taskwire_http=debug,taskwire_store=debug,taskwire_core=debug,taskwire=debug",
        _ => "trace",
    }
}

// Logs go to stderr: stdout carries task rows and JSON output.
fn init_logging(verbosity: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity)));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
