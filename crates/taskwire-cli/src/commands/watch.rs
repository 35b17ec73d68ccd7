//! Watch command implementation.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use taskwire_core::error::{AuthError, Error};
use taskwire_core::{TaskAction, TaskChange, TaskView};
use taskwire_http::ChannelState;

use crate::cli::ServiceArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Output changes as JSON
    #[arg(long)]
    pub json: bool,
}

/// Prints task changes as they arrive.
struct ConsoleView {
    json: bool,
}

impl TaskView for ConsoleView {
    fn apply(&self, change: TaskChange) {
        if self.json {
            if let Ok(json) = serde_json::to_string(&change) {
                println!("{}", json);
            }
            return;
        }

        let action = match change.action {
            TaskAction::Created => "CREATED".green(),
            TaskAction::Updated => "UPDATED".yellow(),
            TaskAction::Deleted => "DELETED".red(),
        };
        println!(
            "{} {} {} [{}]",
            action,
            change.task.id.to_string().dimmed(),
            change.task.title(),
            change.task.status_label()
        );
    }
}

pub async fn run(args: WatchArgs, service: &ServiceArgs) -> Result<()> {
    let view = Arc::new(ConsoleView { json: args.json });
    let client = session::client_with_view(service, view)?;
    if !client.has_session() {
        anyhow::bail!("No active session. Run 'taskwire login' first.");
    }

    let channel = client.channel();
    let mut states = channel.subscribe();

    eprintln!("{}", "Connecting to push channel...".dimmed());
    match channel.connect().await {
        Ok(()) => {}
        Err(Error::Auth(AuthError::SessionExpired)) => {
            anyhow::bail!("Session expired. Please log in again.");
        }
        // the channel keeps retrying on its own
        Err(e) => output::error(&format!("Connect failed, retrying: {}", e)),
    }
    eprintln!("{}", "Press Ctrl+C to stop.".dimmed());
    eprintln!();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    // The watch guard must be released before shutdown publishes Idle.
    let outcome = tokio::select! {
        signal = &mut ctrl_c => signal.map(|_| false).context("Failed to listen for Ctrl+C"),
        seen = states.wait_for(|state| *state == ChannelState::Abandoned) => Ok(seen.is_ok()),
    };

    channel.shutdown();
    eprintln!("{}", "Disconnected.".dimmed());
    if outcome? {
        anyhow::bail!("Push channel closed: session could not be renewed");
    }
    Ok(())
}
