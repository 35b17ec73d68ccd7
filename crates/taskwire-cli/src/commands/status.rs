//! Status command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::cli::ServiceArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct StatusArgs {}

pub async fn run(_args: StatusArgs, service: &ServiceArgs) -> Result<()> {
    let client = session::client(service)?;
    let path = session::storage::open(service.data_dir.as_deref())?.path();

    output::field("API", client.config().api_base.as_str());
    output::field("Push", client.config().ws_base.as_str());
    output::field("Session file", &path.display().to_string());

    let creds = client
        .store()
        .get()
        .context("No active session. Run 'taskwire login' first.")?;

    let access = if client.store().is_access_valid() {
        "valid".green()
    } else {
        "expired".yellow()
    };
    output::field("Access token", &access.to_string());

    match creds.access_expires_at {
        Some(at) => output::field("Expires at", &at.to_rfc3339()),
        None => output::field("Expires at", "unknown"),
    }

    Ok(())
}
