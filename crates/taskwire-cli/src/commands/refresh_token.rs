//! Refresh token command implementation.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::cli::ServiceArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct RefreshTokenArgs {}

pub async fn run(_args: RefreshTokenArgs, service: &ServiceArgs) -> Result<()> {
    let client = session::logged_in(service)?;

    eprintln!("{}", "Refreshing session...".dimmed());

    if client.refresher().refresh().await.is_none() {
        anyhow::bail!("Session expired. Please log in again.");
    }

    output::success("Session refreshed successfully");
    if let Some(at) = client.store().get().and_then(|c| c.access_expires_at) {
        output::field("Expires at", &at.to_rfc3339());
    }

    Ok(())
}
