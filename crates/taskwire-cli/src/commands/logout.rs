//! Logout command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::ServiceArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub async fn run(_args: LogoutArgs, service: &ServiceArgs) -> Result<()> {
    let client = session::client(service)?;

    if !client.has_session() {
        output::success("Not logged in");
        return Ok(());
    }

    client.logout().await.context("Failed to logout")?;
    output::success("Logged out");

    Ok(())
}
