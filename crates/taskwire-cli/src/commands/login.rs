//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::cli::ServiceArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account username
    #[arg(long)]
    pub username: String,

    /// Account password
    #[arg(long, env = "TASKWIRE_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn run(args: LoginArgs, service: &ServiceArgs) -> Result<()> {
    let client = session::client(service)?;

    eprintln!("{}", "Logging in...".dimmed());

    let login = client
        .login(&args.username, &args.password)
        .await
        .context("Failed to login")?;

    output::success("Logged in successfully");
    println!();
    output::field("User", &login.username);
    output::field("API", client.config().api_base.as_str());
    if let Some(secs) = login.access_expires_in {
        output::field("Token expires in", &format!("{}s", secs));
    }

    Ok(())
}
