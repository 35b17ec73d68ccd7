//! Register command implementation.

use anyhow::{Context, Result};
use clap::Args;

use taskwire_core::Registration;

use crate::cli::ServiceArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Username for the new account
    #[arg(long)]
    pub username: String,

    /// Email address
    #[arg(long, default_value = "")]
    pub email: String,

    /// Password
    #[arg(long, env = "TASKWIRE_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Password confirmation (defaults to --password)
    #[arg(long)]
    pub confirm_password: Option<String>,
}

pub async fn run(args: RegisterArgs, service: &ServiceArgs) -> Result<()> {
    let client = session::client(service)?;

    let confirm = args
        .confirm_password
        .unwrap_or_else(|| args.password.clone());
    let registration = Registration::new(args.username, args.email, args.password, confirm);

    let user = client
        .register(&registration)
        .await
        .context("Failed to register")?;

    output::success("Account created. Run 'taskwire login' to sign in.");
    if let Some(username) = user.get("username").and_then(|u| u.as_str()) {
        output::field("User", username);
    }

    Ok(())
}
