//! Subcommand implementations.

pub mod login;
pub mod logout;
pub mod refresh_token;
pub mod register;
pub mod status;
pub mod tasks;
pub mod watch;

use anyhow::Result;

use crate::cli::{Commands, ServiceArgs};

pub async fn handle(cmd: Commands, service: &ServiceArgs) -> Result<()> {
    match cmd {
        Commands::Login(args) => login::run(args, service).await,
        Commands::Register(args) => register::run(args, service).await,
        Commands::Logout(args) => logout::run(args, service).await,
        Commands::Status(args) => status::run(args, service).await,
        Commands::RefreshToken(args) => refresh_token::run(args, service).await,
        Commands::Tasks(cmd) => tasks::handle(cmd, service).await,
        Commands::Watch(args) => watch::run(args, service).await,
    }
}
