//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use taskwire_core::config::DEFAULT_API_BASE;

use crate::commands::{login, logout, refresh_token, register, status, tasks, watch};

/// Command-line client for the taskwire task service.
#[derive(Parser, Debug)]
#[command(name = "taskwire")]
#[command(author, version = env!("TASKWIRE_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub service: ServiceArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where the service lives and where the session is kept.
#[derive(Args, Debug, Clone)]
pub struct ServiceArgs {
    /// REST API base URL
    #[arg(long, env = "TASKWIRE_API_URL", default_value = DEFAULT_API_BASE, global = true)]
    pub api_url: String,

    /// Push channel base URL (derived from the API URL when omitted)
    #[arg(long, env = "TASKWIRE_WS_URL", global = true)]
    pub ws_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10, global = true)]
    pub timeout_secs: u64,

    /// Directory holding the session file
    #[arg(long, env = "TASKWIRE_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the session
    Login(login::LoginArgs),

    /// Create an account
    Register(register::RegisterArgs),

    /// End the session
    Logout(logout::LogoutArgs),

    /// Show the stored session
    Status(status::StatusArgs),

    /// Exchange the refresh token for a new access token
    RefreshToken(refresh_token::RefreshTokenArgs),

    /// Task operations
    Tasks(tasks::TasksCommand),

    /// Stream task changes from the push channel
    Watch(watch::WatchArgs),
}
