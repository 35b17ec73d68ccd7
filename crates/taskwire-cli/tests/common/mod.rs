//! Helpers for running the `taskwire` binary against a mock service.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;
use wiremock::MockServer;

/// An isolated CLI environment: its own session directory and API URL.
pub struct CliEnv {
    home: TempDir,
    data_dir: PathBuf,
    api_url: String,
}

impl CliEnv {
    pub fn new(server: &MockServer) -> Self {
        let home = TempDir::new().unwrap();
        let data_dir = home.path().join("data");
        Self {
            data_dir,
            api_url: format!("{}/api", server.uri()),
            home,
        }
    }

    pub fn session_file(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }

    /// Run the CLI on a blocking thread so the mock server keeps serving.
    pub async fn run(&self, args: &[&str]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_taskwire"));
        cmd.args(args);
        cmd.env("HOME", self.home.path());
        cmd.env("XDG_DATA_HOME", self.home.path().join("xdg"));
        cmd.env("TASKWIRE_DATA_DIR", &self.data_dir);
        cmd.env("TASKWIRE_API_URL", &self.api_url);
        cmd.env_remove("TASKWIRE_WS_URL");
        cmd.env_remove("TASKWIRE_PASSWORD");
        cmd.env_remove("RUST_LOG");
        cmd.env("NO_COLOR", "1");

        tokio::task::spawn_blocking(move || cmd.output().expect("Failed to execute CLI"))
            .await
            .unwrap()
    }

    /// Run the CLI and expect success. Returns stdout.
    pub async fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args).await;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    /// Run the CLI and expect failure. Returns stderr.
    pub async fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args).await;
        if output.status.success() {
            panic!("CLI command should have failed: {:?}", args);
        }
        String::from_utf8_lossy(&output.stderr).to_string()
    }
}
