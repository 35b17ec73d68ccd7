//! Stamps the CLI version from git, falling back to the package version.

use std::path::PathBuf;
use std::process::Command;

fn main() {
    // The crate sits two levels below the repository root, so ask git
    // where its metadata lives instead of assuming `./.git`.
    if let Some(git_dir) = git(&["rev-parse", "--absolute-git-dir"]).map(PathBuf::from) {
        println!("cargo:rerun-if-changed={}", git_dir.join("HEAD").display());
        println!("cargo:rerun-if-changed={}", git_dir.join("refs").display());
    }

    let version = git(&["describe", "--tags", "--always", "--dirty"])
        .map(|described| described.trim_start_matches('v').to_string())
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo:rustc-env=TASKWIRE_VERSION={}", version);
}

/// Run git and return its trimmed stdout, or `None` outside a checkout.
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }

    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
