//! Location of the session file.

use std::path::Path;

use anyhow::{Context, Result};

use taskwire_store::FileStorage;

/// File storage in `dir`, or in the platform data directory.
pub fn open(dir: Option<&Path>) -> Result<FileStorage> {
    match dir {
        Some(dir) => Ok(FileStorage::new(dir)),
        None => FileStorage::at_default_location().context("Could not determine data directory"),
    }
}
