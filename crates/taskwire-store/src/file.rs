//! JSON-file token storage.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use fs2::FileExt;
use tracing::{debug, instrument};
use uuid::Uuid;

use taskwire_core::error::StorageError;
use taskwire_core::{StoredTokens, TokenStorage};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

const FILE_NAME: &str = "session.json";
const LOCK_NAME: &str = "session.lock";

fn corrupt(err: serde_json::Error) -> StorageError {
    StorageError::Corrupt {
        message: err.to_string(),
    }
}

/// Stores tokens as `session.json` in a directory.
///
/// Writes are serialized through an `fs2` lock file and land atomically:
/// the document is written to a temp file in the same directory and
/// renamed over the target, so readers never see a half-written file and
/// the three token values always change together.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Store the session under `dir`. The directory is created on first write.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Store the session in the platform data directory
    /// (e.g. `~/.local/share/taskwire` on Linux).
    pub fn at_default_location() -> Result<Self, StorageError> {
        let dirs = ProjectDirs::from("", "", "taskwire").ok_or_else(|| StorageError::Io {
            message: "could not determine data directory".to_string(),
        })?;
        Ok(Self::new(dirs.data_dir()))
    }

    /// Path of the session document.
    pub fn path(&self) -> PathBuf {
        self.dir.join(FILE_NAME)
    }

    fn lock(&self) -> Result<File, StorageError> {
        fs::create_dir_all(&self.dir)?;
        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.dir.join(LOCK_NAME))?;
        lock_file.lock_exclusive()?;
        Ok(lock_file)
    }

    fn write_atomic(&self, contents: &[u8]) -> Result<(), StorageError> {
        let tmp = self.dir.join(format!(".{}.{}", FILE_NAME, Uuid::new_v4()));

        let result = (|| {
            let mut file = File::create(&tmp)?;

            // Restrict before any secret hits the disk
            #[cfg(unix)]
            fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))?;

            file.write_all(contents)?;
            file.sync_data()?;
            fs::rename(&tmp, self.path())
        })();

        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        Ok(result?)
    }
}

impl TokenStorage for FileStorage {
    #[instrument(skip(self), fields(path = %self.path().display()))]
    fn load(&self) -> Result<Option<StoredTokens>, StorageError> {
        let json = match fs::read_to_string(self.path()) {
            Ok(json) => json,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let tokens = serde_json::from_str(&json).map_err(corrupt)?;
        Ok(Some(tokens))
    }

    #[instrument(skip(self, tokens), fields(path = %self.path().display()))]
    fn store(&self, tokens: &StoredTokens) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(tokens).map_err(corrupt)?;

        let lock = self.lock()?;
        self.write_atomic(&json)?;
        lock.unlock()?;

        debug!("session written");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path().display()))]
    fn remove(&self) -> Result<(), StorageError> {
        if !self.dir.exists() {
            return Ok(());
        }

        let lock = self.lock()?;
        match fs::remove_file(self.path()) {
            Ok(()) => debug!("session removed"),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        lock.unlock()?;
        Ok(())
    }
}
