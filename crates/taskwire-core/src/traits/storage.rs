//! Credential persistence trait.

use crate::error::StorageError;
use crate::store::StoredTokens;

/// Durable storage for the session's token values.
///
/// Implementations persist the whole document at once; a `store` either
/// replaces every value or none.
pub trait TokenStorage: Send + Sync {
    /// Read the stored document. `Ok(None)` means nothing is stored.
    fn load(&self) -> Result<Option<StoredTokens>, StorageError>;

    /// Replace the stored document.
    fn store(&self, tokens: &StoredTokens) -> Result<(), StorageError>;

    /// Remove every stored value. Removing an empty store is not an error.
    fn remove(&self) -> Result<(), StorageError>;
}
