//! Mutex helpers.

use std::sync::{Mutex, MutexGuard};

/// Recover from a poisoned [`Mutex`] instead of propagating the panic.
///
/// All guarded state in this workspace is left consistent between
/// statements, so the data behind a poisoned lock is still usable.
pub trait MutexExt<T> {
    /// Lock the mutex, logging and recovering if it was poisoned.
    fn lock_or_recover(&self) -> MutexGuard<'_, T>;
}

impl<T> MutexExt<T> for Mutex<T> {
    #[track_caller]
    fn lock_or_recover(&self) -> MutexGuard<'_, T> {
        match self.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                let loc = std::panic::Location::caller();
                tracing::error!(
                    mutex_type = std::any::type_name::<T>(),
                    file = loc.file(),
                    line = loc.line(),
                    "mutex poisoned, recovering"
                );
                poisoned.into_inner()
            }
        }
    }
}
