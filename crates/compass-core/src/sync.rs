//! Synchronization utilities for handling poisoned locks.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Extension trait for `RwLock` that ignores lock poisoning.
///
/// A poisoned lock means another thread panicked while holding the guard;
/// the panic itself is the error worth reporting, not the poison flag. The
/// cache's local tier and the capability registry hold plain data with no
/// cross-field invariants, so recovering the inner value is always safe.
pub trait IgnorePoison<T> {
    /// Acquires the read guard, recovering from poisoning.
    fn read_ignore_poison(&self) -> RwLockReadGuard<'_, T>;

    /// Acquires the write guard, recovering from poisoning.
    fn write_ignore_poison(&self) -> RwLockWriteGuard<'_, T>;
}

impl<T> IgnorePoison<T> for RwLock<T> {
    fn read_ignore_poison(&self) -> RwLockReadGuard<'_, T> {
        match self.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_ignore_poison(&self) -> RwLockWriteGuard<'_, T> {
        match self.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
