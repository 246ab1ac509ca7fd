//! Small synchronization helpers shared by the subsystems

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks a mutex, recovering the guard from a poisoned lock
///
/// All critical sections in this crate are short and never leave
/// shared state half-updated on panic, so continuing with the inner
/// value is safe.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
