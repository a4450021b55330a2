#![forbid(unsafe_code)]

//! Lock helpers shared by the runtime.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock `mutex`, recovering the guard if a handler panicked while holding it.
///
/// Subscriber lists and timer queues stay structurally valid across a panic,
/// so the poisoned state carries no information worth propagating.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
