//! Lazily built, lock-guarded process-wide instances.

use std::sync::{Arc, Mutex, MutexGuard};

/// Holder that builds its value at most once.
///
/// Concurrent first callers block on the lock until the single build
/// finishes; later callers get the cached `Arc`. A failed build leaves the
/// slot empty so the next call retries. `reset` drops the cached value.
pub struct SharedInstance<T> {
    slot: Mutex<Option<Arc<T>>>,
}

impl<T> SharedInstance<T> {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<T>>> {
        // a panicking builder never stores a value, so the slot is still valid
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get_or_try_init<E, F>(&self, init: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let mut slot = self.lock();
        if let Some(value) = slot.as_ref() {
            return Ok(Arc::clone(value));
        }
        let value = Arc::new(init()?);
        *slot = Some(Arc::clone(&value));
        Ok(value)
    }

    /// Cached value, if already built
    pub fn get(&self) -> Option<Arc<T>> {
        self.lock().clone()
    }

    /// Install a pre-built value, replacing any cached one
    pub fn set(&self, value: Arc<T>) {
        *self.lock() = Some(value);
    }

    pub fn reset(&self) {
        *self.lock() = None;
    }
}

impl<T> Default for SharedInstance<T> {
    fn default() -> Self {
        Self::new()
    }
}
