//! Lazily computed, mutex-guarded values shared between loader threads.
//!
//! A [`LazyValue`] starts empty and is filled by the first caller that
//! successfully computes it. The lock is held for the whole computation, so at
//! most one computation per cell is ever in flight. Once filled, the value is
//! never recomputed or cleared for the lifetime of the cell.

use parking_lot::Mutex;

/// A get-or-compute cell.
#[derive(Debug)]
pub struct LazyValue<T> {
    slot: Mutex<Option<T>>,
}

impl<T> Default for LazyValue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LazyValue<T> {
    /// Create an empty cell.
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }
}

impl<T: Copy> LazyValue<T> {
    #[cfg(test)]
    fn get(&self) -> Option<T> {
        *self.slot.lock()
    }

    /// Return the cached value, computing and storing it on first use.
    pub fn get_or_compute<F>(&self, compute: F) -> T
    where
        F: FnOnce() -> T,
    {
        let mut slot = self.slot.lock();
        if let Some(value) = *slot {
            return value;
        }
        let value = compute();
        *slot = Some(value);
        value
    }

    /// Like [`get_or_compute`](Self::get_or_compute), but a failed computation
    /// leaves the cell empty so a later call retries.
    pub fn get_or_try_compute<F, E>(&self, compute: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let mut slot = self.slot.lock();
        if let Some(value) = *slot {
            return Ok(value);
        }
        let value = compute()?;
        *slot = Some(value);
        Ok(value)
    }
}
