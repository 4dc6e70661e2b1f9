//! Initialize-once cell shared by the model and dataset handles.

use std::sync::{Arc, Mutex, PoisonError};

/// A value built on first use and shared for the rest of the process.
///
/// The check and the store happen under one lock, so concurrent callers
/// never construct the value twice. A failed initializer leaves the cell
/// empty and the next caller tries again.
pub struct InitOnce<T: ?Sized> {
    slot: Mutex<Option<Arc<T>>>,
}

impl<T: ?Sized> Default for InitOnce<T> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }
}

impl<T: ?Sized> InitOnce<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_try_init<E>(
        &self,
        init: impl FnOnce() -> Result<Arc<T>, E>,
    ) -> Result<Arc<T>, E> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = slot.as_ref() {
            return Ok(Arc::clone(value));
        }
        let value = init()?;
        *slot = Some(Arc::clone(&value));
        Ok(value)
    }

    #[cfg(test)]
    pub fn is_initialized(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
