use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use quadra_array::{Array, ArrayError};

/// An opaque, owning reference to one array of a [`crate::Context`].
///
/// Handles cannot be cloned. Releasing a handle consumes it, so each handle is
/// released at most once. A handle is only valid with the context that created it.
#[must_use = "arrays stay alive until their handle is released"]
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ArrayHandle {
    context: u64,
    id: u64,
}

impl ArrayHandle {
    /// Returns the numeric id of the handle, unique within its context.
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// The live arrays of one context, keyed by handle id.
#[derive(Debug)]
pub(crate) struct HandleTable {
    context: u64,
    next: AtomicU64,
    arrays: Mutex<HashMap<u64, Array>>,
}

impl HandleTable {
    pub(crate) fn new(context: u64) -> Self {
        Self {
            context,
            next: AtomicU64::new(1),
            arrays: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, Array>> {
        // arrays are immutable, a panic elsewhere cannot leave one half-written
        self.arrays.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self, handle: &ArrayHandle) -> Result<(), ArrayError> {
        if handle.context != self.context {
            return Err(ArrayError::invalid_argument(
                "handle",
                format!(
                    "handle {} belongs to context {}, not {}",
                    handle.id, handle.context, self.context
                ),
            ));
        }
        Ok(())
    }

    pub(crate) fn insert(&self, array: Array) -> ArrayHandle {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(id, array);
        ArrayHandle {
            context: self.context,
            id,
        }
    }

    pub(crate) fn get(&self, handle: &ArrayHandle) -> Result<Array, ArrayError> {
        self.check(handle)?;
        self.lock().get(&handle.id).cloned().ok_or_else(|| unknown(handle))
    }

    pub(crate) fn remove(&self, handle: ArrayHandle) -> Result<Array, ArrayError> {
        self.check(&handle)?;
        self.lock().remove(&handle.id).ok_or_else(|| unknown(&handle))
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }
}

fn unknown(handle: &ArrayHandle) -> ArrayError {
    ArrayError::invalid_argument("handle", format!("handle {} is not live", handle.id))
}
