/*!
 * Read-Copy-Update (RCU) Cell
 * Zero-contention reads for read-heavy maps such as the provider registry
 */

use arc_swap::{ArcSwap, Guard};
use std::sync::Arc;

/// RCU-protected value with lock-free reads
///
/// # Performance
///
/// - **Reads**: atomic pointer load, never blocks
/// - **Writes**: clone-modify-compare-and-swap, retried on contention
/// - **Best for**: registries that are read on every operation and written rarely
///
/// Readers always observe a complete snapshot: either the value before a
/// write or the value after it, never an intermediate state.
pub struct RcuCell<T> {
    inner: Arc<ArcSwap<T>>,
}

impl<T> RcuCell<T> {
    /// Create new RCU cell
    #[inline]
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(value)),
        }
    }

    /// Load current snapshot
    #[inline(always)]
    pub fn load(&self) -> Arc<T> {
        self.inner.load_full()
    }

    /// Fallible update
    ///
    /// `f` receives the current snapshot and returns the replacement, or an
    /// error to abort without writing. `f` may run more than once under
    /// contention, so it must not have side effects beyond its return value.
    pub fn try_update<F, E>(&self, mut f: F) -> Result<Arc<T>, E>
    where
        F: FnMut(&T) -> Result<T, E>,
    {
        let mut current = self.inner.load_full();
        loop {
            let next = Arc::new(f(&current)?);
            let previous = self.inner.compare_and_swap(&current, Arc::clone(&next));
            if Arc::ptr_eq(&*previous, &current) {
                return Ok(next);
            }
            current = Guard::into_inner(previous);
        }
    }

    /// Replace value entirely, returning the old snapshot
    #[inline]
    pub fn swap(&self, new_value: T) -> Arc<T> {
        self.inner.swap(Arc::new(new_value))
    }
}

impl<T> Clone for RcuCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default> Default for RcuCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
