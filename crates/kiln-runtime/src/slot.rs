//! Lazily resolved configuration slot.
//!
//! Each configuration value owned by the context is one [`Slot`]: a
//! two-state cell that goes `UNRESOLVED -> RESOLVED` on the first `get` or on
//! any `set`, and never back. `set` always overwrites, whether or not a
//! default was already resolved, so an explicit override pre-empts the lazy
//! default permanently.

use parking_lot::Mutex;

/// A lazy-default cell holding one independently overridable value.
pub(crate) struct Slot<T> {
    cell: Mutex<Option<T>>,
}

impl<T: Clone> Slot<T> {
    /// Creates an unresolved slot.
    pub fn empty() -> Self {
        Self {
            cell: Mutex::new(None),
        }
    }

    /// Returns the resolved value, running `resolve` exactly once if the slot
    /// is still unresolved.
    pub fn get_or_resolve(&self, resolve: impl FnOnce() -> T) -> T {
        let mut guard = self.cell.lock();
        guard.get_or_insert_with(resolve).clone()
    }

    /// Overwrites the slot unconditionally. Last write wins.
    pub fn set(&self, value: T) {
        *self.cell.lock() = Some(value);
    }

    /// Returns `true` once a value has been resolved or set.
    pub fn is_resolved(&self) -> bool {
        self.cell.lock().is_some()
    }
}

impl<T: Clone> Default for Slot<T> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn resolves_exactly_once_and_caches() {
        let slot: Slot<Arc<u32>> = Slot::empty();
        let mut calls = 0;

        let first = slot.get_or_resolve(|| {
            calls += 1;
            Arc::new(7)
        });
        let second = slot.get_or_resolve(|| unreachable!("slot already resolved"));

        assert_eq!(calls, 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn set_before_get_preempts_the_default() {
        let slot: Slot<Arc<u32>> = Slot::empty();
        let explicit = Arc::new(1);

        slot.set(Arc::clone(&explicit));
        let got = slot.get_or_resolve(|| unreachable!("explicit value pre-empts resolution"));

        assert!(Arc::ptr_eq(&explicit, &got));
    }

    #[test]
    fn set_after_get_replaces_the_cached_default() {
        let slot: Slot<Arc<u32>> = Slot::empty();
        let default = slot.get_or_resolve(|| Arc::new(1));

        let replacement = Arc::new(2);
        slot.set(Arc::clone(&replacement));

        let got = slot.get_or_resolve(|| unreachable!());
        assert!(Arc::ptr_eq(&replacement, &got));
        assert!(!Arc::ptr_eq(&default, &got));
    }

    #[test]
    fn set_marks_the_slot_resolved() {
        let slot: Slot<u32> = Slot::empty();
        assert!(!slot.is_resolved());

        slot.set(5);
        assert!(slot.is_resolved());
        assert_eq!(slot.get_or_resolve(|| 0), 5);
    }
}
