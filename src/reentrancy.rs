//! Debug-only reentrancy guard for the probe table.
//!
//! The table calls into user code (`Hash`, `Eq`, `Merge`) while a probe is
//! in flight and its slots may be transiently inconsistent. In debug builds,
//! entering a second guarded section before the first one ends panics and
//! names both operations. In release builds the guard is a zero-sized no-op.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-table tracker. Guard each structural entry point with
/// `let _g = self.reentrancy.enter("op");`.
#[derive(Debug)]
pub(crate) struct DebugReentrancy {
    #[cfg(debug_assertions)]
    active: Cell<Option<&'static str>>,
    // Single-threaded by construction.
    _nosend: PhantomData<*mut ()>,
}

impl DebugReentrancy {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
            _nosend: PhantomData,
        }
    }

    /// Enter a guarded section labelled `op`.
    #[inline]
    #[cfg(debug_assertions)]
    pub(crate) fn enter(&self, op: &'static str) -> SectionGuard<'_> {
        if let Some(outer) = self.active.get() {
            panic!("reentrancy detected: `{op}` entered while `{outer}` is in progress");
        }
        self.active.set(Some(op));
        SectionGuard { owner: self }
    }

    #[inline]
    #[cfg(not(debug_assertions))]
    pub(crate) fn enter(&self, _op: &'static str) -> SectionGuard<'_> {
        SectionGuard { _z: PhantomData }
    }

    /// Name of the section currently entered, if any. Always `None` in
    /// release builds.
    #[cfg(test)]
    pub(crate) fn active(&self) -> Option<&'static str> {
        #[cfg(debug_assertions)]
        {
            self.active.get()
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    }
}

impl Default for DebugReentrancy {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard returned by [`DebugReentrancy::enter`].
pub(crate) struct SectionGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for SectionGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            debug_assert!(self.owner.active.get().is_some());
            self.owner.active.set(None);
        }
    }
}
