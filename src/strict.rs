//! Strict cursors: fail on any structural change they did not make.

use crate::change_set::ChangeAwareSet;
use crate::element::Merge;
use crate::error::IterError;
use core::hash::{BuildHasher, Hash};

/// Detached cursor over a [`ChangeAwareSet`] that checks the set's
/// modification counter before every step.
///
/// Any insert, merge, removal, clear or relocating `do_change` made through
/// the set after the cursor was created makes the next step fail with
/// [`IterError::Invalidated`]. Removals made through [`StrictIter::remove`]
/// are the cursor's own and do not invalidate it. A cursor created with
/// checking disabled never reports `Invalidated`; it simply walks whatever
/// the table holds.
#[derive(Clone, Debug)]
pub struct StrictIter {
    expected: Option<u64>,
    traversed: usize,
    next_index: usize,
    // Slot of the last returned element and the modification count at
    // that moment. Any later change voids it.
    last: Option<(usize, u64)>,
}

impl StrictIter {
    pub(crate) fn new(modifications: u64, check_modifications: bool) -> Self {
        Self {
            expected: check_modifications.then_some(modifications),
            traversed: 0,
            next_index: 0,
            last: None,
        }
    }

    fn check<T, S>(&self, set: &ChangeAwareSet<T, S>) -> Result<(), IterError>
    where
        T: Eq + Hash + Merge,
        S: BuildHasher,
    {
        match self.expected {
            Some(expected) if expected != set.modification_count() => Err(IterError::Invalidated {
                expected,
                actual: set.modification_count(),
            }),
            _ => Ok(()),
        }
    }

    pub fn has_next<T, S>(&self, set: &ChangeAwareSet<T, S>) -> Result<bool, IterError>
    where
        T: Eq + Hash + Merge,
        S: BuildHasher,
    {
        self.check(set)?;
        Ok(self.traversed < set.len() && set.table().next_occupied(self.next_index).is_some())
    }

    pub fn next<'a, T, S>(&mut self, set: &'a ChangeAwareSet<T, S>) -> Result<&'a T, IterError>
    where
        T: Eq + Hash + Merge,
        S: BuildHasher,
    {
        self.check(set)?;
        if self.traversed >= set.len() {
            return Err(IterError::Exhausted);
        }
        let table = set.table();
        let i = table
            .next_occupied(self.next_index)
            .ok_or(IterError::Exhausted)?;
        self.traversed += 1;
        self.next_index = i + 1;
        self.last = Some((i, set.modification_count()));
        table.get(i).ok_or(IterError::Exhausted)
    }

    /// Remove the element most recently returned by [`next`](Self::next).
    ///
    /// Fails with [`IterError::NoCurrent`] if the set changed since that
    /// element was returned, even for an unchecked cursor: the slot may
    /// now hold a different element.
    ///
    /// The removal is a full structural event for the set (listeners fire,
    /// live cursors are told) but this cursor rebases onto the new counter.
    /// An element shifted back into the vacated slot is still visited.
    pub fn remove<T, S>(&mut self, set: &mut ChangeAwareSet<T, S>) -> Result<T, IterError>
    where
        T: Eq + Hash + Merge,
        S: BuildHasher,
    {
        self.check(set)?;
        let (i, seen_at) = self.last.take().ok_or(IterError::NoCurrent)?;
        // Without checking, a foreign change may have shifted another
        // element into slot `i`.
        if seen_at != set.modification_count() {
            return Err(IterError::NoCurrent);
        }
        let value = set.remove_at(i).ok_or(IterError::NoCurrent)?;
        self.traversed -= 1;
        self.next_index = i;
        if let Some(expected) = self.expected.as_mut() {
            *expected = set.modification_count();
        }
        Ok(value)
    }
}
