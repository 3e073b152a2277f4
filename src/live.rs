//! Live ("stop on modify") cursors.
//!
//! The set owns a registry of cursor states keyed by generational slotmap
//! keys; callers hold a [`LiveIter`] handle. Every structural event is
//! pushed to each registered cursor, and a cursor that can no longer trust
//! its view is dropped from the registry. A handle whose cursor is gone
//! behaves as an exhausted sequence, never as an error.

use crate::change_set::ChangeAwareSet;
use crate::element::Merge;
use crate::error::IterError;
use core::hash::{BuildHasher, Hash};
use slotmap::{DefaultKey, SlotMap};
use tracing::trace;

/// Structural event as seen by live cursors.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Event {
    Inserted(usize),
    Removed(usize),
    Cleared,
}

#[derive(Debug, Default)]
pub(crate) struct Cursor {
    pub(crate) traversed: usize,
    pub(crate) next_index: usize,
}

impl Cursor {
    /// `len` is the set size after the event has been applied.
    fn diverges(&self, event: Event, len: usize) -> bool {
        let out_of_room = self.traversed >= len;
        match event {
            // A shift may have pulled an unseen element behind us.
            Event::Removed(i) => i < self.next_index || out_of_room,
            Event::Inserted(i) => i >= self.next_index || out_of_room,
            Event::Cleared => true,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct LiveRegistry {
    cursors: SlotMap<DefaultKey, Cursor>,
}

impl LiveRegistry {
    pub(crate) fn register(&mut self) -> DefaultKey {
        self.cursors.insert(Cursor::default())
    }

    pub(crate) fn deregister(&mut self, key: DefaultKey) -> bool {
        self.cursors.remove(key).is_some()
    }

    pub(crate) fn cursor(&self, key: DefaultKey) -> Option<&Cursor> {
        self.cursors.get(key)
    }

    pub(crate) fn cursor_mut(&mut self, key: DefaultKey) -> Option<&mut Cursor> {
        self.cursors.get_mut(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.cursors.len()
    }

    /// Deliver `event` to every cursor and drop the ones that diverge.
    pub(crate) fn notify(&mut self, event: Event, len: usize) {
        self.cursors.retain(|key, cursor| {
            let diverged = cursor.diverges(event, len);
            if diverged {
                trace!(?key, ?event, traversed = cursor.traversed, "live iterator diverged");
            }
            !diverged
        });
    }
}

/// Handle to a live cursor registered with one [`ChangeAwareSet`].
///
/// Each step takes the set explicitly, so the set can be mutated between
/// steps. When the set changes in a way the cursor cannot follow (an element
/// removed behind it, one inserted ahead of it, or a `clear`), the cursor
/// silently stops: `has_next` turns false and `next` reports
/// [`IterError::Exhausted`].
///
/// A handle that is dropped without [`close`](LiveIter::close) while its
/// cursor is still live keeps a registry entry until the set is dropped.
#[derive(Debug, Eq, PartialEq, Hash)]
pub struct LiveIter(DefaultKey);

impl LiveIter {
    pub(crate) fn new(key: DefaultKey) -> Self {
        LiveIter(key)
    }

    pub fn has_next<T, S>(&self, set: &ChangeAwareSet<T, S>) -> bool
    where
        T: Eq + Hash + Merge,
        S: BuildHasher,
    {
        set.live_has_next(self.0)
    }

    /// Yield the next element in slot order.
    pub fn next<'a, T, S>(&self, set: &'a mut ChangeAwareSet<T, S>) -> Result<&'a T, IterError>
    where
        T: Eq + Hash + Merge,
        S: BuildHasher,
    {
        set.live_next(self.0)
    }

    /// Whether the set still tracks this cursor. False once it has
    /// diverged, run out, or been closed.
    pub fn is_registered<T, S>(&self, set: &ChangeAwareSet<T, S>) -> bool
    where
        T: Eq + Hash + Merge,
        S: BuildHasher,
    {
        set.live_registry().cursor(self.0).is_some()
    }

    /// Deregister the cursor. Returns false if it had already stopped.
    pub fn close<T, S>(self, set: &mut ChangeAwareSet<T, S>) -> bool
    where
        T: Eq + Hash + Merge,
        S: BuildHasher,
    {
        set.live_close(self.0)
    }
}
