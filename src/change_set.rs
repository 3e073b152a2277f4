//! ChangeAwareSet: merging set with change listeners and two cursor kinds.

use crate::element::Merge;
use crate::error::IterError;
use crate::listeners::{ListenerId, Listeners};
use crate::live::{Event, LiveIter, LiveRegistry};
use crate::probe_table::{Iter, Placement, ProbeTable};
use crate::strict::StrictIter;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use slotmap::DefaultKey;
use std::collections::hash_map::RandomState;
use tracing::trace;

/// Slot count of a set built with [`ChangeAwareSet::new`].
pub const DEFAULT_CAPACITY: usize = 256;

/// A hash set that merges duplicates, tells listeners about membership
/// changes, and supports live cursors that survive concurrent mutation.
///
/// Elements are placed by forward-only linear probing from
/// `hash mod capacity`; the table doubles whenever a probe runs off its end.
/// Every structural event (new element, merge, removal, clear, relocation)
/// bumps [`modification_count`](Self::modification_count). Listeners only
/// hear about events that change what the set contains: a duplicate that is
/// merged silently does not fire them.
pub struct ChangeAwareSet<T, S = RandomState> {
    table: ProbeTable<T, S>,
    modifications: u64,
    listeners: Listeners,
    live: LiveRegistry,
}

impl<T> ChangeAwareSet<T>
where
    T: Eq + Hash + Merge,
{
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }
}

impl<T> Default for ChangeAwareSet<T>
where
    T: Eq + Hash + Merge,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S> ChangeAwareSet<T, S>
where
    T: Eq + Hash + Merge,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, hasher)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            table: ProbeTable::with_capacity_and_hasher(capacity, hasher),
            modifications: 0,
            listeners: Listeners::default(),
            live: LiveRegistry::default(),
        }
    }

    pub fn hasher(&self) -> &S {
        self.table.hasher()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    /// Current slot count. Grows by doubling; never shrinks.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Number of structural events so far.
    pub fn modification_count(&self) -> u64 {
        self.modifications
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.find(q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.get(self.table.find(q)?)
    }

    pub fn contains_all<'q, Q, I>(&self, items: I) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq + 'q,
        I: IntoIterator<Item = &'q Q>,
    {
        items.into_iter().all(|q| self.contains(q))
    }

    /// Insert `value`, or merge it into the equal element already present.
    ///
    /// Returns true iff `value` took a slot of its own. A merge still counts
    /// as a structural event but does not fire listeners.
    pub fn insert(&mut self, value: T) -> bool {
        self.modifications += 1;
        match self.table.place(value) {
            Placement::Inserted(i) => {
                self.live.notify(Event::Inserted(i), self.table.len());
                self.listeners.fire();
                true
            }
            Placement::Merged(_) => false,
        }
    }

    /// Insert every value; true if any of them took a new slot.
    pub fn insert_all<I>(&mut self, values: I) -> bool
    where
        I: IntoIterator<Item = T>,
    {
        let mut changed = false;
        for value in values {
            changed |= self.insert(value);
        }
        changed
    }

    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.take(q).is_some()
    }

    /// Remove and return the element equal to `q`.
    pub fn take<Q>(&mut self, q: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let i = self.table.find(q)?;
        self.remove_at(i)
    }

    /// Remove every element equal to one of `items`; true if any was present.
    pub fn remove_all<'q, Q, I>(&mut self, items: I) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq + 'q,
        I: IntoIterator<Item = &'q Q>,
    {
        let mut changed = false;
        for q in items {
            changed |= self.remove(q);
        }
        changed
    }

    /// Keep only the elements for which `keep` returns true.
    pub fn retain<F>(&mut self, mut keep: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        let mut changed = false;
        let mut i = 0;
        while i < self.table.capacity() {
            let drop_here = self.table.get(i).is_some_and(|v| !keep(v));
            if drop_here {
                // Re-examine `i`: the backward shift may have filled it with
                // an element not yet visited.
                self.remove_at(i);
                changed = true;
            } else {
                i += 1;
            }
        }
        changed
    }

    /// Keep only the elements equal to one of `keep`; true if any was removed.
    pub fn retain_all<'k, I>(&mut self, keep: I) -> bool
    where
        T: 'k,
        I: IntoIterator<Item = &'k T>,
    {
        let keep: hashbrown::HashSet<&T> = keep.into_iter().collect();
        self.retain(|v| keep.contains(v))
    }

    /// Remove everything. Capacity is kept; every live cursor stops.
    pub fn clear(&mut self) {
        trace!(len = self.table.len(), "set cleared");
        self.table.clear();
        self.modifications += 1;
        self.live.notify(Event::Cleared, 0);
        self.listeners.fire();
    }

    /// Mutate the element equal to `target` in place.
    ///
    /// `op` reports whether it changed anything that matters. If it did, the
    /// element is taken out of its slot and placed again under its new hash
    /// (merging into an equal element if its new identity collides with
    /// one), and listeners fire once. If it did not, the element stays where
    /// it is and nothing is notified.
    ///
    /// Returns `None` without calling `op` when no element equals `target`.
    /// This deliberately departs from an apply-or-skip update, which would
    /// still run the operation on an absent element: there is no `&mut T`
    /// to hand it, and a value outside the set is owned by the caller, who
    /// can mutate it directly.
    pub fn do_change<Q, F>(&mut self, target: &Q, op: F) -> Option<bool>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&mut T) -> bool,
    {
        let i = self.table.find(target)?;
        if !op(self.table.get_mut(i)?) {
            return Some(false);
        }

        let value = self.table.take_at(i)?;
        self.modifications += 1;
        self.live.notify(Event::Removed(i), self.table.len());

        self.modifications += 1;
        if let Placement::Inserted(j) = self.table.place(value) {
            self.live.notify(Event::Inserted(j), self.table.len());
        }
        self.listeners.fire();
        Some(true)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        self.table.iter()
    }

    /// Owned snapshot of the current elements.
    pub fn to_set(&self) -> hashbrown::HashSet<T>
    where
        T: Clone,
    {
        self.table.iter().cloned().collect()
    }

    /// Start a strict cursor. With `check_modifications` false the cursor
    /// never reports invalidation.
    pub fn strict_iter(&self, check_modifications: bool) -> StrictIter {
        StrictIter::new(self.modifications, check_modifications)
    }

    /// Register a live cursor positioned before the first slot.
    pub fn live_iter(&mut self) -> LiveIter {
        LiveIter::new(self.live.register())
    }

    /// Number of live cursors still registered.
    pub fn live_iter_count(&self) -> usize {
        self.live.len()
    }

    pub fn add_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut() + 'static,
    {
        self.listeners.add(Box::new(listener))
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub(crate) fn table(&self) -> &ProbeTable<T, S> {
        &self.table
    }

    pub(crate) fn live_registry(&self) -> &LiveRegistry {
        &self.live
    }

    /// Remove the element at slot `index` with full notification.
    pub(crate) fn remove_at(&mut self, index: usize) -> Option<T> {
        let value = self.table.take_at(index)?;
        self.modifications += 1;
        self.live.notify(Event::Removed(index), self.table.len());
        self.listeners.fire();
        Some(value)
    }

    pub(crate) fn live_has_next(&self, key: DefaultKey) -> bool {
        self.live.cursor(key).is_some_and(|c| {
            c.traversed < self.table.len() && self.table.next_occupied(c.next_index).is_some()
        })
    }

    pub(crate) fn live_next(&mut self, key: DefaultKey) -> Result<&T, IterError> {
        let len = self.table.len();
        let Some(cursor) = self.live.cursor_mut(key) else {
            return Err(IterError::Exhausted);
        };
        let next = if cursor.traversed < len {
            self.table.next_occupied(cursor.next_index)
        } else {
            None
        };
        let Some(i) = next else {
            self.live.deregister(key);
            return Err(IterError::Exhausted);
        };
        cursor.traversed += 1;
        cursor.next_index = i + 1;
        if cursor.traversed >= len {
            self.live.deregister(key);
        }
        self.table.get(i).ok_or(IterError::Exhausted)
    }

    pub(crate) fn live_close(&mut self, key: DefaultKey) -> bool {
        self.live.deregister(key)
    }
}

impl<'a, T, S> IntoIterator for &'a ChangeAwareSet<T, S>
where
    T: Eq + Hash + Merge,
    S: BuildHasher,
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, S> Extend<T> for ChangeAwareSet<T, S>
where
    T: Eq + Hash + Merge,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.insert_all(iter);
    }
}

impl<T, S> FromIterator<T> for ChangeAwareSet<T, S>
where
    T: Eq + Hash + Merge,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::with_hasher(S::default());
        set.insert_all(iter);
        set
    }
}

impl<T, S> fmt::Debug for ChangeAwareSet<T, S>
where
    T: Eq + Hash + Merge + fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
