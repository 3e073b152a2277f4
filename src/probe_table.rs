//! ProbeTable: open-addressed slot array with forward-only linear probing.
//!
//! An element's natural index is `hash mod capacity`. Probes walk forward
//! from there and never wrap; running off the end means the table must
//! grow. Removal closes the gap with a backward shift so no tombstones are
//! ever left behind, which keeps the probe invariant:
//!
//! > every present element at index `i` with natural index `h` has `h <= i`
//! > and no empty slot in `h..i`.
//!
//! The table never notifies anyone. Callers learn what happened from the
//! returned [`Placement`] or index and do their own bookkeeping.

use crate::element::Merge;
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use tracing::{debug, warn};

#[derive(Debug)]
struct Entry<T> {
    value: T,
    // Hash at placement time; shifting and growth never call `T: Hash`.
    hash: u64,
}

/// Outcome of placing a value.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Placement {
    /// The value took the empty slot at this index.
    Inserted(usize),
    /// An equal element at this index absorbed the value.
    Merged(usize),
}

/// Borrowing iterator over present elements in increasing slot order.
pub struct Iter<'a, T> {
    it: core::slice::Iter<'a, Option<Entry<T>>>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let value = self.it.by_ref().find_map(|s| s.as_ref().map(|e| &e.value))?;
        self.remaining -= 1;
        Some(value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Iter {
            it: self.it.clone(),
            remaining: self.remaining,
        }
    }
}

pub(crate) struct ProbeTable<T, S> {
    hasher: S,
    slots: Vec<Option<Entry<T>>>,
    len: usize,
    reentrancy: DebugReentrancy,
}

#[inline]
fn natural_index(hash: u64, capacity: usize) -> usize {
    (hash % capacity as u64) as usize
}

fn empty_slots<T>(capacity: usize) -> Vec<Option<Entry<T>>> {
    let mut slots = Vec::with_capacity(capacity);
    slots.resize_with(capacity, || None);
    slots
}

impl<T, S> ProbeTable<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    pub(crate) fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            hasher,
            slots: empty_slots(capacity.max(1)),
            len: 0,
            reentrancy: DebugReentrancy::new(),
        }
    }

    pub(crate) fn hasher(&self) -> &S {
        &self.hasher
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Index of the element equal to `q`, if present.
    pub(crate) fn find<Q>(&self, q: &Q) -> Option<usize>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("find");
        let hash = self.make_hash(q);
        let start = natural_index(hash, self.slots.len());
        for (i, slot) in self.slots.iter().enumerate().skip(start) {
            match slot {
                None => return None,
                Some(e) if e.hash == hash && Borrow::<Q>::borrow(&e.value) == q => {
                    return Some(i)
                }
                Some(_) => {}
            }
        }
        None
    }

    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index)?.as_ref().map(|e| &e.value)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index)?.as_mut().map(|e| &mut e.value)
    }

    /// First occupied index at or after `from`.
    pub(crate) fn next_occupied(&self, from: usize) -> Option<usize> {
        self.slots
            .iter()
            .enumerate()
            .skip(from)
            .find_map(|(i, s)| s.as_ref().map(|_| i))
    }

    /// Take the element at `index` out of the table and close the gap.
    pub(crate) fn take_at(&mut self, index: usize) -> Option<T> {
        let _g = self.reentrancy.enter("take");
        let entry = self.slots.get_mut(index)?.take()?;
        self.len -= 1;

        let capacity = self.slots.len();
        let mut hole = index;
        for j in index + 1..capacity {
            let home = match &self.slots[j] {
                None => break,
                Some(e) => natural_index(e.hash, capacity),
            };
            // Elements whose home lies past the hole must not move behind it.
            if home <= hole {
                self.slots.swap(hole, j);
                hole = j;
            }
        }
        Some(entry.value)
    }

    pub(crate) fn clear(&mut self) {
        let _g = self.reentrancy.enter("clear");
        self.slots = empty_slots(self.slots.len());
        self.len = 0;
    }

    pub(crate) fn iter(&self) -> Iter<'_, T> {
        Iter {
            it: self.slots.iter(),
            remaining: self.len,
        }
    }

    /// Positions a rehash into `capacity` slots would give the current
    /// elements, in index order; `None` if some probe runs off the end.
    fn plan_rehash(&self, capacity: usize) -> Option<Vec<usize>> {
        let mut taken = vec![false; capacity];
        let mut plan = Vec::with_capacity(self.len);
        for e in self.slots.iter().flatten() {
            let start = natural_index(e.hash, capacity);
            let pos = (start..capacity).find(|&i| !taken[i])?;
            taken[pos] = true;
            plan.push(pos);
        }
        Some(plan)
    }

    /// Double the table until every element rehashes without exhausting a
    /// probe, then move everything across in one pass.
    fn grow(&mut self) {
        let _g = self.reentrancy.enter("grow");
        let old_capacity = self.slots.len();
        let mut capacity = old_capacity;
        let mut doublings = 0u32;
        let plan = loop {
            capacity = capacity.checked_mul(2).expect("capacity overflow");
            doublings += 1;
            if let Some(plan) = self.plan_rehash(capacity) {
                break plan;
            }
        };

        let mut slots = empty_slots(capacity);
        let old = core::mem::take(&mut self.slots);
        for (entry, pos) in old.into_iter().flatten().zip(plan) {
            slots[pos] = Some(entry);
        }
        self.slots = slots;

        debug!(
            from = old_capacity,
            to = capacity,
            doublings,
            len = self.len,
            "probe table grown"
        );
    }
}

impl<T, S> ProbeTable<T, S>
where
    T: Eq + Hash + Merge,
    S: BuildHasher,
{
    /// Place `value`, merging it into an equal element if one is reachable,
    /// growing the table whenever the probe runs off the end.
    pub(crate) fn place(&mut self, value: T) -> Placement {
        let hash = {
            let _g = self.reentrancy.enter("hash");
            self.make_hash(&value)
        };
        let mut growths = 0u32;
        loop {
            let found = {
                let _g = self.reentrancy.enter("place");
                let start = natural_index(hash, self.slots.len());
                self.slots
                    .iter()
                    .enumerate()
                    .skip(start)
                    .find_map(|(i, slot)| match slot {
                        None => Some(Placement::Inserted(i)),
                        Some(e) if e.hash == hash && e.value == value => {
                            Some(Placement::Merged(i))
                        }
                        Some(_) => None,
                    })
            };
            match found {
                Some(Placement::Inserted(i)) => {
                    self.slots[i] = Some(Entry { value, hash });
                    self.len += 1;
                    return Placement::Inserted(i);
                }
                Some(Placement::Merged(i)) => {
                    let _g = self.reentrancy.enter("merge");
                    if let Some(e) = self.slots[i].as_mut() {
                        e.value.merge(value);
                    }
                    return Placement::Merged(i);
                }
                None => {
                    growths += 1;
                    if growths == 2 {
                        warn!(
                            capacity = self.slots.len(),
                            len = self.len,
                            "probe still exhausted after growth; element hashes are badly clustered"
                        );
                    }
                    self.grow();
                }
            }
        }
    }
}

#[cfg(test)]
impl<T, S> ProbeTable<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    /// Probe invariant check used by tests and proptests.
    pub(crate) fn probe_invariant_holds(&self) -> bool {
        let capacity = self.slots.len();
        let counted = self.slots.iter().flatten().count();
        counted == self.len
            && self.slots.iter().enumerate().all(|(i, s)| match s {
                None => true,
                Some(e) => {
                    let home = natural_index(e.hash, capacity);
                    home <= i && self.slots[home..i].iter().all(Option::is_some)
                }
            })
    }

    /// Slot layout as optional element references.
    pub(crate) fn layout(&self) -> Vec<Option<&T>> {
        self.slots
            .iter()
            .map(|s| s.as_ref().map(|e| &e.value))
            .collect()
    }
}
