//! change-aware-set: a single-threaded hash set that merges duplicates,
//! announces membership changes, and can be walked while it is mutated.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one container whose elements may change identity after
//!   insertion, observed by cursors that outlive individual borrows.
//! - Layers:
//!   - ProbeTable<T, S>: slot array with forward-only linear probing,
//!     merge-on-duplicate, backward-shift removal and growth by doubling.
//!     Pure structure; includes a debug-only reentrancy guard.
//!   - ChangeAwareSet<T, S>: public API. Owns the table, the modification
//!     counter, the listener bus and the registry of live cursors, and does
//!     all notification once the table is consistent again.
//!   - Cursors: `StrictIter` (detached, checks the counter) and `LiveIter`
//!     (generational handle into the set's registry, told about every
//!     structural event).
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` (listeners are boxed `FnMut`).
//! - Probing never wraps. A probe that runs off the end doubles the table
//!   and retries; there is no load-factor trigger.
//! - Slot order is the only iteration order.
//!
//! Probe invariant
//! - An element at index `i` whose natural index is `h = hash mod capacity`
//!   has `h <= i` and no empty slot anywhere in `h..i`. Insert keeps it by
//!   taking the first empty slot; removal keeps it with a backward shift
//!   that moves each later cluster member into the hole when its home is at
//!   or before the hole, and stops at the first empty slot.
//!
//! Events
//! - Structural events bump the modification counter: new element, merge,
//!   removal, clear, and each half of a relocating `do_change`.
//! - Listener-visible events are a subset: new element, removal, clear, and
//!   an accepted `do_change` (one firing for the whole operation). A merge
//!   is absorbed silently.
//! - Live cursors see insertions and removals with their slot index. Growth
//!   is neither; cursors keep their numeric position in the new table.
//!
//! Hasher and rehashing invariants
//! - Each slot stores the `u64` hash computed at placement. Shifting and
//!   growth use the stored hash, so `T: Hash` never runs outside a probe.
//!   `do_change` recomputes the hash when it re-places an element.
//!
//! Reentrancy policy
//! - User code (`Hash`, `Eq`, `Merge`) runs inside guarded table sections.
//!   Listener callbacks and `do_change` operations run outside them, and
//!   both are handed no access to the set, so safe code cannot re-enter.
//!
//! Notes and non-goals
//! - No thread-safety; wrap the set in a lock if it must be shared.
//! - Growth is unbounded apart from `usize` overflow, which panics.
//! - A `LiveIter` dropped without `close` keeps its registry entry until it
//!   diverges, runs out, or the set is dropped.

mod change_set;
mod element;
mod error;
pub mod hash_code;
mod listeners;
mod live;
mod probe_table;
#[cfg(test)]
mod probe_table_proptest;
mod reentrancy;
mod strict;

// Public surface
pub use change_set::{ChangeAwareSet, DEFAULT_CAPACITY};
pub use element::Merge;
pub use error::IterError;
pub use listeners::ListenerId;
pub use live::LiveIter;
pub use probe_table::Iter;
pub use strict::StrictIter;
