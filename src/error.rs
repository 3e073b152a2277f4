use thiserror::Error;

/// Failures reported by the set's cursors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IterError {
    /// A strict cursor observed a structural change it did not make itself.
    /// The cursor is dead; create a new one.
    #[error("set was structurally modified during iteration (expected modification {expected}, found {actual})")]
    Invalidated { expected: u64, actual: u64 },
    /// `next` was called with no element left to yield.
    #[error("iteration exhausted")]
    Exhausted,
    /// `remove` was called without a preceding `next`, twice for the same
    /// element, or after the set changed under the returned element.
    #[error("no current element to remove")]
    NoCurrent,
}
