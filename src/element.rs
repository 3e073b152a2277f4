//! Element capability: what the set needs beyond `Eq + Hash`.

/// Absorb the state of a duplicate into an element already in the set.
///
/// The set only calls `merge` when `self == other` holds, so implementors
/// may assume both values share the same identity. Merging the same state
/// twice should leave `self` unchanged.
pub trait Merge {
    fn merge(&mut self, other: Self);
}

macro_rules! impl_merge_noop {
    ($($t:ty),* $(,)?) => {
        $(
            impl Merge for $t {
                #[inline]
                fn merge(&mut self, _other: Self) {}
            }
        )*
    };
}

// Plain values carry no state beyond their identity.
impl_merge_noop!(
    (), bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize,
    String, &'static str,
);

impl<T: Merge> Merge for Box<T> {
    fn merge(&mut self, other: Self) {
        (**self).merge(*other);
    }
}
