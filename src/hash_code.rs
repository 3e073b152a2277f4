//! Pass-through hashing for elements that carry their own hash code.
//!
//! With [`BuildIdentityHasher`] the set's natural index for an element is
//! `|code| mod capacity`, where `code` is the integer the element writes in
//! its `Hash` impl. Signed codes contribute their absolute value. Byte
//! writes (strings, slices) and any write after the first go through
//! `FxHasher`, so arbitrary keys still hash, just without the exact-index
//! guarantee.

use core::fmt;
use core::hash::{BuildHasher, Hasher};
use rustc_hash::FxHasher;

/// Hasher whose first integer write becomes the hash verbatim. Any further
/// write switches to `FxHasher`, seeded with that first code.
#[derive(Clone, Default)]
pub struct IdentityHasher {
    code: Option<u64>,
    fx: Option<FxHasher>,
}

impl IdentityHasher {
    #[inline]
    fn write_code(&mut self, code: u64) {
        if self.fx.is_none() && self.code.is_none() {
            self.code = Some(code);
        } else {
            self.folding().write_u64(code);
        }
    }

    fn folding(&mut self) -> &mut FxHasher {
        let first = self.code;
        self.fx.get_or_insert_with(|| {
            let mut fx = FxHasher::default();
            if let Some(code) = first {
                fx.write_u64(code);
            }
            fx
        })
    }
}

impl fmt::Debug for IdentityHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityHasher")
            .field("code", &self.code)
            .field("folded", &self.fx.is_some())
            .finish()
    }
}

impl Hasher for IdentityHasher {
    #[inline]
    fn finish(&self) -> u64 {
        match &self.fx {
            Some(fx) => fx.finish(),
            None => self.code.unwrap_or(0),
        }
    }

    fn write(&mut self, bytes: &[u8]) {
        self.folding().write(bytes);
    }

    #[inline]
    fn write_u8(&mut self, i: u8) {
        self.write_code(u64::from(i));
    }
    #[inline]
    fn write_u16(&mut self, i: u16) {
        self.write_code(u64::from(i));
    }
    #[inline]
    fn write_u32(&mut self, i: u32) {
        self.write_code(u64::from(i));
    }
    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.write_code(i);
    }
    #[inline]
    fn write_usize(&mut self, i: usize) {
        self.write_code(i as u64);
    }
    #[inline]
    fn write_i8(&mut self, i: i8) {
        self.write_code(u64::from(i.unsigned_abs()));
    }
    #[inline]
    fn write_i16(&mut self, i: i16) {
        self.write_code(u64::from(i.unsigned_abs()));
    }
    #[inline]
    fn write_i32(&mut self, i: i32) {
        self.write_code(u64::from(i.unsigned_abs()));
    }
    #[inline]
    fn write_i64(&mut self, i: i64) {
        self.write_code(i.unsigned_abs());
    }
    #[inline]
    fn write_isize(&mut self, i: isize) {
        self.write_code(i.unsigned_abs() as u64);
    }
}

/// `BuildHasher` producing [`IdentityHasher`]s.
#[derive(Copy, Clone, Debug, Default)]
pub struct BuildIdentityHasher;

impl BuildHasher for BuildIdentityHasher {
    type Hasher = IdentityHasher;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        IdentityHasher::default()
    }
}
