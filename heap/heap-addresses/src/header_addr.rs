use crate::{HEADER_SIZE, PayloadAddr, WORD_SIZE};
use core::fmt;
use core::ops::{Add, AddAssign};

/// Address of a block header.
///
/// A thin wrapper around `usize` that denotes the **start of a block**, i.e.
/// the first byte of the 24-byte header. Use [`payload`](Self::payload) to
/// step forward to the address handed to callers, and
/// [`block_end`](Self::block_end) to compute the first byte past a block of a
/// given payload length (the adjacency test between neighboring blocks).
///
/// ### Invariants
///
/// - No invariant beyond "this is intended to be a header address". In a
///   well-formed heap the address is word-aligned and lies inside the data
///   segment; both are allocator invariants, not enforced here.
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct HeaderAddr(usize);

impl HeaderAddr {
    #[inline]
    #[must_use]
    pub const fn new(addr: usize) -> Self {
        Self(addr)
    }

    #[inline]
    #[must_use]
    pub fn from_ptr<T>(ptr: *const T) -> Self {
        Self(ptr as usize)
    }

    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0
    }

    /// The payload address of this block: the named `+24` conversion.
    #[inline]
    #[must_use]
    pub const fn payload(self) -> PayloadAddr {
        PayloadAddr::new(self.0 + HEADER_SIZE)
    }

    /// First address past a block with payload `length`: header, then
    /// payload. Two blocks abut iff the lower one's `block_end` equals the
    /// upper one's header address.
    #[inline]
    #[must_use]
    pub const fn block_end(self, length: usize) -> usize {
        self.0 + HEADER_SIZE + length
    }

    #[inline]
    #[must_use]
    pub const fn is_word_aligned(self) -> bool {
        self.0 % WORD_SIZE == 0
    }

    #[inline]
    #[must_use]
    pub const fn as_ptr<T>(self) -> *const T {
        self.0 as *const T
    }

    #[inline]
    #[must_use]
    pub const fn as_mut_ptr<T>(self) -> *mut T {
        self.0 as *mut T
    }
}

impl fmt::Debug for HeaderAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HDR(0x{:016X})", self.0)
    }
}

impl fmt::Display for HeaderAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

impl From<usize> for HeaderAddr {
    #[inline]
    fn from(v: usize) -> Self {
        Self::new(v)
    }
}

impl Add<usize> for HeaderAddr {
    type Output = Self;
    #[inline]
    fn add(self, rhs: usize) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl AddAssign<usize> for HeaderAddr {
    #[inline]
    fn add_assign(&mut self, rhs: usize) {
        self.0 += rhs;
    }
}
