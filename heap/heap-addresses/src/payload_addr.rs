use crate::{HEADER_SIZE, HeaderAddr};
use core::fmt;
use core::ops::{Add, AddAssign};

/// Address handed to the allocator's caller.
///
/// A thin wrapper around `usize` denoting the first payload byte of a block.
/// The 24 bytes immediately before it are the block header and belong to the
/// allocator; [`header`](Self::header) is the named `-24` conversion back to
/// it.
///
/// The null check of the classic C surface lives at this boundary:
/// [`from_ptr`](Self::from_ptr) maps a null pointer to `None`, so the
/// allocator proper never sees a null payload.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PayloadAddr(usize);

impl PayloadAddr {
    #[inline]
    #[must_use]
    pub const fn new(addr: usize) -> Self {
        Self(addr)
    }

    /// Wrap a raw caller pointer; `None` for null.
    #[inline]
    #[must_use]
    pub fn from_ptr(ptr: *mut u8) -> Option<Self> {
        if ptr.is_null() {
            None
        } else {
            Some(Self(ptr as usize))
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0
    }

    /// The header address of this block: the named `-24` conversion.
    #[inline]
    #[must_use]
    pub const fn header(self) -> HeaderAddr {
        HeaderAddr::new(self.0 - HEADER_SIZE)
    }

    #[inline]
    #[must_use]
    pub const fn as_ptr(self) -> *const u8 {
        self.0 as *const u8
    }

    #[inline]
    #[must_use]
    pub const fn as_mut_ptr(self) -> *mut u8 {
        self.0 as *mut u8
    }
}

impl fmt::Debug for PayloadAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PAY(0x{:016X})", self.0)
    }
}

impl fmt::Display for PayloadAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

impl Add<usize> for PayloadAddr {
    type Output = Self;
    #[inline]
    fn add(self, rhs: usize) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl AddAssign<usize> for PayloadAddr {
    #[inline]
    fn add_assign(&mut self, rhs: usize) {
        self.0 += rhs;
    }
}
