use crate::free_list::{FreeBlocks, FreeList, FreeNode};
use crate::{PAGE_GROW, RECLAIM_CHUNK};
use core::ptr;
use heap_addresses::{HEADER_SIZE, HeaderAddr, MIN_PAYLOAD, PayloadAddr, round_up_to_word};
use heap_segment::SegmentSource;
use log::{trace, warn};

/// The allocator facade: the allocation quartet on top of a free list and an
/// injected segment driver.
///
/// All process-wide allocator state lives in this one value — the free-list
/// head, the tracked `program_break`, the `initial_break` captured on first
/// use, and the initialization flag. Injecting the [`SegmentSource`] keeps
/// the facade testable against a simulated break cursor.
///
/// ## Break state machine
///
/// ```text
/// Uninitialized ──allocate()──▶ Empty ──first page──▶ Populated
///                                                      │    ▲
///                                                 grow/shrink
///                                                      ▼    │
///                                                     Populated'
/// ```
///
/// `Uninitialized → Empty` captures `initial_break` on the first call to
/// [`allocate`](Self::allocate); `Empty → Populated` acquires the first
/// [`PAGE_GROW`] page; every later grow or shrink moves between populated
/// states. There is no terminal state — the heap lives as long as the
/// process.
///
/// ## Reclaim
///
/// Every free ends with a reclaim pass: when the trailing contiguous run of
/// free blocks exceeds [`RECLAIM_CHUNK`], whole chunks are retracted from
/// the break. The calculation trusts the trailing run in list order to reach
/// the break, as the break-shrink protocol requires; see
/// `FreeList::compute_reclaim_chunks`.
pub struct Heap<S> {
    segment: S,
    list: FreeList,
    program_break: usize,
    initial_break: usize,
    initialized: bool,
}

impl<S> Heap<S> {
    /// Construct an uninitialized heap over `segment`. No memory is touched
    /// until the first allocation.
    #[must_use]
    pub const fn new(segment: S) -> Self {
        Self {
            segment,
            list: FreeList::new(),
            program_break: 0,
            initial_break: 0,
            initialized: false,
        }
    }

    /// Indicates whether the break has been captured yet.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The tracked program break (0 before initialization).
    #[must_use]
    pub const fn program_break(&self) -> usize {
        self.program_break
    }

    /// The break captured on first use (0 before initialization).
    #[must_use]
    pub const fn initial_break(&self) -> usize {
        self.initial_break
    }

    /// Iterate over the free blocks in ascending address order as
    /// `(header, length)` pairs. Diagnostic surface; the borrow keeps the
    /// heap unmodified while iterating.
    pub fn free_blocks(&self) -> FreeBlocks<'_> {
        self.list.blocks()
    }
}

impl<S: SegmentSource> Heap<S> {
    /// Allocate `size` bytes and return the payload address, or `None` when
    /// the data segment cannot grow any further.
    ///
    /// The returned payload is word-aligned and at least
    /// [`MIN_PAYLOAD`] bytes long; `size` is rounded up accordingly and the
    /// rounded value is what the block's header records.
    #[must_use]
    pub fn allocate(&mut self, size: usize) -> Option<PayloadAddr> {
        self.ensure_init();
        let size = round_up_to_word(size.max(MIN_PAYLOAD));

        // An empty heap has nothing to search yet.
        if self.program_break == self.initial_break {
            self.grow_by_page()?;
        }
        loop {
            if let Some(payload) = unsafe { self.list.find_best_fit(size) } {
                return Some(payload);
            }
            self.grow_by_page()?;
        }
    }

    /// Return `payload` to the free list, then retract whole
    /// [`RECLAIM_CHUNK`]s from the break if the trailing run allows it.
    ///
    /// The classic null no-op lives at the pointer boundary:
    /// [`PayloadAddr::from_ptr`] never produces a null payload.
    ///
    /// # Safety
    /// - `payload` must have been returned by this heap's
    ///   [`allocate`](Self::allocate), [`zalloc`](Self::zalloc) or
    ///   [`reallocate`](Self::reallocate) and not freed since. Freeing
    ///   anything else is undefined behavior and is not detected.
    pub unsafe fn free(&mut self, payload: PayloadAddr) {
        unsafe {
            self.list.insert(payload);
        }
        self.reclaim();
    }

    /// Allocate a zeroed array of `nmemb` elements of `size` bytes each.
    ///
    /// Returns `None` when `nmemb * size` overflows or the segment cannot
    /// grow.
    #[must_use]
    pub fn zalloc(&mut self, nmemb: usize, size: usize) -> Option<PayloadAddr> {
        let total = nmemb.checked_mul(size)?;
        let payload = self.allocate(total)?;
        unsafe {
            ptr::write_bytes(payload.as_mut_ptr(), 0, total);
        }
        Some(payload)
    }

    /// Resize a block.
    ///
    /// - `None` behaves as [`allocate`](Self::allocate).
    /// - `new_size == 0` frees the block and returns `None`.
    /// - Growing prefers folding in a free block that physically follows the
    ///   payload; otherwise the block is relocated (grow the segment, find a
    ///   full-size fit, copy, free the old block).
    /// - Shrinking is done in place; a cut of more than one header is carved
    ///   off as a new free block, a smaller cut leaves the block unchanged.
    ///
    /// # Safety
    /// - A `Some` payload must satisfy the same contract as for
    ///   [`free`](Self::free).
    #[must_use]
    pub unsafe fn reallocate(
        &mut self,
        payload: Option<PayloadAddr>,
        new_size: usize,
    ) -> Option<PayloadAddr> {
        let Some(payload) = payload else {
            return self.allocate(new_size);
        };
        if new_size == 0 {
            unsafe { self.free(payload) };
            return None;
        }

        let header = payload.header();
        let new_size = round_up_to_word(new_size.max(MIN_PAYLOAD));
        let old_size = unsafe { FreeNode::length_at(header) };

        if new_size > old_size {
            unsafe { self.grow_block(payload, old_size, new_size) }
        } else {
            unsafe { self.shrink_block(payload, old_size, new_size) }
        }
    }

    /// Grow path of [`reallocate`](Self::reallocate).
    ///
    /// # Safety
    /// As for `reallocate`; `new_size > old_size`.
    unsafe fn grow_block(
        &mut self,
        payload: PayloadAddr,
        old_size: usize,
        new_size: usize,
    ) -> Option<PayloadAddr> {
        match unsafe { self.list.find_best_fit(new_size - old_size) } {
            // The candidate starts right where this block ends: fold it in.
            // Its header was already consumed by the best-fit call; the
            // block's own header takes over the whole span.
            Some(candidate)
                if candidate.as_usize() == payload.as_usize() + old_size + HEADER_SIZE =>
            {
                unsafe { FreeNode::set_length_at(payload.header(), new_size) };
                Some(payload)
            }
            Some(candidate) => {
                unsafe { self.free(candidate) };
                unsafe { self.relocate(payload, old_size, new_size) }
            }
            None => unsafe { self.relocate(payload, old_size, new_size) },
        }
    }

    /// Move the block to a fresh full-size fit: grow the segment, search,
    /// copy the old payload over, free the old block.
    ///
    /// # Safety
    /// As for `reallocate`.
    unsafe fn relocate(
        &mut self,
        payload: PayloadAddr,
        old_size: usize,
        new_size: usize,
    ) -> Option<PayloadAddr> {
        self.grow_by_page()?;
        let target = loop {
            if let Some(target) = unsafe { self.list.find_best_fit(new_size) } {
                break target;
            }
            self.grow_by_page()?;
        };
        unsafe {
            ptr::copy_nonoverlapping(payload.as_ptr(), target.as_mut_ptr(), old_size);
            self.free(payload);
        }
        Some(target)
    }

    /// Shrink path of [`reallocate`](Self::reallocate): cut the block down
    /// in place when the tail is worth carving off.
    ///
    /// # Safety
    /// As for `reallocate`; `new_size <= old_size` before rounding.
    unsafe fn shrink_block(
        &mut self,
        payload: PayloadAddr,
        old_size: usize,
        new_size: usize,
    ) -> Option<PayloadAddr> {
        // Rounding can push `new_size` past an unaligned stored length; the
        // block simply stays as it is then, same as a cut too small to hold
        // a header.
        let Some(cut) = old_size.checked_sub(new_size) else {
            return Some(payload);
        };
        if cut <= HEADER_SIZE {
            return Some(payload);
        }
        unsafe {
            FreeNode::set_length_at(payload.header(), new_size);
            let tail = HeaderAddr::new(payload.as_usize() + new_size);
            tail.as_mut_ptr::<usize>().write(cut - HEADER_SIZE);
            self.free(tail.payload());
        }
        Some(payload)
    }

    /// Capture the break on first use.
    fn ensure_init(&mut self) {
        if !self.initialized {
            let brk = self.segment.current_break();
            self.initial_break = brk;
            self.program_break = brk;
            self.initialized = true;
            trace!("heap break captured at 0x{brk:016X}");
        }
    }

    /// Grow the segment by one page and register the new region as a single
    /// free block. `None` when the driver refuses; the heap is unchanged
    /// then.
    fn grow_by_page(&mut self) -> Option<()> {
        let old_break = self.program_break;
        match self.segment.grow(PAGE_GROW) {
            Ok(new_break) => {
                trace!("data segment grew by {PAGE_GROW} bytes to 0x{new_break:016X}");
                let header = HeaderAddr::new(old_break);
                unsafe {
                    ptr::write(
                        header.as_mut_ptr::<usize>(),
                        new_break - old_break - HEADER_SIZE,
                    );
                    self.list.insert(header.payload());
                }
                self.program_break = new_break;
                Some(())
            }
            Err(err) => {
                trace!("data segment refused to grow: {err}");
                None
            }
        }
    }

    /// Ask the list for reclaimable chunks and retract them from the break.
    fn reclaim(&mut self) {
        let chunks = unsafe { self.list.compute_reclaim_chunks() };
        if chunks == 0 {
            return;
        }
        let delta = chunks * RECLAIM_CHUNK;
        match self.segment.shrink(delta) {
            Ok(new_break) => {
                trace!("reclaimed {chunks} chunk(s); break back to 0x{new_break:016X}");
                self.program_break = new_break;
            }
            Err(err) => warn!("reclaim of {chunks} chunk(s) failed: {err}"),
        }
    }
}
