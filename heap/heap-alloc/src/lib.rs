//! # Heap Allocation over a Program-Break Cursor
//!
//! A general-purpose dynamic memory allocator that sits directly above a
//! brk-style data-segment cursor and exposes the classic allocation quartet:
//! allocate, free, zero-allocate, reallocate.
//!
//! ## Architecture Overview
//!
//! Three cooperating layers, leaves first:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              Allocator Facade (Heap)                │
//! │    • allocate / free / zalloc / reallocate          │
//! │    • growth loop and reclaim policy                 │
//! └─────────────────┬───────────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────────┐
//! │                  Free List                          │
//! │    • address-ordered intrusive doubly-linked list   │
//! │    • best fit over blocks and contiguous runs       │
//! │    • block splitting, trailing-run reclaim          │
//! └─────────────────┬───────────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────────┐
//! │       Segment Driver (heap-segment crate)           │
//! │    • grow / shrink / read the program break         │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! The facade asks the free list for a fit; on failure it grows the data
//! segment by one [`PAGE_GROW`] page, registers the new region as a single
//! free block, and retries. On free, the block returns to the list and the
//! facade asks the list how many [`RECLAIM_CHUNK`] chunks at the high end of
//! the heap are entirely free, shrinking the segment accordingly.
//!
//! ## Concurrency
//!
//! The allocator is **single-threaded and non-reentrant**. There is no
//! internal locking; callers serialize externally, or wrap [`Heap`] in a
//! mutex at whatever layer exposes it process-wide. Within one thread every
//! call's observable effect completes before it returns.
//!
//! ## Re-entry
//!
//! When the quartet is interposed as the process allocator, anything the
//! allocator itself calls comes back through the allocator. The segment
//! drivers therefore do nothing but move the cursor, and the only
//! allocating-in-principle facility used here is the [`log`] front-end —
//! interposers must install a non-allocating logger (or none; the macros
//! are no-ops then).

#![cfg_attr(not(any(test, doctest)), no_std)]

mod free_list;
mod heap;

pub use free_list::FreeBlocks;
pub use heap::Heap;

/// Re-export of the typed block addresses used throughout the public API.
pub use heap_addresses as addresses;

/// Bytes the data segment grows by when the free list cannot satisfy a
/// request: one 200 KiB page.
pub const PAGE_GROW: usize = 200 * 1024;

/// Granularity of returning memory to the OS: 128 KiB chunks retracted from
/// the high end of the heap.
pub const RECLAIM_CHUNK: usize = 128 * 1024;
