//! Segregated free-list heap allocator over a page-granular host segment.
//!
//! A [`heap::Heap`] owns no memory itself — it carves an address range
//! handed to it page at a time by a [`page_source::PageSource`] into a
//! doubly-linked, size-segregated set of free blocks, each prefixed by a
//! bit-packed header ([`header`]) carrying its size, a boundary tag for
//! backward navigation ([`block`]), and free/adjacency flags maintained by
//! the split ([`split`]) and coalesce ([`coalesce`]) engines.
//!
//! Single-threaded by design: [`heap::Heap`] takes `&mut self` for every
//! mutating operation, so concurrent access needs external synchronization
//! the caller provides. The optional `global` feature layers a
//! `GlobalAlloc` wrapper on top for embedders that want exactly one
//! process-wide instance.

#![cfg_attr(not(test), no_std)]

mod align;
mod block;
mod coalesce;
mod freelist;
mod header;
pub mod logging;
mod page_source;
pub mod report;
mod split;
mod state;

pub mod heap;

#[cfg(feature = "global")]
pub mod global;

#[cfg(test)]
mod mock;

pub use header::HEADER_SIZE;
pub use heap::{Heap, ALIGNMENT};
pub use page_source::PageSource;
pub use report::Violation;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::VecPageSource;

    const PAGE_SIZE: usize = 4096;

    fn fresh_heap(capacity_pages: usize) -> Heap<VecPageSource> {
        let mut heap = Heap::new(VecPageSource::new(PAGE_SIZE, capacity_pages));
        assert!(heap.init());
        heap
    }

    fn assert_valid(heap: &Heap<VecPageSource>) {
        let mut violations = std::vec::Vec::new();
        let ok = heap.validate_heap(|v| violations.push(v));
        assert!(ok, "heap failed validation: {violations:?}");
    }

    #[test]
    fn fresh_init_single_small_alloc() {
        let mut heap = fresh_heap(4);
        let p = heap.alloc(24);
        assert!(p.is_some());
        let p = p.unwrap();
        assert_eq!(unsafe { header::size_of(p.as_ptr()) }, 24);
        assert_valid(&heap);
    }

    #[test]
    fn alloc_free_realloc_same_class_reuses_address() {
        let mut heap = fresh_heap(4);
        let p = heap.alloc(100).unwrap();
        heap.free(Some(p));
        let q = heap.alloc(100).unwrap();
        assert_eq!(p, q);
        assert_valid(&heap);
    }

    #[test]
    fn coalesce_three_neighbors_leaves_one_free_block() {
        let mut heap = fresh_heap(4);
        let a = heap.alloc(64).unwrap();
        let b = heap.alloc(64).unwrap();
        let c = heap.alloc(64).unwrap();
        heap.free(Some(a));
        heap.free(Some(c));
        heap.free(Some(b));

        // Everything has been freed back into one contiguous region; a
        // fresh allocation at the full remaining size should succeed and
        // land back at the very first address the heap ever handed out.
        let reused = heap.alloc(64).unwrap();
        assert_eq!(reused, a);
        assert_valid(&heap);
    }

    #[test]
    fn realloc_grows_in_place_into_freed_neighbor() {
        let mut heap = fresh_heap(4);
        let a = heap.alloc(32).unwrap();
        let b = heap.alloc(32).unwrap();
        heap.free(Some(b));
        let c = heap.realloc(Some(a), 48);
        assert_eq!(c, Some(a));
        assert_valid(&heap);
    }

    #[test]
    fn realloc_moves_and_preserves_contents_when_growth_cannot_fit() {
        let mut heap = fresh_heap(4);
        let a = heap.alloc(32).unwrap();
        unsafe {
            core::ptr::write_bytes(a.as_ptr(), 0xAB, 32);
        }
        let _b = heap.alloc(32).unwrap();
        let c = heap.realloc(Some(a), 200).unwrap();
        assert_ne!(c, a);
        unsafe {
            for i in 0..32 {
                assert_eq!(*c.as_ptr().add(i), 0xAB);
            }
        }
        assert_valid(&heap);
    }

    #[test]
    fn page_extension_grows_segment_and_advances_max_block() {
        let mut heap = fresh_heap(4);
        let mut blocks = std::vec::Vec::new();
        let mut total = 0usize;
        while total < PAGE_SIZE + 256 {
            let size = 256;
            let p = heap.alloc(size).expect("page source has spare capacity to grow into");
            blocks.push(p);
            total += size + HEADER_SIZE;
        }
        assert_valid(&heap);
    }

    #[test]
    fn alloc_zero_returns_none_and_leaves_heap_unchanged() {
        let mut heap = fresh_heap(4);
        assert!(heap.alloc(0).is_none());
        assert_valid(&heap);
    }

    #[test]
    fn small_requests_round_up_to_minimum_block() {
        let mut heap = fresh_heap(4);
        let p = heap.alloc(1).unwrap();
        assert_eq!(unsafe { header::size_of(p.as_ptr()) }, ALIGNMENT * 2);
    }

    #[test]
    fn free_of_none_is_a_no_op() {
        let mut heap = fresh_heap(4);
        heap.free(None);
        assert_valid(&heap);
    }

    #[test]
    fn realloc_to_same_size_returns_same_pointer() {
        let mut heap = fresh_heap(4);
        let p = heap.alloc(40).unwrap();
        let q = heap.realloc(Some(p), 40);
        assert_eq!(q, Some(p));
    }

    #[test]
    fn bucket_of_matches_worked_examples() {
        assert_eq!(freelist::bucket_of(16), 1);
        assert_eq!(freelist::bucket_of(32), 2);
        assert_eq!(freelist::bucket_of(4056), 8);
    }

    #[test]
    fn uninitialized_heap_rejects_allocations() {
        let mut heap: Heap<VecPageSource> = Heap::new(VecPageSource::new(PAGE_SIZE, 4));
        assert!(heap.alloc(16).is_none());
    }

    /// Regression: freeing a block whose upward neighbor had already been
    /// coalesced into something bigger used to leave a stale `NEXT_FREE` bit
    /// on the surviving block, pointing at a successor that was no longer
    /// free. `free(b)` then `free(a)` reproduces it: `a` absorbs `b`, and the
    /// block above `b` (`c`) stays allocated throughout.
    #[test]
    fn freeing_backward_neighbor_after_its_successor_clears_stale_next_free() {
        let mut heap = fresh_heap(4);
        let a = heap.alloc(64).unwrap();
        let _b = heap.alloc(64).unwrap();
        let _c = heap.alloc(64).unwrap();
        let _d = heap.alloc(64).unwrap();
        heap.free(Some(_b));
        heap.free(Some(a));
        assert_valid(&heap);
    }

    /// Regression: `realloc` growing in place by absorbing the whole free
    /// block above it (an exact fit, no remainder) used to leave the
    /// boundary tag of the block above *that* pointing at the absorbed
    /// block's old size instead of the newly grown block's size.
    #[test]
    fn realloc_exact_fit_in_place_growth_fixes_boundary_tag_above() {
        let mut heap = fresh_heap(4);
        let a = heap.alloc(32).unwrap();
        let b = heap.alloc(32).unwrap();
        let _c = heap.alloc(32).unwrap();
        heap.free(Some(b));
        // b's payload (32) plus its header exactly covers the gap needed to
        // grow a from 32 to 32 + HEADER_SIZE + 32, leaving no remainder.
        let grown = heap.realloc(Some(a), 32 + HEADER_SIZE + 32);
        assert_eq!(grown, Some(a));
        assert_valid(&heap);
    }

    /// Regression: a split remainder's header is carved out of memory that
    /// was already live payload bytes (reused free-list links, or an
    /// unzeroed page) — its own `PREV_FREE`/`NEXT_FREE` bits must not
    /// inherit whatever was there before. Plant stale bits at the exact
    /// address the remainder's header will land on, then confirm splitting
    /// over it produces a clean block.
    #[test]
    fn split_remainder_clears_stale_adjacency_bits_left_over_from_reused_memory() {
        let mut heap = fresh_heap(4);
        let p = heap.alloc(200).unwrap();
        heap.free(Some(p));

        let req: usize = 64;
        let future_header = unsafe { p.as_ptr().add(req + HEADER_SIZE) };
        unsafe {
            header::set_prev_free(future_header);
            header::set_next_free(future_header);
        }

        let q = heap.alloc(64).unwrap();
        assert_eq!(q, p);
        assert_valid(&heap);
    }

    /// Regression: growing the segment while the heap's current top block is
    /// free (but too small to satisfy the request that triggered growth)
    /// used to install the new region as a second, adjacent free block
    /// instead of folding it into the existing one.
    #[test]
    fn growth_over_a_free_top_block_merges_instead_of_stacking() {
        let mut heap = fresh_heap(4);
        // Bigger than the ~4 KiB starting page, forcing growth while the
        // one and only (free) block is still sitting at the top.
        let p = heap.alloc(5000).expect("page source has room to grow into");
        assert_eq!(unsafe { header::size_of(p.as_ptr()) }, 5000);
        assert_valid(&heap);
    }
}
