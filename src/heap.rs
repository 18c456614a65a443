//! Front operations: the public surface applications actually call.
//!
//! Grounded on the `alloc`/`dealloc`/`realloc`/`calloc` entry points in the
//! teacher's `userland/src/libc/malloc.rs`, reshaped from free functions
//! mutating process-global statics into methods on an owned [`Heap`] value
//! generic over its [`PageSource`].

use core::ptr::{self, NonNull};

use crate::align;
use crate::block;
use crate::coalesce;
use crate::freelist::MIN_LINKED_PAYLOAD;
use crate::header::{self, BASE_SENTINEL, HEADER_SIZE};
use crate::logging::{log_trace, log_warn};
use crate::page_source::PageSource;
use crate::report::Violation;
use crate::split;
use crate::state::HeapState;

/// Payload addresses are always rounded to this alignment.
pub const ALIGNMENT: usize = 8;

/// A segregated free-list heap growing over a page-granular segment
/// supplied by `P`.
pub struct Heap<P: PageSource> {
    state: HeapState,
    source: P,
}

impl<P: PageSource> Heap<P> {
    /// Construct a heap with no backing memory yet. Call [`Heap::init`]
    /// before allocating anything.
    pub const fn new(source: P) -> Self {
        Self { state: HeapState::empty(), source }
    }

    /// Request the first page of the segment and install it as one large
    /// free block spanning the page minus its header.
    ///
    /// Returns `false` if the page source could not supply the first page.
    pub fn init(&mut self) -> bool {
        let page_size = self.source.page_size();
        let base = match unsafe { self.source.init_heap_segment(1) } {
            Some(base) => base,
            None => return false,
        };
        insert_new_region(&mut self.state, base.as_ptr(), page_size);
        log_trace!("heap initialized with one page ({page_size} bytes)");
        true
    }

    /// Allocate a block able to hold at least `size` bytes.
    ///
    /// Returns `None` if `size` is zero or the page source is exhausted.
    pub fn alloc(&mut self, size: usize) -> Option<NonNull<u8>> {
        if size == 0 || !self.state.is_initialized() {
            return None;
        }
        let req = Self::round_request(size);

        let found = unsafe { self.state.buckets.find_fit(req) };
        if !found.is_null() {
            unsafe {
                self.state.buckets.remove(found);
                self.finalize_allocation(found, req);
            }
            return NonNull::new(found);
        }

        unsafe { self.grow_and_alloc(req) }.and_then(NonNull::new)
    }

    /// Return a previously allocated block to the heap.
    ///
    /// A `None` pointer is a no-op, matching `free(NULL)`.
    pub fn free(&mut self, ptr: Option<NonNull<u8>>) {
        let Some(ptr) = ptr else { return };
        let payload = ptr.as_ptr();

        unsafe {
            let canonical = coalesce::coalesce(&mut self.state, payload);

            if canonical != self.state.max_block {
                header::set_prev_free(block::next_block(canonical));
            }
            if canonical != self.state.min_block {
                header::set_next_free(block::prev_block(canonical));
            }

            header::set_free(canonical);
            self.state.buckets.insert(canonical);
        }
    }

    /// Resize a previously allocated block, preserving its contents up to
    /// the smaller of the old and new sizes.
    ///
    /// A `None` pointer behaves like [`Heap::alloc`]. Growing in place is
    /// attempted first when the block directly above has enough free space;
    /// otherwise this falls back to allocate-copy-free, including whenever
    /// the request shrinks the block (shrinking never grows in place, since
    /// there is nothing useful to split off a block that is already big
    /// enough).
    pub fn realloc(&mut self, ptr: Option<NonNull<u8>>, new_size: usize) -> Option<NonNull<u8>> {
        let Some(old) = ptr else { return self.alloc(new_size) };
        let old_payload = old.as_ptr();
        let req = Self::round_request(new_size);
        let current = unsafe { header::size_of(old_payload) };

        if req == current {
            return Some(old);
        }

        if req > current && unsafe { self.try_grow_in_place(old_payload, current, req) } {
            return Some(old);
        }

        let new_ptr = self.alloc(new_size)?;
        unsafe {
            let copy_len = current.min(req) as usize;
            ptr::copy_nonoverlapping(old_payload, new_ptr.as_ptr(), copy_len);
        }
        self.free(Some(old));
        Some(new_ptr)
    }

    /// Walk every block in address order and report any consistency
    /// violations found, in lieu of returning a heap-allocated collection.
    ///
    /// Returns `true` if no violations were found.
    pub fn validate_heap<F: FnMut(Violation)>(&self, mut on_violation: F) -> bool {
        if !self.state.is_initialized() {
            return true;
        }

        let mut ok = true;
        let mut report = |v: Violation| {
            ok = false;
            on_violation(v);
        };

        let mut cursor = self.state.min_block;
        let mut prev: *mut u8 = ptr::null_mut();
        loop {
            unsafe {
                let size = header::size_of(cursor);
                if size as usize % ALIGNMENT != 0 {
                    report(Violation::MisalignedSize { block: cursor as usize, size });
                }

                if header::is_free(cursor)
                    && size as usize >= MIN_LINKED_PAYLOAD
                    && !self.state.buckets.contains(cursor)
                {
                    report(Violation::UnreachableFreeBlock { block: cursor as usize });
                }

                if !prev.is_null() {
                    let expected = header::size_of(prev);
                    let found = header::prev_size_raw(cursor);
                    if found != expected {
                        report(Violation::BoundaryTagMismatch { block: cursor as usize, expected, found });
                    }

                    let predecessor_free = header::is_free(prev);
                    if header::has_prev_free(cursor) != predecessor_free {
                        report(Violation::PrevFreeFlagMismatch { block: cursor as usize });
                    }
                    if header::has_next_free(prev) != header::is_free(cursor) {
                        report(Violation::NextFreeFlagMismatch { block: prev as usize });
                    }
                    if header::is_free(prev) && header::is_free(cursor) {
                        report(Violation::AdjacentFreeBlocks { lower: prev as usize, upper: cursor as usize });
                    }
                } else {
                    debug_assert_eq!(header::prev_size_raw(cursor), BASE_SENTINEL);
                }

                if cursor == self.state.max_block {
                    break;
                }
                prev = cursor;
                cursor = block::next_block(cursor);
            }
        }

        ok
    }

    fn round_request(size: usize) -> u32 {
        align::align_up(size, ALIGNMENT).max(MIN_LINKED_PAYLOAD) as u32
    }

    /// Finish turning a free block found on a bucket into an allocated one:
    /// fix up the predecessor's `NEXT_FREE` bit, clear `FREE`, then split.
    unsafe fn finalize_allocation(&mut self, found: *mut u8, req: u32) {
        if found != self.state.min_block {
            header::clear_next_free(block::prev_block(found));
        }
        header::clear_free(found);
        split::split_or_finalize(&mut self.state, found, req);
    }

    /// Try to satisfy a growing realloc by absorbing the free block directly
    /// above `old_payload`, reusing the split engine to carve the request
    /// back out of the merged region.
    unsafe fn try_grow_in_place(&mut self, old_payload: *mut u8, current: u32, req: u32) -> bool {
        if old_payload == self.state.max_block || !header::has_next_free(old_payload) {
            return false;
        }

        let next = block::next_block(old_payload);
        let next_size = header::size_of(next);
        let combined = current + HEADER_SIZE as u32 + next_size;
        if combined < req {
            return false;
        }

        if next_size as usize >= MIN_LINKED_PAYLOAD {
            self.state.buckets.remove(next);
        }

        let was_max = next == self.state.max_block;
        header::set_size(old_payload, combined);
        if was_max {
            self.state.max_block = old_payload;
        }

        split::split_or_finalize(&mut self.state, old_payload, req);
        true
    }

    /// Obtain enough fresh pages to satisfy `req`, install them as one new
    /// free region contiguous with the current top of the heap, then carve
    /// `req` out of it exactly as the free-list hit path would.
    unsafe fn grow_and_alloc(&mut self, req: u32) -> Option<*mut u8> {
        let page_size = self.source.page_size();
        let bytes_needed = req as usize + HEADER_SIZE;
        let n_pages = (bytes_needed + page_size - 1) / page_size;

        let base = self.source.extend_heap_segment(n_pages)?;
        let region = insert_new_region(&mut self.state, base.as_ptr(), n_pages * page_size);

        if header::size_of(region) as usize >= MIN_LINKED_PAYLOAD {
            self.state.buckets.remove(region);
        }
        self.finalize_allocation(region, req);
        log_trace!("grew heap by {n_pages} page(s) to satisfy a {req}-byte request");
        Some(region)
    }
}

/// Install a freshly obtained, contiguous memory region at the top of the
/// heap, linking it into its bucket.
///
/// Shared by [`Heap::init`] (the first page) and [`Heap::grow_and_alloc`]
/// (every later extension) so both paths update `min_block`/`max_block` and
/// the boundary tag above the previous top the same way. If the heap's
/// current top block is already free (a free-list search can miss it and
/// still force growth, e.g. when it's smaller than the request), the new
/// bytes are folded into that block instead of installed as a second block
/// directly above it — two adjacent free blocks would violate the
/// no-adjacent-free-blocks invariant the moment they were created.
unsafe fn insert_new_region(state: &mut HeapState, base: *mut u8, total_bytes: usize) -> *mut u8 {
    if !state.max_block.is_null() && header::is_free(state.max_block) {
        return extend_free_top(state, base, total_bytes);
    }

    let new_payload = base.add(HEADER_SIZE);
    let payload_size = (total_bytes - HEADER_SIZE) as u32;

    let prev_size = if state.max_block.is_null() { BASE_SENTINEL } else { header::size_of(state.max_block) };

    header::set_prev_size(new_payload, prev_size);
    header::set_size(new_payload, payload_size);
    header::set_free(new_payload);
    // Pages fresh off the page source aren't guaranteed zero-filled; don't
    // let leftover bits masquerade as a stale adjacency flag.
    header::clear_prev_free(new_payload);
    header::clear_next_free(new_payload);

    if !state.max_block.is_null() {
        header::set_next_free(state.max_block);
    } else {
        state.min_block = new_payload;
    }
    state.max_block = new_payload;

    if payload_size as usize >= MIN_LINKED_PAYLOAD {
        state.buckets.insert(new_payload);
    } else {
        log_warn!("first heap page too small to hold a linkable free block");
    }

    new_payload
}

/// Fold a newly extended region into the heap's current top block, which is
/// already free. Keeps the top block's header address fixed and simply
/// grows its recorded size, exactly as an in-place `realloc` growth would.
unsafe fn extend_free_top(state: &mut HeapState, base: *mut u8, total_bytes: usize) -> *mut u8 {
    let top = state.max_block;
    let top_size = header::size_of(top);
    debug_assert_eq!(base, block::next_header(top), "page source returned a non-contiguous region");

    if top_size as usize >= MIN_LINKED_PAYLOAD {
        state.buckets.remove(top);
    }

    let new_size = top_size + total_bytes as u32;
    header::set_size(top, new_size);

    if new_size as usize >= MIN_LINKED_PAYLOAD {
        state.buckets.insert(top);
    }

    top
}
