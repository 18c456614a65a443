//! Merging a freed block with free neighbors.
//!
//! Covers the four cases this header layout distinguishes via its
//! `PREV_FREE`/`NEXT_FREE` flags, keeping the boundary tag above the
//! merged region correct in each one.

use crate::block;
use crate::freelist::MIN_LINKED_PAYLOAD;
use crate::header::{self, HEADER_SIZE};
use crate::state::HeapState;

/// Merge `payload` with whichever of its neighbors are free, returning the
/// payload pointer of the resulting (possibly larger) block.
///
/// # Safety
/// `payload` must be a live block belonging to the heap described by `state`.
pub(crate) unsafe fn coalesce(state: &mut HeapState, payload: *mut u8) -> *mut u8 {
    let prev_free = payload != state.min_block && header::has_prev_free(payload);
    let next_free = payload != state.max_block && header::has_next_free(payload);

    let canonical = match (prev_free, next_free) {
        (false, false) => payload,
        (false, true) => merge_with_next(state, payload),
        (true, false) => merge_with_prev(state, payload),
        (true, true) => {
            let merged = merge_with_next(state, payload);
            merge_with_prev(state, merged)
        }
    };

    // Whichever neighbors were absorbed, the survivor's own PREV_FREE/NEXT_FREE
    // bits may still carry the pre-merge reading (e.g. `payload` bordered a
    // free `next` that has now been swallowed, so `payload`'s NEXT_FREE bit
    // still says "free" even though the new neighbor above it is not free —
    // it can't be, since no two adjacent blocks are ever both free). Clear
    // both unconditionally; the caller re-derives them from the post-merge
    // neighbors it actually has.
    header::clear_prev_free(canonical);
    header::clear_next_free(canonical);

    canonical
}

unsafe fn merge_with_next(state: &mut HeapState, payload: *mut u8) -> *mut u8 {
    let next = block::next_block(payload);
    let next_size = header::size_of(next);
    if next_size as usize >= MIN_LINKED_PAYLOAD {
        state.buckets.remove(next);
    }

    let new_size = header::size_of(payload) + HEADER_SIZE as u32 + next_size;
    header::set_size(payload, new_size);

    if next == state.max_block {
        state.max_block = payload;
    } else {
        let above = block::next_block(payload);
        header::set_prev_size(above, new_size);
    }

    payload
}

unsafe fn merge_with_prev(state: &mut HeapState, payload: *mut u8) -> *mut u8 {
    let prev = block::prev_block(payload);
    let prev_size = header::size_of(prev);
    if prev_size as usize >= MIN_LINKED_PAYLOAD {
        state.buckets.remove(prev);
    }

    let new_size = prev_size + HEADER_SIZE as u32 + header::size_of(payload);
    header::set_size(prev, new_size);

    if payload == state.max_block {
        state.max_block = prev;
    } else {
        let above = block::next_block(prev);
        header::set_prev_size(above, new_size);
    }

    prev
}
