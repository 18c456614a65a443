//! Carving an allocation out of a larger free block.
//!
//! Handles the three-way split/garbage/perfect-fit outcome and the
//! boundary-tag propagation this allocator's header layout requires.

use crate::block;
use crate::freelist::MIN_LINKED_PAYLOAD;
use crate::header::{self, HEADER_SIZE};
use crate::state::HeapState;

/// Carve `req` bytes out of `payload` (currently sized `>= req`), leaving
/// behind a free remainder when there's room for one.
///
/// `payload` must not be marked `FREE` going in — callers clear that flag
/// (and fix up the predecessor's `NEXT_FREE` bit) before calling this, since
/// the same split logic backs both the free-list hit path and in-place
/// growth during `realloc`.
///
/// # Safety
/// `payload` must be a live block with `size_of(payload) >= req`, and
/// `state` must describe the heap `payload` belongs to.
pub(crate) unsafe fn split_or_finalize(state: &mut HeapState, payload: *mut u8, req: u32) {
    let available = header::size_of(payload);
    let remainder = available - req;
    header::set_size(payload, req);

    if remainder == 0 {
        // A perfect fit never leaves a free neighbor above: either there was
        // none, or it was just consumed to make the fit exact (as happens
        // when `realloc` grows in place by absorbing the whole next block).
        // Either way `payload`'s size may have just changed (the in-place-growth
        // case), so the block above's boundary tag needs rewriting too, not
        // just its `PREV_FREE` bit.
        header::clear_next_free(payload);
        if payload != state.max_block {
            let above = block::next_block(payload);
            header::set_prev_size(above, req);
            header::clear_prev_free(above);
        }
        return;
    }

    let was_max = payload == state.max_block;
    let new_block = block::next_block(payload);
    let new_size = remainder - HEADER_SIZE as u32;

    header::set_prev_size(new_block, req);
    header::set_size(new_block, new_size);
    header::set_free(new_block);
    // `new_block`'s header reuses whatever payload bytes were sitting here
    // before (the tail of the block just taken off a free list, or a
    // freshly extended region) — not guaranteed zeroed. Its real neighbors
    // are never free (below is the block just allocated; above is non-free
    // by invariant), so both bits must start clear rather than inherit
    // stale data.
    header::clear_prev_free(new_block);
    header::clear_next_free(new_block);
    header::set_next_free(payload);

    if was_max {
        state.max_block = new_block;
    } else {
        let above = block::next_block(new_block);
        header::set_prev_size(above, new_size);
        header::set_prev_free(above);
    }

    if new_size as usize >= MIN_LINKED_PAYLOAD {
        state.buckets.insert(new_block);
    }
}
