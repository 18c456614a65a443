//! Pointer arithmetic for stepping between adjacent blocks.
//!
//! Every function here takes and returns a *payload* pointer (the address
//! immediately after a block's header) — block pointers always mean
//! "payload start".

use crate::header::{self, HEADER_SIZE};

/// Address of the header belonging to the block directly above `payload`.
#[inline(always)]
pub unsafe fn next_header(payload: *mut u8) -> *mut u8 {
    payload.add(header::size_of(payload) as usize)
}

/// Payload of the block directly above `payload`.
///
/// Caller is responsible for checking `payload != max_block` before
/// dereferencing the result; there is no header above the heap's last block.
#[inline(always)]
pub unsafe fn next_block(payload: *mut u8) -> *mut u8 {
    next_header(payload).add(HEADER_SIZE)
}

/// Payload of the block directly below `payload`, using its boundary tag.
///
/// Caller is responsible for checking `payload != min_block` first; the
/// first block's boundary tag is a sentinel, not a real size.
#[inline(always)]
pub unsafe fn prev_block(payload: *mut u8) -> *mut u8 {
    payload.sub(HEADER_SIZE).sub(header::prev_size_raw(payload) as usize)
}
