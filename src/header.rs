//! Bit-packed block header codec.
//!
//! Every block is prefixed by an 8-byte header: a `payload_size` word that
//! packs the block's size into its high bits and three flag bits into its
//! low/high bit, plus a `prev_payload_size` word used for backward boundary
//! navigation. Grounded on the stored-size/flag-packing scheme in
//! `other_examples/9106c188_liliilli-rust_tlsf_alloc__src-structs.rs.rs`
//! (`BlockHeader::stored_size`, `FREED_MASK`, `PREV_FREED_MASK`), adapted to
//! this crate's three-flag layout and boundary-tag field.

use core::mem;

/// Size in bytes of a block header (two `u32` words).
pub const HEADER_SIZE: usize = mem::size_of::<RawHeader>();

/// Set when the block is on a free list (or is a garbage free remainder).
const FREE_BIT: u32 = 0x8000_0000;
/// Set when the block immediately above this one is free.
const NEXT_FREE_BIT: u32 = 0x0000_0002;
/// Set when the block immediately below this one is free.
const PREV_FREE_BIT: u32 = 0x0000_0001;
/// Bits of `payload_size` that hold the actual size, once flags are masked out.
const SIZE_MASK: u32 = 0x7FFF_FFFC;

/// Sentinel written into the first block's `prev_payload_size` so a boundary
/// walk can recognize there is no predecessor. Its low bit is clear, so it
/// can coexist with the `PREV_FREE` bit's position without being mistaken
/// for a flag-bearing size.
pub const BASE_SENTINEL: u32 = 0xFFFF_FFFE;

#[repr(C, align(8))]
struct RawHeader {
    payload_size: u32,
    prev_payload_size: u32,
}

#[inline(always)]
unsafe fn header_of(payload: *mut u8) -> *mut RawHeader {
    payload.sub(HEADER_SIZE).cast()
}

/// Payload size recorded in `payload`'s header, with flag bits masked off.
#[inline(always)]
pub unsafe fn size_of(payload: *mut u8) -> u32 {
    (*header_of(payload)).payload_size & SIZE_MASK
}

/// Overwrite the size field, leaving the flag bits untouched.
#[inline(always)]
pub unsafe fn set_size(payload: *mut u8, size: u32) {
    debug_assert_eq!(size & !SIZE_MASK, 0, "block size must be a multiple of 8 and fit the size field");
    let header = header_of(payload);
    let flags = (*header).payload_size & !SIZE_MASK;
    (*header).payload_size = flags | (size & SIZE_MASK);
}

#[inline(always)]
pub unsafe fn is_free(payload: *mut u8) -> bool {
    (*header_of(payload)).payload_size & FREE_BIT != 0
}

#[inline(always)]
pub unsafe fn set_free(payload: *mut u8) {
    (*header_of(payload)).payload_size |= FREE_BIT;
}

#[inline(always)]
pub unsafe fn clear_free(payload: *mut u8) {
    (*header_of(payload)).payload_size &= !FREE_BIT;
}

#[inline(always)]
pub unsafe fn has_next_free(payload: *mut u8) -> bool {
    (*header_of(payload)).payload_size & NEXT_FREE_BIT != 0
}

#[inline(always)]
pub unsafe fn set_next_free(payload: *mut u8) {
    (*header_of(payload)).payload_size |= NEXT_FREE_BIT;
}

#[inline(always)]
pub unsafe fn clear_next_free(payload: *mut u8) {
    (*header_of(payload)).payload_size &= !NEXT_FREE_BIT;
}

#[inline(always)]
pub unsafe fn has_prev_free(payload: *mut u8) -> bool {
    (*header_of(payload)).payload_size & PREV_FREE_BIT != 0
}

#[inline(always)]
pub unsafe fn set_prev_free(payload: *mut u8) {
    (*header_of(payload)).payload_size |= PREV_FREE_BIT;
}

#[inline(always)]
pub unsafe fn clear_prev_free(payload: *mut u8) {
    (*header_of(payload)).payload_size &= !PREV_FREE_BIT;
}

/// Raw boundary-tag value: the payload size of the block directly below
/// `payload`, or [`BASE_SENTINEL`] when `payload` is the first block.
#[inline(always)]
pub unsafe fn prev_size_raw(payload: *mut u8) -> u32 {
    (*header_of(payload)).prev_payload_size
}

#[inline(always)]
pub unsafe fn set_prev_size(payload: *mut u8, size: u32) {
    (*header_of(payload)).prev_payload_size = size;
}
