//! The collaborator that hands the heap fresh pages.
//!
//! The allocator itself never knows how pages are obtained — that's the
//! host's job. The allocator consumes an address range; something else is
//! responsible for backing it with memory.

use core::ptr::NonNull;

/// Supplies the page-granular memory a [`crate::heap::Heap`] grows into.
///
/// Implementors must return contiguous, writable memory: `extend_heap_segment`
/// is required to hand back pages immediately following whatever was
/// returned by the previous call (whether that was `init_heap_segment` or an
/// earlier `extend_heap_segment`). The allocator relies on this contiguity
/// to stitch the new region onto the top of the heap without a gap.
///
/// # Safety
/// Implementations must guarantee the returned pointer is valid for
/// `n_pages * page_size()` bytes, writable, and not aliased by any other
/// live reference for as long as the heap exists.
pub unsafe trait PageSource {
    /// Page size in bytes. Must be a power of two and must not change
    /// across the lifetime of a given instance.
    fn page_size(&self) -> usize;

    /// Obtain the first `n_pages` pages of the heap segment.
    ///
    /// Called exactly once, before any `extend_heap_segment` call.
    ///
    /// # Safety
    /// See the trait-level contract.
    unsafe fn init_heap_segment(&mut self, n_pages: usize) -> Option<NonNull<u8>>;

    /// Extend the heap segment by `n_pages` more pages, contiguous with
    /// whatever was returned by the previous call.
    ///
    /// # Safety
    /// See the trait-level contract.
    unsafe fn extend_heap_segment(&mut self, n_pages: usize) -> Option<NonNull<u8>>;
}
