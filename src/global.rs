//! Optional `GlobalAlloc` wrapper for a single process-wide heap instance.
//!
//! This allocator has no internal locking (single-threaded use only), so
//! exposing it as `#[global_allocator]` needs an unsynchronized `Sync`
//! opt-in on the wrapper rather than an added mutex that would misrepresent
//! the contract.

use core::alloc::{GlobalAlloc, Layout};
use core::cell::UnsafeCell;
use core::ptr;

use crate::heap::Heap;
use crate::page_source::PageSource;

/// Wraps a [`Heap`] so it can back a `#[global_allocator]`.
///
/// # Safety
/// Only sound under single-threaded access, or external synchronization
/// the type itself does not provide.
pub struct SyncHeap<P: PageSource>(UnsafeCell<Heap<P>>);

unsafe impl<P: PageSource> Sync for SyncHeap<P> {}

impl<P: PageSource> SyncHeap<P> {
    pub const fn new(source: P) -> Self {
        Self(UnsafeCell::new(Heap::new(source)))
    }

    /// Must be called once, before any allocation, from a single thread.
    pub fn init(&self) -> bool {
        unsafe { (*self.0.get()).init() }
    }
}

unsafe impl<P: PageSource> GlobalAlloc for SyncHeap<P> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        // The allocator rounds every request up to an 8-byte multiple
        // internally; requests for a coarser alignment than that aren't
        // supported and are rejected rather than silently under-aligned.
        if layout.align() > crate::heap::ALIGNMENT {
            return ptr::null_mut();
        }
        match (*self.0.get()).alloc(layout.size()) {
            Some(p) => p.as_ptr(),
            None => ptr::null_mut(),
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        (*self.0.get()).free(core::ptr::NonNull::new(ptr));
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if layout.align() > crate::heap::ALIGNMENT {
            return ptr::null_mut();
        }
        match (*self.0.get()).realloc(core::ptr::NonNull::new(ptr), new_size) {
            Some(p) => p.as_ptr(),
            None => ptr::null_mut(),
        }
    }
}
