//! Std-backed [`PageSource`] used only by this crate's own test suite.
//!
//! Grounded on the fixed-capacity buffer-owning allocators in
//! `other_examples/899fb5a1_..._allocator_with_free` (a `HeapSpace` byte
//! buffer driving `#[cfg(test)] mod tests`) and
//! `other_examples/29434b9b_Dylan-DPC-emballoc` (const-generic buffer
//! ownership). The buffer is allocated once at its full capacity and never
//! resized, so pointers handed out to the heap under test stay valid for
//! the mock's whole lifetime.

use std::vec::Vec;

use crate::page_source::PageSource;

pub(crate) struct VecPageSource {
    page_size: usize,
    buffer: Vec<u8>,
    used_pages: usize,
    capacity_pages: usize,
}

impl VecPageSource {
    pub fn new(page_size: usize, capacity_pages: usize) -> Self {
        Self { page_size, buffer: vec![0u8; page_size * capacity_pages], used_pages: 0, capacity_pages }
    }
}

unsafe impl PageSource for VecPageSource {
    fn page_size(&self) -> usize {
        self.page_size
    }

    unsafe fn init_heap_segment(&mut self, n_pages: usize) -> Option<core::ptr::NonNull<u8>> {
        if self.used_pages != 0 || n_pages > self.capacity_pages {
            return None;
        }
        self.used_pages = n_pages;
        core::ptr::NonNull::new(self.buffer.as_mut_ptr())
    }

    unsafe fn extend_heap_segment(&mut self, n_pages: usize) -> Option<core::ptr::NonNull<u8>> {
        if self.used_pages + n_pages > self.capacity_pages {
            return None;
        }
        let offset = self.used_pages * self.page_size;
        self.used_pages += n_pages;
        core::ptr::NonNull::new(self.buffer.as_mut_ptr().add(offset))
    }
}
