//! Diagnostics surfaced by [`crate::heap::Heap::validate_heap`].
//!
//! A plain enum with a hand-written `Display` impl rather than a
//! derive-macro error crate, since this type never needs to implement
//! `std::error::Error`.

use core::fmt;

/// A single consistency violation found while walking the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// `block`'s boundary tag doesn't match the actual size of its predecessor.
    BoundaryTagMismatch { block: usize, expected: u32, found: u32 },
    /// `PREV_FREE` on `block` disagrees with whether its predecessor is free.
    PrevFreeFlagMismatch { block: usize },
    /// `NEXT_FREE` on `block` disagrees with whether its successor is free.
    NextFreeFlagMismatch { block: usize },
    /// Two adjacent free blocks were found that should have been coalesced.
    AdjacentFreeBlocks { lower: usize, upper: usize },
    /// A block's payload size is not a multiple of the allocator's alignment.
    MisalignedSize { block: usize, size: u32 },
    /// A free block large enough to carry free-list links isn't reachable
    /// from its size class's bucket.
    UnreachableFreeBlock { block: usize },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::BoundaryTagMismatch { block, expected, found } => write!(
                f,
                "block at {block:#x}: boundary tag says predecessor size {found}, actual predecessor size is {expected}"
            ),
            Violation::PrevFreeFlagMismatch { block } => {
                write!(f, "block at {block:#x}: PREV_FREE flag does not match predecessor's free state")
            }
            Violation::NextFreeFlagMismatch { block } => {
                write!(f, "block at {block:#x}: NEXT_FREE flag does not match successor's free state")
            }
            Violation::AdjacentFreeBlocks { lower, upper } => {
                write!(f, "blocks at {lower:#x} and {upper:#x} are both free and adjacent but were not coalesced")
            }
            Violation::MisalignedSize { block, size } => {
                write!(f, "block at {block:#x}: size {size} is not a multiple of the allocator's alignment")
            }
            Violation::UnreachableFreeBlock { block } => {
                write!(f, "block at {block:#x}: free and large enough to link, but absent from its bucket")
            }
        }
    }
}
