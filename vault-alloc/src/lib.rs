//! Raw allocation capability for the vault containers.
//!
//! Containers delegate every buffer acquisition and release to a [`RawAlloc`]
//! instance they hold by value. The contract is deliberately small: allocate
//! a block for a [`Layout`], give it back with the same layout. No statefulness
//! beyond that is assumed, and none is provided by the default [`Global`]
//! implementation, which routes straight to `std::alloc`.
//!
//! # Example
//!
//! ```
//! use std::alloc::Layout;
//! use vault_alloc::{Global, RawAlloc};
//!
//! let layout = Layout::array::<u64>(16).unwrap();
//! let ptr = Global.allocate(layout).unwrap();
//! unsafe { Global.deallocate(ptr, layout) };
//! ```

#![warn(missing_docs)]

use std::alloc::Layout;
use std::ptr::NonNull;

// =============================================================================
// Errors
// =============================================================================

/// Error returned when an allocation request cannot be satisfied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// The allocator could not provide a block for this layout.
    Exhausted {
        /// The layout that was requested.
        layout: Layout,
    },
    /// The requested element count overflowed the maximum allocation size.
    CapacityOverflow,
}

impl std::fmt::Display for AllocError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocError::Exhausted { layout } => {
                write!(f, "memory allocation of {} bytes failed", layout.size())
            }
            AllocError::CapacityOverflow => write!(f, "allocation size overflow"),
        }
    }
}

impl std::error::Error for AllocError {}

// =============================================================================
// RawAlloc
// =============================================================================

/// A minimal raw memory allocation contract.
///
/// Implementations hand out blocks described by a [`Layout`] and take them
/// back with the same layout. Containers hold an implementor by value and
/// delegate to it at construction, growth, and destruction; they never touch
/// the platform allocator directly.
///
/// The contract is sequential: implementations are not required to be
/// thread-safe, only reentrant-safe for single-owner use.
pub trait RawAlloc {
    /// Allocates a block of memory for `layout`.
    ///
    /// The returned pointer is valid for reads and writes of `layout.size()`
    /// bytes and aligned to `layout.align()`. The block's contents are
    /// uninitialized.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::Exhausted`] if the block cannot be provided.
    ///
    /// # Panics
    ///
    /// Panics if `layout` has zero size. Containers are responsible for never
    /// requesting empty blocks.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError>;

    /// Returns a block previously obtained from [`allocate`](Self::allocate).
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate` on this same instance with
    /// this same `layout`, and must not be used after this call.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

/// The default allocator: a stateless wrapper over the platform heap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Global;

impl RawAlloc for Global {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        assert!(layout.size() > 0, "allocation size must be non-zero");

        // Safety: size checked non-zero above.
        let ptr = unsafe { std::alloc::alloc(layout) };
        NonNull::new(ptr).ok_or(AllocError::Exhausted { layout })
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

impl<A: RawAlloc + ?Sized> RawAlloc for &A {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        (**self).allocate(layout)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { (**self).deallocate(ptr, layout) }
    }
}

// =============================================================================
// Layout helpers
// =============================================================================

/// Computes the layout of an array of `n` elements of type `T`.
///
/// # Errors
///
/// Returns [`AllocError::CapacityOverflow`] if the total size overflows.
#[inline]
pub fn array_layout<T>(n: usize) -> Result<Layout, AllocError> {
    Layout::array::<T>(n).map_err(|_| AllocError::CapacityOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_roundtrip() {
        let layout = Layout::array::<u64>(32).unwrap();
        let ptr = Global.allocate(layout).unwrap();

        unsafe {
            std::ptr::write_bytes(ptr.as_ptr(), 0xCD, layout.size());
            assert_eq!(*ptr.as_ptr(), 0xCD);
            assert_eq!(*ptr.as_ptr().add(layout.size() - 1), 0xCD);
            Global.deallocate(ptr, layout);
        }
    }

    #[test]
    fn allocation_is_aligned() {
        #[repr(align(64))]
        struct Aligned([u8; 64]);

        let layout = Layout::new::<Aligned>();
        let ptr = Global.allocate(layout).unwrap();
        assert_eq!(ptr.as_ptr() as usize % 64, 0);
        unsafe { Global.deallocate(ptr, layout) };
    }

    #[test]
    #[should_panic(expected = "non-zero")]
    fn zero_size_panics() {
        let _ = Global.allocate(Layout::new::<()>());
    }

    #[test]
    fn by_reference_delegates() {
        let alloc = &Global;
        let layout = Layout::array::<u32>(8).unwrap();
        let ptr = alloc.allocate(layout).unwrap();
        unsafe { alloc.deallocate(ptr, layout) };
    }

    #[test]
    fn array_layout_matches_std() {
        let layout = array_layout::<u64>(100).unwrap();
        assert_eq!(layout.size(), 800);
        assert_eq!(layout.align(), std::mem::align_of::<u64>());
    }

    #[test]
    fn array_layout_overflow() {
        assert_eq!(
            array_layout::<u64>(usize::MAX),
            Err(AllocError::CapacityOverflow)
        );
    }

    #[test]
    fn error_display() {
        let layout = Layout::array::<u8>(4096).unwrap();
        let err = AllocError::Exhausted { layout };
        assert_eq!(err.to_string(), "memory allocation of 4096 bytes failed");
        assert_eq!(
            AllocError::CapacityOverflow.to_string(),
            "allocation size overflow"
        );
    }

    #[test]
    fn many_allocations_are_distinct() {
        let layout = Layout::array::<u8>(64).unwrap();
        let ptrs: Vec<_> = (0..16).map(|_| Global.allocate(layout).unwrap()).collect();
        for i in 0..ptrs.len() {
            for j in (i + 1)..ptrs.len() {
                assert_ne!(ptrs[i], ptrs[j]);
            }
        }
        for ptr in ptrs {
            unsafe { Global.deallocate(ptr, layout) };
        }
    }
}
