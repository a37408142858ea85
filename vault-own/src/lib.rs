//! Single-owner smart pointer with a customizable deleter.
//!
//! [`Own`] holds exclusive ownership of one heap object plus a [`Deleter`]
//! value that knows how to destroy it. The deleter runs exactly once, at
//! drop or [`reset`](Own::reset), or never if ownership was
//! [`release`](Own::release)d back to the caller. Ownership only ever
//! transfers; it is never duplicated, so the type is not `Clone`.
//!
//! # Example
//!
//! ```
//! use vault_own::Own;
//!
//! let mut p1 = Own::new(42);
//! assert_eq!(*p1, 42);
//!
//! // Transfer ownership out of the place, leaving p1 observably empty.
//! let p2 = p1.take();
//! assert!(p1.get().is_null());
//! assert_eq!(*p2, 42);
//! // Dropping p2 destroys the value; p1 drops as a no-op.
//! ```

#![warn(missing_docs)]

use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

// =============================================================================
// Deleter
// =============================================================================

/// Destroys the object an [`Own`] manages.
///
/// A deleter is held by value alongside the pointer and invoked exactly once
/// per owned object, on the final owner.
pub trait Deleter<T> {
    /// Destroys the object at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must point to a live object this deleter is compatible with,
    /// and the object must not be used after this call.
    unsafe fn delete(&mut self, ptr: NonNull<T>);
}

/// The default deleter: ordinary destruction plus heap free.
///
/// Only valid for objects allocated the way [`Own::new`] allocates them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoxDeleter;

impl<T> Deleter<T> for BoxDeleter {
    #[inline]
    unsafe fn delete(&mut self, ptr: NonNull<T>) {
        // Safety: per the trait contract the pointer came from Box::into_raw
        // (upheld by Own::new / Own::from_raw).
        drop(unsafe { Box::from_raw(ptr.as_ptr()) });
    }
}

/// Adapter making any `FnMut(NonNull<T>)` closure a [`Deleter`].
///
/// # Example
///
/// ```
/// use std::ptr::NonNull;
/// use vault_own::{FnDeleter, Own};
///
/// let raw = Box::into_raw(Box::new(7u32));
/// let ptr = NonNull::new(raw).unwrap();
///
/// let deleter = FnDeleter(|p: NonNull<u32>| {
///     drop(unsafe { Box::from_raw(p.as_ptr()) });
/// });
/// let owner = unsafe { Own::from_raw_with(ptr, deleter) };
/// assert_eq!(*owner, 7);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct FnDeleter<F>(
    /// The closure invoked to destroy the managed object.
    pub F,
);

impl<T, F: FnMut(NonNull<T>)> Deleter<T> for FnDeleter<F> {
    #[inline]
    unsafe fn delete(&mut self, ptr: NonNull<T>) {
        (self.0)(ptr)
    }
}

// =============================================================================
// Own
// =============================================================================

/// Exclusive owner of one heap object.
///
/// At most one live owner exists per object. Moving an `Own` transfers
/// responsibility for destruction; assigning over an `Own` that currently
/// manages an object destroys that object first (ordinary drop-on-assign).
/// An empty owner drops as a no-op.
pub struct Own<T, D: Deleter<T> = BoxDeleter> {
    ptr: Option<NonNull<T>>,
    deleter: D,
    _marker: PhantomData<T>,
}

impl<T> Own<T> {
    /// Allocates `value` on the heap and takes ownership of it.
    ///
    /// This factory is the only place allocation and ownership transfer
    /// happen in one step.
    pub fn new(value: T) -> Self {
        // Safety: the box's allocation matches BoxDeleter.
        let ptr = NonNull::new(Box::into_raw(Box::new(value)));
        Self {
            ptr,
            deleter: BoxDeleter,
            _marker: PhantomData,
        }
    }

    /// Takes ownership of a heap object allocated like [`Own::new`]
    /// allocates.
    ///
    /// # Safety
    ///
    /// `ptr` must have come from `Box::into_raw` (or equivalent) for exactly
    /// `T`, and nothing else may own or free it afterwards.
    pub unsafe fn from_raw(ptr: NonNull<T>) -> Self {
        Self {
            ptr: Some(ptr),
            deleter: BoxDeleter,
            _marker: PhantomData,
        }
    }
}

impl<T, D: Deleter<T>> Own<T, D> {
    /// Creates an owner managing nothing.
    pub fn empty() -> Self
    where
        D: Default,
    {
        Self {
            ptr: None,
            deleter: D::default(),
            _marker: PhantomData,
        }
    }

    /// Takes ownership of `ptr`, to be destroyed with `deleter`.
    ///
    /// # Safety
    ///
    /// `ptr` must point to a live object that `deleter` can destroy, and
    /// nothing else may own or free it afterwards.
    pub unsafe fn from_raw_with(ptr: NonNull<T>, deleter: D) -> Self {
        Self {
            ptr: Some(ptr),
            deleter,
            _marker: PhantomData,
        }
    }

    /// Returns the managed pointer without transferring ownership.
    ///
    /// Null when no object is managed.
    #[inline]
    pub fn get(&self) -> *mut T {
        match self.ptr {
            Some(ptr) => ptr.as_ptr(),
            None => std::ptr::null_mut(),
        }
    }

    /// Returns `true` if no object is managed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ptr.is_none()
    }

    /// Returns a shared reference to the managed object, if any.
    #[inline]
    pub fn as_ref(&self) -> Option<&T> {
        // Safety: exclusive ownership keeps the object live while self is.
        self.ptr.map(|ptr| unsafe { &*ptr.as_ptr() })
    }

    /// Returns a mutable reference to the managed object, if any.
    #[inline]
    pub fn as_mut(&mut self) -> Option<&mut T> {
        // Safety: exclusive ownership, and &mut self forbids aliasing.
        self.ptr.map(|ptr| unsafe { &mut *ptr.as_ptr() })
    }

    /// Relinquishes ownership without invoking the deleter.
    ///
    /// The caller becomes responsible for destroying the object. Returns
    /// `None` if nothing was managed; the owner is empty afterwards either
    /// way.
    #[inline]
    pub fn release(&mut self) -> Option<NonNull<T>> {
        self.ptr.take()
    }

    /// Destroys the managed object, if any, leaving the owner empty.
    pub fn reset(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            // Safety: ptr was managed, so the deleter contract holds.
            unsafe { self.deleter.delete(ptr) };
        }
    }

    /// Destroys the managed object, if any, then begins managing `ptr`.
    ///
    /// # Safety
    ///
    /// Same contract as [`from_raw_with`](Self::from_raw_with) for `ptr`.
    pub unsafe fn reset_raw(&mut self, ptr: NonNull<T>) {
        self.reset();
        self.ptr = Some(ptr);
    }

    /// Transfers ownership out of this place.
    ///
    /// The deleter moves with the object; this owner is left empty with a
    /// default deleter and reports a null [`get`](Self::get), the
    /// observable moved-from state.
    pub fn take(&mut self) -> Own<T, D>
    where
        D: Default,
    {
        Own {
            ptr: self.ptr.take(),
            deleter: mem::take(&mut self.deleter),
            _marker: PhantomData,
        }
    }
}

impl<T, D: Deleter<T>> Drop for Own<T, D> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T, D: Deleter<T> + Default> Default for Own<T, D> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T, D: Deleter<T>> Deref for Own<T, D> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        self.as_ref().expect("no managed object")
    }
}

impl<T, D: Deleter<T>> DerefMut for Own<T, D> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        self.as_mut().expect("no managed object")
    }
}

impl<T, D: Deleter<T>> fmt::Debug for Own<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Own").field(&self.ptr).finish()
    }
}

// Safety: Own is the sole owner of the object; sending the owner sends the
// object and its deleter with it.
unsafe impl<T: Send, D: Deleter<T> + Send> Send for Own<T, D> {}
unsafe impl<T: Sync, D: Deleter<T> + Sync> Sync for Own<T, D> {}
