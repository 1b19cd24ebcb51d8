// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
use std::{ffi, marker, ptr};

/// The address of a symbol resolved from a [`SharedLibrary`](crate::SharedLibrary).
///
/// The borrow keeps the library from being unloaded or reloaded while the address is in use.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[repr(transparent)]
pub struct Symbol<'a>(ptr::NonNull<ffi::c_void>, marker::PhantomData<&'a ()>);

impl<'a> Symbol<'a> {
	#[inline]
	pub(crate) const fn new(addr: ptr::NonNull<ffi::c_void>) -> Self {
		Self(addr, marker::PhantomData)
	}
	/// Returns the raw address. Never null.
	#[inline]
	pub const fn as_ptr(self) -> *const ffi::c_void {
		self.0.as_ptr().cast_const()
	}
	/// Casts to a pointer of another type.
	#[inline]
	pub const fn cast<T>(self) -> *mut T {
		self.0.as_ptr().cast()
	}
}
