// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason

use std::ffi::{c_void, CStr};
use std::io;
use std::path::Path;
use std::ptr::NonNull;

use crate::os::{self, imp};

/// Used to specify the platform loader backing a [`SharedLibrary`](crate::SharedLibrary).
///
/// An implementor is the loaded module itself: `open` produces one, `close` consumes it.
/// `Loader` can also be used to make custom loaders.
///
/// # Safety
///
/// `symbol` must only return addresses that stay valid until `close` is called.
pub unsafe trait Loader: Sized {
	/// Attempts to open a shared library.
	///
	/// On failure the error carries the platform's diagnostic.
	unsafe fn open(path: &Path) -> io::Result<Self>;
	/// Retrieves the raw address of `name`.
	unsafe fn symbol(&self, name: &CStr) -> io::Result<NonNull<c_void>>;
	/// Releases the module.
	///
	/// # Errors
	/// May error depending on system call.
	unsafe fn close(self) -> io::Result<()>;
}

/// An object providing access to a shared library opened through the operating system.
///
/// Unix uses `dlopen`/`dlsym`/`dlclose`, windows uses `LoadLibraryExW`/`GetProcAddress`/`FreeLibrary`.
#[derive(Debug)]
pub struct System(os::Handle);

// internal type is opaque and managed by OS, so it's `Send` safe
unsafe impl Send for System {}

unsafe impl Loader for System {
	#[inline]
	unsafe fn open(path: &Path) -> io::Result<Self> {
		imp::dylib_open(path.as_os_str()).map(Self)
	}

	#[inline]
	unsafe fn symbol(&self, name: &CStr) -> io::Result<NonNull<c_void>> {
		imp::dylib_symbol(self.0, name)
	}

	/// Decrements reference counter to shared library. When reference counter hits zero the library is unloaded.
	#[inline]
	unsafe fn close(self) -> io::Result<()> {
		imp::dylib_close(self.0)
	}
}
