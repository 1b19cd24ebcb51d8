// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
use std::os::windows::ffi::OsStrExt;
use std::{ffi, io, ptr};

use super::Handle;

mod c;

fn to_wide(path: &ffi::OsStr) -> Vec<u16> {
	path.encode_wide().chain(std::iter::once(0u16)).collect()
}

#[inline]
pub(crate) unsafe fn dylib_open(path: &ffi::OsStr) -> io::Result<Handle> {
	let wide_str: Vec<u16> = to_wide(path);
	if wide_str[..wide_str.len() - 1].contains(&0) {
		return Err(io::Error::new(
			io::ErrorKind::InvalidInput,
			"path contains an interior nul",
		));
	}
	// windows dumps *all* error info into the thread's last error.
	ptr::NonNull::new(c::LoadLibraryExW(wide_str.as_ptr(), ptr::null_mut(), 0))
		.ok_or_else(io::Error::last_os_error)
}

#[inline]
pub(crate) unsafe fn dylib_close(lib_handle: Handle) -> io::Result<()> {
	if c::FreeLibrary(lib_handle.as_ptr()) == 0 {
		Err(io::Error::last_os_error())
	} else {
		Ok(())
	}
}

#[inline]
pub(crate) unsafe fn dylib_symbol(lib_handle: Handle, name: &ffi::CStr) -> io::Result<Handle> {
	ptr::NonNull::new(c::GetProcAddress(lib_handle.as_ptr(), name.as_ptr()).cast_mut())
		.ok_or_else(io::Error::last_os_error)
}
