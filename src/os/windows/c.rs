// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
#![allow(clippy::upper_case_acronyms)]
#![allow(non_snake_case)]

use std::ffi;
pub use std::os::windows::raw::HANDLE;

pub type HMODULE = *mut ffi::c_void;
pub type PCWSTR = *const u16;
pub type PCSTR = *const ffi::c_char;
pub type BOOL = i32;
pub type DWORD = u32;

extern "system" {
	pub fn LoadLibraryExW(lplibfilename: PCWSTR, hfile: HANDLE, dwflags: DWORD) -> HMODULE;
	pub fn GetProcAddress(handle: HMODULE, symbol: PCSTR) -> *const ffi::c_void;
	pub fn FreeLibrary(hlibmodule: HMODULE) -> BOOL;
}
