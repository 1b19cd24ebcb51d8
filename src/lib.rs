// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
//! Owned handles to shared libraries.
//!
//! A [`SharedLibrary`] holds at most one loaded module, resolves symbols from it by name, and
//! releases it when dropped. It can also own a scratch directory holding the library file,
//! which is removed after the module is unloaded.
//!
//! The platform loader sits behind the [`Loader`] trait; [`System`] selects
//! `dlopen`/`dlsym`/`dlclose` on unix and `LoadLibraryExW`/`GetProcAddress`/`FreeLibrary` on
//! windows at compile time.
//!
//! Events are reported through [`tracing`]; this crate never installs a subscriber.

// lets `symbol_table` expansions name `::shlib` from inside this crate
extern crate self as shlib;

pub mod error;
pub mod load;
mod library;
mod os;
mod scratch;
mod sym;
#[cfg(test)]
mod testing;

pub use error::{Error, ErrorKind};
pub use library::SharedLibrary;
pub use load::{Loader, System};
pub use sym::Symbol;

/// Generates a typed table of function pointers resolved from a [`SharedLibrary`].
///
/// # Examples
///
/// ```no_run
/// use shlib::{symbol_table, SharedLibrary};
/// use std::ffi::c_int;
///
/// #[symbol_table(name = Adder)]
/// extern "C" {
/// 	fn add(a: c_int, b: c_int) -> c_int;
/// 	#[link_name = "adder_only"]
/// 	fn answer() -> c_int;
/// }
///
/// let lib = unsafe { SharedLibrary::new("libadder.so") }?;
/// let adder = Adder::load(&lib)?;
/// assert_eq!(unsafe { adder.add(2, 3) }, 5);
/// # Ok::<(), shlib::Error>(())
/// ```
pub use shlib_macro::symbol_table;

/// The result of a shlib function
pub type Result<T> = std::result::Result<T, error::Error>;
