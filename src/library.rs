// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason

use std::ffi::CString;
use std::marker::PhantomData;
use std::mem;
use std::path::{Path, PathBuf};

use crate::load::{Loader, System};
use crate::{scratch, Error, Result, Symbol};

// Rejects pointer casts to anything that is not pointer sized.
struct AssertPtrSized<F>(PhantomData<F>);
impl<F> AssertPtrSized<F> {
	const OK: () = assert!(
		mem::size_of::<F>() == mem::size_of::<*const ()>(),
		"symbols can only be reinterpreted as pointer sized types"
	);
}

/// An owned handle to a shared library loaded into this process.
///
/// At most one module is held at a time. When the `SharedLibrary` is dropped the module is
/// unloaded first, then the cleanup directory (if any) is removed along with everything in it.
///
/// # Examples
///
/// ```no_run
/// use shlib::SharedLibrary;
/// use std::ffi::c_int;
///
/// let lib = unsafe { SharedLibrary::new("libadder.so") }?;
/// let add: unsafe extern "C" fn(c_int, c_int) -> c_int = unsafe { lib.get("add") }?;
/// assert_eq!(unsafe { add(2, 3) }, 5);
/// # Ok::<(), shlib::Error>(())
/// ```
#[derive(Debug)]
pub struct SharedLibrary<L: Loader = System> {
	path: PathBuf,
	// library handle
	hlib: Option<L>,
	cleanup_dir: Option<PathBuf>,
}

impl SharedLibrary {
	/// Loads the shared library at `path`.
	///
	/// # Safety
	///
	/// Loading a library runs its initialization routines, and unloading it runs its
	/// termination routines. Both are arbitrary foreign code.
	///
	/// # Errors
	///
	/// Returns [`Error::Load`] with the loader's diagnostic if the module cannot be loaded.
	#[inline]
	pub unsafe fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
		Self::open(path, None)
	}

	/// Loads the shared library at `path`, and removes `cleanup_dir` recursively once the
	/// returned handle is dropped.
	///
	/// If loading fails, `cleanup_dir` is left untouched.
	///
	/// # Safety
	///
	/// See [`SharedLibrary::new`].
	#[inline]
	pub unsafe fn with_cleanup_dir<P, D>(path: P, cleanup_dir: D) -> Result<Self>
	where
		P: AsRef<Path>,
		D: Into<PathBuf>,
	{
		Self::open(path, Some(cleanup_dir.into()))
	}

	/// Copies the library at `path` into a fresh scratch directory and loads the copy.
	///
	/// The scratch directory becomes the cleanup directory. Each call loads an independent
	/// copy, so the original file may be rewritten while the copy stays loaded.
	///
	/// # Safety
	///
	/// See [`SharedLibrary::new`].
	///
	/// # Errors
	///
	/// Returns [`Error::Io`] if the copy cannot be made, or [`Error::Load`] naming `path` if the
	/// copy cannot be loaded. The scratch directory is removed in both cases.
	pub unsafe fn load_copy<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		let (staged, dir) = scratch::stage_copy(path)?;
		let hlib = match Self::open_raw(&staged) {
			Ok(hlib) => hlib,
			// the staged copy is deleted with `dir`, so report the caller's path
			Err(Error::Load { message, .. }) => {
				return Err(Error::Load {
					path: path.to_owned(),
					message: format!("{message} (loaded from copy `{}`)", staged.display()),
				})
			}
			Err(e) => return Err(e),
		};
		// ownership of the directory moves to the handle's teardown
		let dir = dir.keep();
		Ok(Self {
			path: staged,
			hlib: Some(hlib),
			cleanup_dir: Some(dir),
		})
	}
}

impl<L: Loader> SharedLibrary<L> {
	/// Loads the library at `path` through the loader `L`.
	///
	/// A failed load returns before the handle exists, so `cleanup_dir` is never removed
	/// on that path.
	///
	/// # Safety
	///
	/// See [`SharedLibrary::new`].
	pub unsafe fn open<P: AsRef<Path>>(path: P, cleanup_dir: Option<PathBuf>) -> Result<Self> {
		let path = path.as_ref();
		let hlib = Self::open_raw(path)?;
		Ok(Self {
			path: path.to_owned(),
			hlib: Some(hlib),
			cleanup_dir,
		})
	}

	unsafe fn open_raw(path: &Path) -> Result<L> {
		match L::open(path) {
			Ok(hlib) => {
				tracing::debug!(path = %path.display(), "loaded library");
				Ok(hlib)
			}
			Err(e) => Err(Error::Load {
				path: path.to_owned(),
				message: e.to_string(),
			}),
		}
	}

	/// Replaces the loaded module with the one at `path`.
	///
	/// The current module is unloaded first. On failure nothing is loaded afterwards
	/// and the stored path keeps its previous value.
	///
	/// # Safety
	///
	/// See [`SharedLibrary::new`]. Addresses previously copied out with
	/// [`get`](SharedLibrary::get) become dangling.
	pub unsafe fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
		self.unload();
		let path = path.as_ref();
		let hlib = Self::open_raw(path)?;
		self.hlib = Some(hlib);
		self.path = path.to_owned();
		Ok(())
	}

	/// Unloads the current module, if any.
	///
	/// A platform failure to release the module is logged as a warning and otherwise
	/// ignored; the handle is given up either way.
	pub fn unload(&mut self) {
		if let Some(hlib) = self.hlib.take() {
			match unsafe { hlib.close() } {
				Ok(()) => tracing::debug!(path = %self.path.display(), "unloaded library"),
				Err(source) => {
					let warning = Error::Unload {
						path: self.path.clone(),
						source,
					};
					tracing::warn!(path = %self.path.display(), error = %warning, "library unload failed");
				}
			}
		}
	}

	/// Resolves `name` in the loaded module.
	///
	/// # Errors
	///
	/// * [`Error::NotLoaded`] if no module is loaded.
	/// * [`Error::InvalidName`] if `name` is empty or contains a nul byte.
	/// * [`Error::SymbolNotFound`] if the module does not export `name`.
	pub fn symbol(&self, name: &str) -> Result<Symbol<'_>> {
		let Some(hlib) = self.hlib.as_ref() else {
			return Err(Error::NotLoaded {
				name: name.to_owned(),
			});
		};
		let c_name = match CString::new(name) {
			Ok(c_name) if !name.is_empty() => c_name,
			_ => {
				return Err(Error::InvalidName {
					name: name.to_owned(),
				})
			}
		};
		match unsafe { hlib.symbol(&c_name) } {
			Ok(addr) => {
				tracing::debug!(path = %self.path.display(), symbol = name, "resolved symbol");
				Ok(Symbol::new(addr))
			}
			Err(e) => Err(Error::SymbolNotFound {
				name: name.to_owned(),
				path: self.path.clone(),
				message: e.to_string(),
			}),
		}
	}

	/// Resolves `name` and reinterprets its address as `F`, typically a function pointer.
	///
	/// `F` must be pointer sized, which is checked at compile time.
	///
	/// # Safety
	///
	/// `F` must match the actual type of the symbol, and the returned value must not be
	/// used after the module is unloaded or replaced.
	///
	/// # Errors
	///
	/// See [`SharedLibrary::symbol`].
	pub unsafe fn get<F: Copy>(&self, name: &str) -> Result<F> {
		#[allow(clippy::let_unit_value)]
		let () = AssertPtrSized::<F>::OK;
		let addr = self.symbol(name)?.as_ptr();
		Ok(mem::transmute_copy::<*const std::ffi::c_void, F>(&addr))
	}

	/// The path of the most recently loaded module.
	#[inline]
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// The directory removed on drop, if any.
	#[inline]
	pub fn cleanup_dir(&self) -> Option<&Path> {
		self.cleanup_dir.as_deref()
	}

	/// Returns `true` if a module is currently loaded.
	#[inline]
	pub fn is_loaded(&self) -> bool {
		self.hlib.is_some()
	}
}

impl<L: Loader> Drop for SharedLibrary<L> {
	fn drop(&mut self) {
		self.unload();
		if let Some(dir) = self.cleanup_dir.take() {
			scratch::remove_dir(&dir);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::cell::RefCell;
	use std::ffi::{c_void, CStr};
	use std::io;
	use std::ptr::NonNull;

	thread_local! {
		static EVENTS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
	}

	fn record(event: String) {
		EVENTS.with(|events| events.borrow_mut().push(event));
	}

	fn take_events() -> Vec<String> {
		EVENTS.with(|events| mem::take(&mut *events.borrow_mut()))
	}

	static EXPORTED: u8 = 0;

	// Scripted loader: paths named `missing` fail to open, paths containing `pinned`
	// fail to close, and only `exported` resolves.
	#[derive(Debug)]
	struct Scripted(PathBuf);

	unsafe impl Loader for Scripted {
		unsafe fn open(path: &Path) -> io::Result<Self> {
			if path.ends_with("missing") {
				return Err(io::Error::new(io::ErrorKind::NotFound, "no such module"));
			}
			record(format!("open {}", path.display()));
			Ok(Self(path.to_owned()))
		}

		unsafe fn symbol(&self, name: &CStr) -> io::Result<NonNull<c_void>> {
			if name.to_bytes() == b"exported" {
				Ok(NonNull::from(&EXPORTED).cast())
			} else {
				Err(io::Error::new(io::ErrorKind::Other, "undefined symbol"))
			}
		}

		unsafe fn close(self) -> io::Result<()> {
			let dir_exists = match self.0.parent() {
				Some(dir) if !dir.as_os_str().is_empty() => dir.exists(),
				_ => true,
			};
			record(format!("close {} dir_exists={dir_exists}", self.0.display()));
			if self.0.to_string_lossy().contains("pinned") {
				Err(io::Error::new(io::ErrorKind::Other, "module is pinned"))
			} else {
				Ok(())
			}
		}
	}

	#[test]
	fn test_reload_closes_previous() {
		take_events();
		let mut lib = unsafe { SharedLibrary::<Scripted>::open("first", None) }.unwrap();
		unsafe { lib.load("second") }.unwrap();
		assert_eq!(lib.path(), Path::new("second"));
		assert_eq!(
			take_events(),
			["open first", "close first dir_exists=true", "open second"]
		);
		drop(lib);
		assert_eq!(take_events(), ["close second dir_exists=true"]);
	}

	#[test]
	fn test_failed_load_leaves_nothing_loaded() {
		take_events();
		let mut lib = unsafe { SharedLibrary::<Scripted>::open("first", None) }.unwrap();
		let err = unsafe { lib.load("missing") }.unwrap_err();
		assert_eq!(err.kind(), crate::ErrorKind::Load);
		assert!(err.to_string().contains("no such module"));
		assert!(!lib.is_loaded());
		assert_eq!(lib.path(), Path::new("first"));

		let err = lib.symbol("exported").unwrap_err();
		assert_eq!(err.kind(), crate::ErrorKind::NotLoaded);

		// already unloaded, both are no-ops
		lib.unload();
		drop(lib);
		assert_eq!(take_events(), ["open first", "close first dir_exists=true"]);
	}

	#[test]
	fn test_unload_failure_is_swallowed() {
		take_events();
		let mut lib = unsafe { SharedLibrary::<Scripted>::open("pinned", None) }.unwrap();
		let logs = crate::testing::capture_warnings(|| lib.unload());
		assert!(!lib.is_loaded());
		assert!(logs.contains("WARN"), "{logs}");
		assert!(logs.contains("library unload failed"), "{logs}");
		assert!(logs.contains("path=pinned"), "{logs}");
		assert!(logs.contains("module is pinned"), "{logs}");

		// nothing left to release, so nothing more is reported
		let logs = crate::testing::capture_warnings(|| lib.unload());
		assert!(logs.is_empty(), "{logs}");
		assert_eq!(take_events(), ["open pinned", "close pinned dir_exists=true"]);
	}

	#[test]
	fn test_clean_unload_is_quiet() {
		let lib = unsafe { SharedLibrary::<Scripted>::open("first", None) }.unwrap();
		let logs = crate::testing::capture_warnings(|| drop(lib));
		assert!(logs.is_empty(), "{logs}");
	}

	// a regular file cannot be removed as a directory tree
	#[cfg(unix)]
	#[test]
	fn test_cleanup_failure_is_logged() {
		let parent = tempfile::tempdir().unwrap();
		let not_a_dir = parent.path().join("scratch");
		std::fs::write(&not_a_dir, b"plain file").unwrap();

		let lib =
			unsafe { SharedLibrary::<Scripted>::open("first", Some(not_a_dir.clone())) }.unwrap();
		let logs = crate::testing::capture_warnings(|| drop(lib));
		assert!(logs.contains("WARN"), "{logs}");
		assert!(logs.contains("failed to remove cleanup directory"), "{logs}");
		assert!(logs.contains(&*not_a_dir.to_string_lossy()), "{logs}");
		assert!(not_a_dir.exists());
	}

	#[test]
	fn test_teardown_unloads_before_removing_dir() {
		take_events();
		let parent = tempfile::tempdir().unwrap();
		let dir = parent.path().join("scratch");
		std::fs::create_dir(&dir).unwrap();
		let module = dir.join("pinned.so");

		let lib = unsafe { SharedLibrary::<Scripted>::open(&module, Some(dir.clone())) }.unwrap();
		assert_eq!(lib.cleanup_dir(), Some(dir.as_path()));
		drop(lib);

		let events = take_events();
		assert_eq!(events.len(), 2);
		assert!(events[1].ends_with("dir_exists=true"));
		assert!(!dir.exists());
	}

	#[test]
	fn test_failed_open_keeps_cleanup_dir() {
		let parent = tempfile::tempdir().unwrap();
		let err = unsafe {
			SharedLibrary::<Scripted>::open("missing", Some(parent.path().to_owned()))
		}
		.unwrap_err();
		assert_eq!(err.kind(), crate::ErrorKind::Load);
		assert!(parent.path().exists());
	}

	#[test]
	fn test_symbol_lookup() {
		let lib = unsafe { SharedLibrary::<Scripted>::open("first", None) }.unwrap();
		let a = lib.symbol("exported").unwrap();
		let b = lib.symbol("exported").unwrap();
		assert_eq!(a, b);
		assert_eq!(a.as_ptr(), (&EXPORTED as *const u8).cast::<c_void>());

		let byte: *const u8 = unsafe { lib.get("exported") }.unwrap();
		assert_eq!(unsafe { *byte }, 0);

		match lib.symbol("subtract") {
			Err(Error::SymbolNotFound { name, path, .. }) => {
				assert_eq!(name, "subtract");
				assert_eq!(path, Path::new("first"));
			}
			other => panic!("unexpected result: {other:?}"),
		}
	}

	#[test]
	fn test_resolution_logged_at_debug() {
		let lib = unsafe { SharedLibrary::<Scripted>::open("first", None) }.unwrap();
		let logs = crate::testing::capture_logs(tracing::Level::DEBUG, || {
			lib.symbol("exported").unwrap();
		});
		let line = logs.lines().find(|line| line.contains("resolved symbol")).unwrap_or_default();
		assert!(line.contains("DEBUG"), "{logs}");
		assert!(line.contains("symbol=\"exported\"") || line.contains("symbol=exported"), "{logs}");
	}

	#[test]
	fn test_invalid_names() {
		let lib = unsafe { SharedLibrary::<Scripted>::open("first", None) }.unwrap();
		assert_eq!(lib.symbol("").unwrap_err().kind(), crate::ErrorKind::InvalidName);
		assert_eq!(
			lib.symbol("ex\0ported").unwrap_err().kind(),
			crate::ErrorKind::InvalidName
		);
	}
}
