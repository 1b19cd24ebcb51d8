// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
use std::{io, path::PathBuf};

/// A list specifying the general categories of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	/// The platform loader rejected the module.
	Load,
	/// The loaded module does not export the requested symbol.
	SymbolNotFound,
	/// The platform failed to release a module. Only ever logged.
	Unload,
	/// A symbol was requested while no module was loaded.
	NotLoaded,
	/// The symbol name was empty or contained a nul byte.
	InvalidName,
	/// Staging a module into a scratch directory failed.
	Io,
}

/// Errors produced while loading modules and resolving their symbols.
///
/// Every variant carries the diagnostic text captured at the moment of
/// failure, so nothing depends on the loader's global error state afterwards.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	#[error("failed to load library `{}`: {message}", .path.display())]
	Load { path: PathBuf, message: String },
	#[error("symbol `{name}` not found in `{}`: {message}", .path.display())]
	SymbolNotFound {
		name: String,
		path: PathBuf,
		message: String,
	},
	#[error("failed to unload library `{}`: {source}", .path.display())]
	Unload { path: PathBuf, source: io::Error },
	#[error("cannot resolve `{name}`: no library is loaded")]
	NotLoaded { name: String },
	#[error("invalid symbol name {name:?}")]
	InvalidName { name: String },
	#[error("failed to stage `{}` into a scratch directory: {source}", .path.display())]
	Io { path: PathBuf, source: io::Error },
}

impl Error {
	#[inline]
	pub const fn kind(&self) -> ErrorKind {
		match self {
			Self::Load { .. } => ErrorKind::Load,
			Self::SymbolNotFound { .. } => ErrorKind::SymbolNotFound,
			Self::Unload { .. } => ErrorKind::Unload,
			Self::NotLoaded { .. } => ErrorKind::NotLoaded,
			Self::InvalidName { .. } => ErrorKind::InvalidName,
			Self::Io { .. } => ErrorKind::Io,
		}
	}
}
