// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
use std::{fs, io, path::Path, path::PathBuf};

use crate::{Error, Result};

/// Copies `path` into a fresh scratch directory.
///
/// Returns the copied file and the guard owning the directory. Dropping the guard
/// removes the directory, so a failed load never leaves it behind.
pub(crate) fn stage_copy(path: &Path) -> Result<(PathBuf, tempfile::TempDir)> {
	let io_err = |source| Error::Io {
		path: path.to_owned(),
		source,
	};
	let file_name = path.file_name().ok_or_else(|| {
		io_err(io::Error::new(
			io::ErrorKind::InvalidInput,
			"path does not name a file",
		))
	})?;
	let dir = tempfile::Builder::new()
		.prefix("shlib-")
		.tempdir()
		.map_err(io_err)?;
	let staged = dir.path().join(file_name);
	fs::copy(path, &staged).map_err(io_err)?;
	tracing::debug!(from = %path.display(), to = %staged.display(), "staged library copy");
	Ok((staged, dir))
}

/// Recursively removes a cleanup directory during teardown.
///
/// Failures are logged, never raised. A directory that is already gone counts as removed.
pub(crate) fn remove_dir(dir: &Path) {
	match fs::remove_dir_all(dir) {
		Ok(()) => tracing::debug!(dir = %dir.display(), "removed cleanup directory"),
		Err(e) if e.kind() == io::ErrorKind::NotFound => {
			tracing::debug!(dir = %dir.display(), "cleanup directory already removed")
		}
		Err(e) => tracing::warn!(dir = %dir.display(), error = %e, "failed to remove cleanup directory"),
	}
}
