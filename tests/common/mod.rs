#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub const ADDER: &str = env!("SHLIB_FIXTURE_ADDER");
pub const MULTIPLIER: &str = env!("SHLIB_FIXTURE_MULTIPLIER");

/// Routes `tracing` output through the test harness; filter with `RUST_LOG`.
pub fn init_logging() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_test_writer()
		.try_init();
}

/// Copies a fixture into `dir`, keeping its file name.
pub fn copy_fixture(fixture: &str, dir: &Path) -> PathBuf {
	let fixture = Path::new(fixture);
	let dest = dir.join(fixture.file_name().unwrap());
	std::fs::copy(fixture, &dest).unwrap();
	dest
}
