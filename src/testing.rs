// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
use std::io;
use std::sync::{Arc, Mutex};

// Shared buffer the fmt subscriber writes formatted events into.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.0.lock().unwrap().extend_from_slice(buf);
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for Captured {
	type Writer = Captured;

	fn make_writer(&'a self) -> Self::Writer {
		self.clone()
	}
}

/// Runs `f` with a thread-local subscriber and returns every event at `level` or higher.
pub(crate) fn capture_logs<F: FnOnce()>(level: tracing::Level, f: F) -> String {
	let captured = Captured::default();
	let subscriber = tracing_subscriber::fmt()
		.with_writer(captured.clone())
		.with_ansi(false)
		.with_max_level(level)
		.finish();
	tracing::subscriber::with_default(subscriber, f);
	let bytes = captured.0.lock().unwrap().clone();
	String::from_utf8(bytes).unwrap()
}

#[inline]
pub(crate) fn capture_warnings<F: FnOnce()>(f: F) -> String {
	capture_logs(tracing::Level::WARN, f)
}
