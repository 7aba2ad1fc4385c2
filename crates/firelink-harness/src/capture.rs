#![forbid(unsafe_code)]

//! Capture `tracing` output for assertions.
//!
//! ```ignore
//! let capture = LogCapture::new();
//! capture.run(|| provider.activate())?;
//! assert!(capture.contains("identity source replaced"));
//! ```

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::Level;

/// Writer appending to a shared buffer.
#[derive(Clone, Default)]
struct BufferWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Formatted log lines collected while a closure runs.
#[derive(Clone, Default)]
pub struct LogCapture {
    writer: BufferWriter,
}

impl LogCapture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with a thread-local subscriber recording every event at
    /// `TRACE` and above.
    pub fn run<T>(&self, f: impl FnOnce() -> T) -> T {
        let writer = self.writer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::TRACE)
            .with_ansi(false)
            .with_target(true)
            .without_time()
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f)
    }

    /// Everything captured so far.
    #[must_use]
    pub fn output(&self) -> String {
        let buffer = self
            .writer
            .buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Captured lines, in emission order.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.output().lines().map(str::to_string).collect()
    }

    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.output().contains(needle)
    }

    /// Lines containing every one of `needles`.
    #[must_use]
    pub fn matching(&self, needles: &[&str]) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| needles.iter().all(|n| line.contains(n)))
            .collect()
    }
}
