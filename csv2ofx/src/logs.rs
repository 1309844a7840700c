//! Diagnostic sink for conversion runs.
//!
//! Diagnostics are human-readable lines: the startup parameter echo and the
//! statement summary. Nothing downstream parses them. Internal events go
//! through `tracing` instead.

use std::fmt;
use std::io::Write;

/// Append-only diagnostic sink over any writer (stderr in the CLI).
pub struct Diagnostics<W: Write> {
    sink: W,
}

impl<W: Write> Diagnostics<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    /// Write one line. Sink failures are ignored; diagnostics never abort a run.
    pub fn info(&mut self, msg: impl fmt::Display) {
        let _ = writeln!(self.sink, "{}", msg);
    }

    /// `label: value` parameter echo.
    pub fn echo(&mut self, label: &str, value: impl fmt::Display) {
        self.info(format_args!("{}: {}", label, value));
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}
