//! Output formatting abstraction for text vs JSON rendering
//!
//! All subcommand output flows through [`OutputWriter`], which keeps
//! format-specific logic out of command handlers.

use std::fmt::Display;
use std::io::Write;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Writes command results to stdout in the selected format.
///
/// Handlers call `writer.render(&payload)` where `payload` implements both
/// `Serialize` (for JSON) and [`Render`] (for text).
pub struct OutputWriter {
    format: OutputFormat,
    sink: Sink,
}

enum Sink {
    Stdout,
    Buffer(Mutex<Vec<u8>>),
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            sink: Sink::Stdout,
        }
    }

    /// Writer that keeps everything in memory; read it back with [`contents`](Self::contents).
    pub fn buffered(format: OutputFormat) -> Self {
        Self {
            format,
            sink: Sink::Buffer(Mutex::new(Vec::new())),
        }
    }

    /// Everything written so far by a [`buffered`](Self::buffered) writer.
    /// Always empty for stdout.
    pub fn contents(&self) -> String {
        match &self.sink {
            Sink::Stdout => String::new(),
            Sink::Buffer(buffer) => {
                let buffer = buffer.lock().unwrap_or_else(PoisonError::into_inner);
                String::from_utf8_lossy(&buffer).into_owned()
            }
        }
    }

    /// Render a payload to the writer's sink (stdout unless buffered).
    pub fn render<T: Render + Serialize>(&self, payload: &T) -> Result<(), CliError> {
        match &self.sink {
            Sink::Stdout => {
                let stdout = std::io::stdout();
                let mut handle = stdout.lock();
                self.render_to(&mut handle, payload)
            }
            Sink::Buffer(buffer) => {
                let mut buffer = buffer.lock().unwrap_or_else(PoisonError::into_inner);
                self.render_to(&mut *buffer, payload)
            }
        }
    }

    /// Render a payload to an arbitrary writer.
    pub fn render_to<T: Render + Serialize>(
        &self,
        w: &mut dyn Write,
        payload: &T,
    ) -> Result<(), CliError> {
        match self.format {
            OutputFormat::Text => payload.render_text(w)?,
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *w, payload)?;
                writeln!(w)?;
            }
        }
        Ok(())
    }

    /// Print a progress line in text mode. JSON output stays a single document.
    pub fn note(&self, line: impl Display) -> Result<(), CliError> {
        if self.format != OutputFormat::Text {
            return Ok(());
        }
        match &self.sink {
            Sink::Stdout => {
                let mut out = std::io::stdout().lock();
                writeln!(out, "{line}")?;
                out.flush()?;
            }
            Sink::Buffer(buffer) => {
                let mut buffer = buffer.lock().unwrap_or_else(PoisonError::into_inner);
                writeln!(buffer, "{line}")?;
            }
        }
        Ok(())
    }
}

/// Human-readable text rendering.
///
/// Implemented by every CLI output payload alongside `serde::Serialize`.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}

/// Status line prefixes shared by the command renderers.
pub mod mark {
    pub const OK: &str = "✅";
    pub const FAIL: &str = "❌";
    pub const SKIP: &str = "⏭️ ";
    pub const WARN: &str = "⚠️ ";
    pub const INFO: &str = "🔹";
}
