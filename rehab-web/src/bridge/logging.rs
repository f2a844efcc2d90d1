//! Browser console backend for `tracing`
//!
//! The engine logs through `tracing` only. In the browser, the start hook
//! installs a fmt subscriber whose writer forwards each formatted event to
//! the matching `console.*` method.

use std::io;

use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;
use wasm_bindgen::JsValue;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsoleLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl ConsoleLevel {
    pub fn for_level(level: &Level) -> Self {
        if *level == Level::ERROR {
            ConsoleLevel::Error
        } else if *level == Level::WARN {
            ConsoleLevel::Warn
        } else if *level == Level::INFO {
            ConsoleLevel::Info
        } else {
            ConsoleLevel::Debug
        }
    }
}

/// Buffers one formatted event; emits it to the console when dropped
pub struct ConsoleWriter {
    level: ConsoleLevel,
    buf: Vec<u8>,
}

impl ConsoleWriter {
    fn new(level: ConsoleLevel) -> Self {
        Self { level, buf: Vec::new() }
    }

    /// Buffered text without the trailing newline, `None` if nothing was written
    fn take_line(&mut self) -> Option<String> {
        let line = String::from_utf8_lossy(&self.buf).trim_end().to_string();
        self.buf.clear();
        (!line.is_empty()).then_some(line)
    }
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let Some(line) = self.take_line() else {
            return;
        };
        let message = JsValue::from_str(&line);
        match self.level {
            ConsoleLevel::Error => web_sys::console::error_1(&message),
            ConsoleLevel::Warn => web_sys::console::warn_1(&message),
            ConsoleLevel::Info => web_sys::console::info_1(&message),
            ConsoleLevel::Debug => web_sys::console::debug_1(&message),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> ConsoleWriter {
        ConsoleWriter::new(ConsoleLevel::Info)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> ConsoleWriter {
        ConsoleWriter::new(ConsoleLevel::for_level(meta.level()))
    }
}

/// Route engine `tracing` events to the browser console.
/// Debug builds include rep-level debug events.
pub fn install_console_logging() {
    let max_level = if cfg!(debug_assertions) { Level::DEBUG } else { Level::INFO };
    let subscriber = tracing_subscriber::fmt()
        .with_writer(ConsoleMakeWriter)
        .with_max_level(max_level)
        .without_time()
        .with_ansi(false)
        .with_target(false)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        web_sys::console::warn_1(&"tracing subscriber already installed".into());
    }
}
