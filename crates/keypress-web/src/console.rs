#![forbid(unsafe_code)]

//! `tracing` output routed to the browser console.
//!
//! Each formatted event becomes one console call; the console method follows
//! the event level so failures show up as errors/warnings in devtools.

use keypress_core::TransportError;
use tracing::Level;

/// Browser console method used for a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsoleMethod {
    Error,
    Warn,
    Info,
    Debug,
}

impl ConsoleMethod {
    #[must_use]
    pub fn for_level(level: Level) -> Self {
        if level == Level::ERROR {
            Self::Error
        } else if level == Level::WARN {
            Self::Warn
        } else if level == Level::INFO {
            Self::Info
        } else {
            Self::Debug
        }
    }
}

/// Decode one buffered line, dropping the trailing newline the formatter adds.
#[must_use]
pub fn line_from_bytes(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.trim_end_matches(['\n', '\r']).to_string()
}

/// Message passed to `console.error("Error:", ...)` for a failed request.
#[must_use]
pub fn failure_message(path: &str, err: &TransportError) -> String {
    format!("keypress request to {path} failed: {err}")
}

#[cfg(target_arch = "wasm32")]
pub(crate) use sink::init;

#[cfg(target_arch = "wasm32")]
mod sink {
    use std::io;

    use tracing::{Level, Metadata};
    use tracing_subscriber::fmt::MakeWriter;
    use wasm_bindgen::JsValue;

    use super::{ConsoleMethod, line_from_bytes};

    pub(crate) struct ConsoleWriter {
        method: ConsoleMethod,
        buf: Vec<u8>,
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
            if self.buf.is_empty() {
                return;
            }
            let line = JsValue::from_str(&line_from_bytes(&self.buf));
            match self.method {
                ConsoleMethod::Error => web_sys::console::error_1(&line),
                ConsoleMethod::Warn => web_sys::console::warn_1(&line),
                ConsoleMethod::Info => web_sys::console::info_1(&line),
                ConsoleMethod::Debug => web_sys::console::debug_1(&line),
            }
        }
    }

    pub(crate) struct ConsoleMakeWriter;

    impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
        type Writer = ConsoleWriter;

        fn make_writer(&'a self) -> Self::Writer {
            ConsoleWriter {
                method: ConsoleMethod::Info,
                buf: Vec::new(),
            }
        }

        fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
            ConsoleWriter {
                method: ConsoleMethod::for_level(*meta.level()),
                buf: Vec::new(),
            }
        }
    }

    /// Install the console subscriber. A second call keeps the first one.
    pub(crate) fn init(max_level: Level) {
        let _ = tracing_subscriber::fmt()
            .with_writer(ConsoleMakeWriter)
            .with_max_level(max_level)
            .with_ansi(false)
            .without_time()
            .with_target(false)
            .try_init();
    }
}
