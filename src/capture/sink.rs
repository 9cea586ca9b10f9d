//! Destinations for rendered request records.
//!
//! # Design Decisions
//! - One record is handed over as one buffer and written in one call
//! - Sinks never fail the request; write errors end in the trace log

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Receives rendered records and record-level error lines.
pub trait LogSink: Send + Sync + 'static {
    /// Write one rendered record.
    fn write_record(&self, rendered: &[u8]);

    /// Report a record that could not be produced.
    fn write_error(&self, message: &str);
}

/// Frame a record with a leading and trailing newline.
pub fn frame(rendered: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(rendered.len() + 2);
    buf.push(b'\n');
    buf.extend_from_slice(rendered);
    buf.push(b'\n');
    buf
}

/// Writes records to standard output.
///
/// Each record is written under the stdout lock, so concurrent requests
/// never interleave bytes of different records.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl StdoutSink {
    fn write_locked(buf: &[u8]) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(buf)?;
        out.flush()
    }
}

impl LogSink for StdoutSink {
    fn write_record(&self, rendered: &[u8]) {
        if let Err(e) = Self::write_locked(&frame(rendered)) {
            tracing::warn!(error = %e, "Failed to write request record to stdout");
        }
    }

    fn write_error(&self, message: &str) {
        let line = format!("{}\n", message);
        if let Err(e) = Self::write_locked(line.as_bytes()) {
            tracing::warn!(error = %e, "Failed to write error line to stdout");
        }
    }
}

/// Keeps records in memory. Cloning shares the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<String>>>,
    errors: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered records written so far, oldest first.
    pub fn records(&self) -> Vec<String> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Records parsed back into JSON values.
    pub fn json_records(&self) -> Vec<serde_json::Value> {
        self.records()
            .iter()
            .filter_map(|r| serde_json::from_str(r).ok())
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl LogSink for MemorySink {
    fn write_record(&self, rendered: &[u8]) {
        if let Ok(mut records) = self.records.lock() {
            records.push(String::from_utf8_lossy(rendered).into_owned());
        }
    }

    fn write_error(&self, message: &str) {
        if let Ok(mut errors) = self.errors.lock() {
            errors.push(message.to_string());
        }
    }
}
