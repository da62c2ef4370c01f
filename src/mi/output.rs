//! Shared record writer.
//!
//! Command loop and event translator write into the same stream, each record (with its prompt)
//! is written and flushed under a single lock so lines never interleave.

use crate::mi::record::{AsyncKind, AsyncRecord, Record, ResultRecord, StreamKind, StreamRecord};
use crate::mi_debug;
use std::io::Write;
use std::sync::{Mutex, MutexGuard};

pub struct MiOutput {
    sink: Mutex<Box<dyn Write + Send>>,
    prompt: bool,
}

impl MiOutput {
    /// Create writer.
    ///
    /// # Arguments
    ///
    /// * `sink`: record destination, stdout usually
    /// * `prompt`: write `(gdb)` after result records and `*stopped` records
    pub fn new(sink: Box<dyn Write + Send>, prompt: bool) -> Self {
        Self {
            sink: Mutex::new(sink),
            prompt,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn Write + Send>> {
        self.sink.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn write_records(&self, record: Record, with_prompt: bool) -> std::io::Result<()> {
        let mut sink = self.lock();
        mi_debug!(target: "mi", "-> {record}");
        writeln!(sink, "{record}")?;
        if with_prompt && self.prompt {
            writeln!(sink, "{}", Record::Prompt)?;
        }
        sink.flush()
    }

    pub fn write_result(&self, record: ResultRecord) -> std::io::Result<()> {
        self.write_records(record.into(), true)
    }

    pub fn write_async(&self, record: AsyncRecord) -> std::io::Result<()> {
        let with_prompt = record.kind == AsyncKind::Stopped;
        self.write_records(record.into(), with_prompt)
    }

    /// Write console stream record.
    pub fn write_console(&self, text: impl Into<String>) -> std::io::Result<()> {
        let record = StreamRecord {
            kind: StreamKind::Console,
            text: text.into(),
        };
        self.write_records(record.into(), false)
    }
}
