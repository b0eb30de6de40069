use crate::pipeline::Payload;
use crate::CrawlError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes enriched records as JSON lines
pub struct JsonLinesWriter<W: Write> {
    writer: W,
    written: usize,
}

impl JsonLinesWriter<BufWriter<File>> {
    /// Creates (or truncates) the file at `path`
    pub fn create(path: &Path) -> Result<Self, CrawlError> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonLinesWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Appends one payload as a single line
    pub fn write_payload(&mut self, payload: &Payload) -> Result<(), CrawlError> {
        serde_json::to_writer(&mut self.writer, payload)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Lines written so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flushes and returns the underlying writer
    pub fn finish(mut self) -> Result<W, CrawlError> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}
