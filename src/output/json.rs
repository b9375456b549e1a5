//! JSON output writer

use super::OutputWriter;
use crate::error::Result;
use crate::pipeline::Report;
use std::io::Write;

/// Writes the report as pretty-printed JSON
pub struct JsonWriter {
    out: Box<dyn Write + Send>,
}

impl JsonWriter {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self { out }
    }
}

impl OutputWriter for JsonWriter {
    fn write_report(&mut self, report: &Report) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.out, report)?;
        writeln!(self.out)?;
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
