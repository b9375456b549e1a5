//! Report presentation
//!
//! Writers render a [`Report`] as tables or JSON; [`write_peer_file`] emits
//! the ready-to-paste peer list for peer runs.

mod json;
mod table;

pub use json::JsonWriter;
pub use table::TableWriter;

use crate::config::OutputFormat;
use crate::error::Result;
use crate::pipeline::Report;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Renders a finished report
pub trait OutputWriter {
    /// Write the report
    fn write_report(&mut self, report: &Report) -> Result<()>;

    /// Flush any buffered output
    fn finalize(&mut self) -> Result<()>;
}

/// Open stdout or a file for writing
fn open(path: Option<&Path>) -> Result<Box<dyn Write + Send>> {
    let out: Box<dyn Write + Send> = match path {
        Some(p) => Box::new(BufWriter::new(File::create(p)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    };
    Ok(out)
}

/// Create a writer for the given format
pub fn create_writer(format: OutputFormat, path: Option<&Path>) -> Result<Box<dyn OutputWriter>> {
    let out = open(path)?;
    let writer: Box<dyn OutputWriter> = match format {
        OutputFormat::Table => Box::new(TableWriter::new(out)),
        OutputFormat::Json => Box::new(JsonWriter::new(out)),
    };
    Ok(writer)
}

/// File name of the ready-to-paste peer list
pub fn peer_file_name(report: &Report) -> String {
    format!("{}-{}-filtered.txt", report.chain, report.resource)
}

/// Write the comma-joined peer string into `dir`; `None` for API runs
pub fn write_peer_file(report: &Report, dir: &Path) -> Result<Option<PathBuf>> {
    let Some(peers) = report.peer_string() else {
        return Ok(None);
    };

    let path = dir.join(peer_file_name(report));
    std::fs::write(&path, peers)?;
    tracing::info!("Wrote ready-to-paste peers to {}", path.display());
    Ok(Some(path))
}
