//! CSV output for sweep results.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use modedecomp_core::export::{rows_from_decomposition, write_csv_header, write_csv_row};
use modedecomp_core::mode::Direction;
use modedecomp_core::projection::Decomposition;

/// Streams coefficient rows to a CSV sink, one row per (mode, direction).
pub struct OutputWriter<W: Write = BufWriter<File>> {
    writer: W,
    directions: Vec<Direction>,
    rows_written: usize,
}

impl OutputWriter<BufWriter<File>> {
    /// Create the file (and its parent directory) and write the header.
    pub fn create(path: &Path, directions: &[Direction]) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        Self::from_writer(BufWriter::new(file), directions)
    }
}

impl<W: Write> OutputWriter<W> {
    pub fn from_writer(mut writer: W, directions: &[Direction]) -> io::Result<Self> {
        write_csv_header(&mut writer)?;
        Ok(Self {
            writer,
            directions: directions.to_vec(),
            rows_written: 0,
        })
    }

    pub fn write_decomposition(&mut self, decomposition: &Decomposition) -> io::Result<usize> {
        let rows = rows_from_decomposition(decomposition, &self.directions);
        for row in &rows {
            write_csv_row(row, &mut self.writer)?;
        }
        self.rows_written += rows.len();
        Ok(rows.len())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flush and hand back the sink.
    pub fn finalize(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}
