//! Log store implementations.
//!
//! - [`MemoryLog`] keeps rows in memory as `(column, value)` pairs. It is
//!   what tests and in-process consumers inspect.
//! - [`DelimitedLog`] writes rows as CSV or TSV text to any writer that can
//!   also be erased ([`Erase`]): files, byte vectors, or stdout.

use std::fs::File;
use std::io::{self, BufWriter, Seek, Write};
use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::export::LogSink;

/// Column a log store adds on its own while auto timestamping is enabled.
pub const AUTO_TIMESTAMP_COLUMN: &str = "timestamp (ms)";

/// One row as `(column, value)` pairs in the order they were logged.
pub type LogRow = Vec<(String, String)>;

fn protocol_error(message: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message)
}

/// Tracks the row currently being assembled between `begin_row` and
/// `end_row`.
#[derive(Debug, Clone, Default)]
struct OpenRow(Option<LogRow>);

impl OpenRow {
    fn begin(&mut self) -> io::Result<()> {
        if self.0.is_some() {
            return Err(protocol_error("begin_row called while a row is open"));
        }
        self.0 = Some(Vec::new());
        Ok(())
    }

    fn push(&mut self, column: &str, value: &str) -> io::Result<()> {
        let row = self
            .0
            .as_mut()
            .ok_or_else(|| protocol_error("log_data called outside a row"))?;

        // A repeated column within one row overwrites the earlier cell.
        match row.iter_mut().find(|(name, _)| name == column) {
            Some((_, existing)) => value.clone_into(existing),
            None => row.push((column.to_string(), value.to_string())),
        }
        Ok(())
    }

    fn finish(&mut self) -> io::Result<LogRow> {
        self.0
            .take()
            .ok_or_else(|| protocol_error("end_row called outside a row"))
    }

    fn reset(&mut self) {
        self.0 = None;
    }
}

/// In-memory log store.
#[derive(Debug, Clone)]
pub struct MemoryLog {
    rows: Vec<LogRow>,
    open: OpenRow,
    auto_timestamp: bool,
    clear_count: usize,
}

impl MemoryLog {
    /// Creates an empty log with auto timestamping enabled.
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            open: OpenRow::default(),
            auto_timestamp: true,
            clear_count: 0,
        }
    }

    /// Every committed row, header rows included.
    pub fn rows(&self) -> &[LogRow] {
        &self.rows
    }

    /// Committed rows that carry at least one non-empty value.
    pub fn data_rows(&self) -> Vec<&LogRow> {
        self.rows
            .iter()
            .filter(|row| row.iter().any(|(_, value)| !value.is_empty()))
            .collect()
    }

    /// Values of `column` across the data rows, `""` where a row lacks it.
    pub fn column(&self, column: &str) -> Vec<&str> {
        self.data_rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .find(|(name, _)| name == column)
                    .map_or("", |(_, value)| value.as_str())
            })
            .collect()
    }

    /// Whether the store would add its own timestamp column.
    pub fn auto_timestamp(&self) -> bool {
        self.auto_timestamp
    }

    /// Number of times the log has been cleared.
    pub fn clear_count(&self) -> usize {
        self.clear_count
    }
}

impl Default for MemoryLog {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for MemoryLog {
    fn clear(&mut self, full_reset: bool) -> io::Result<()> {
        self.rows.clear();
        self.open.reset();
        if full_reset {
            self.auto_timestamp = true;
        }
        self.clear_count += 1;
        Ok(())
    }

    fn disable_auto_timestamp(&mut self) -> io::Result<()> {
        self.auto_timestamp = false;
        Ok(())
    }

    fn begin_row(&mut self) -> io::Result<()> {
        self.open.begin()
    }

    fn log_data(&mut self, column: &str, value: &str) -> io::Result<()> {
        self.open.push(column, value)
    }

    fn end_row(&mut self) -> io::Result<()> {
        let row = self.open.finish()?;
        self.rows.push(row);
        Ok(())
    }
}

/// A writer whose content can be discarded.
pub trait Erase {
    /// Discards everything written so far.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the content cannot be discarded.
    fn erase(&mut self) -> io::Result<()>;
}

impl Erase for Vec<u8> {
    fn erase(&mut self) -> io::Result<()> {
        self.clear();
        Ok(())
    }
}

impl Erase for File {
    fn erase(&mut self) -> io::Result<()> {
        self.set_len(0)?;
        self.rewind()
    }
}

/// A terminal stream cannot take back what it printed; erasing is a no-op.
impl Erase for io::Stdout {
    fn erase(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<W: Write + Erase> Erase for BufWriter<W> {
    fn erase(&mut self) -> io::Result<()> {
        self.flush()?;
        self.get_mut().erase()
    }
}

/// Text layout of a [`DelimitedLog`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextFormat {
    /// Comma-separated, RFC 4180 quoting.
    #[default]
    Csv,
    /// Tab-separated; tabs and newlines inside cells become spaces.
    Tsv,
}

impl TextFormat {
    fn delimiter(self) -> char {
        match self {
            Self::Csv => ',',
            Self::Tsv => '\t',
        }
    }

    fn write_cell(self, out: &mut String, cell: &str) {
        match self {
            Self::Csv => {
                if cell.contains([',', '"', '\n', '\r']) {
                    out.push('"');
                    out.push_str(&cell.replace('"', "\"\""));
                    out.push('"');
                } else {
                    out.push_str(cell);
                }
            }
            Self::Tsv => out.extend(cell.chars().map(|c| match c {
                '\t' | '\n' | '\r' => ' ',
                other => other,
            })),
        }
    }
}

/// Log store that writes delimited text.
///
/// The column layout is learned from the cells logged. A header line is
/// written before the first data line and again whenever a new column
/// appears. Rows whose cells are all empty only declare columns and produce
/// no data line.
#[derive(Debug)]
pub struct DelimitedLog<W: Write + Erase> {
    writer: W,
    format: TextFormat,
    headers: Vec<String>,
    headers_dirty: bool,
    open: OpenRow,
    auto_timestamp: bool,
    origin: Instant,
    line: String,
}

impl DelimitedLog<BufWriter<File>> {
    /// Creates (or truncates) a file and logs to it.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P, format: TextFormat) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file), format))
    }
}

impl<W: Write + Erase> DelimitedLog<W> {
    /// Wraps `writer`. Auto timestamping starts enabled.
    pub fn new(writer: W, format: TextFormat) -> Self {
        Self {
            writer,
            format,
            headers: Vec::new(),
            headers_dirty: false,
            open: OpenRow::default(),
            auto_timestamp: true,
            origin: Instant::now(),
            line: String::new(),
        }
    }

    /// Returns the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Consumes the log and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Columns learned so far, in output order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    fn learn_columns(&mut self, row: &LogRow) {
        for (column, _) in row {
            if !self.headers.iter().any(|header| header == column) {
                self.headers.push(column.clone());
                self.headers_dirty = true;
            }
        }
    }

    fn write_line<'a>(&mut self, cells: impl Iterator<Item = &'a str>) -> io::Result<()> {
        self.line.clear();
        for (i, cell) in cells.enumerate() {
            if i > 0 {
                self.line.push(self.format.delimiter());
            }
            self.format.write_cell(&mut self.line, cell);
        }
        self.line.push('\n');
        self.writer.write_all(self.line.as_bytes())
    }
}

impl<W: Write + Erase> LogSink for DelimitedLog<W> {
    fn clear(&mut self, full_reset: bool) -> io::Result<()> {
        self.writer.erase()?;
        self.open.reset();
        if full_reset {
            self.headers.clear();
            self.auto_timestamp = true;
        }
        self.headers_dirty = !self.headers.is_empty();
        Ok(())
    }

    fn disable_auto_timestamp(&mut self) -> io::Result<()> {
        self.auto_timestamp = false;
        Ok(())
    }

    fn begin_row(&mut self) -> io::Result<()> {
        self.open.begin()
    }

    fn log_data(&mut self, column: &str, value: &str) -> io::Result<()> {
        self.open.push(column, value)
    }

    fn end_row(&mut self) -> io::Result<()> {
        let mut row = self.open.finish()?;
        if self.auto_timestamp {
            let millis = self.origin.elapsed().as_millis().to_string();
            row.insert(0, (AUTO_TIMESTAMP_COLUMN.to_string(), millis));
        }

        self.learn_columns(&row);
        if row.iter().all(|(_, value)| value.is_empty()) {
            return Ok(());
        }

        if self.headers_dirty {
            let headers = std::mem::take(&mut self.headers);
            let written = self.write_line(headers.iter().map(String::as_str));
            self.headers = headers;
            written?;
            self.headers_dirty = false;
        }

        let cells: Vec<&str> = self
            .headers
            .iter()
            .map(|header| {
                row.iter()
                    .find(|(name, _)| name == header)
                    .map_or("", |(_, value)| value.as_str())
            })
            .collect();
        self.write_line(cells.into_iter())?;
        self.writer.flush()
    }
}
