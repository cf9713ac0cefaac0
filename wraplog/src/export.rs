//! Export of a ring store to a persistent log store.
//!
//! Rows only carry the gap since the row before them, so the absolute time
//! of a row is lost once its predecessors are evicted. Export therefore
//! reports elapsed time relative to the oldest resident row: that row is at
//! 0 ms and every later row adds its own delta.
//!
//! # Row Protocol
//!
//! ```text
//! clear(true)
//! disable_auto_timestamp()
//! begin_row  time(ms)=""  a=""  b=""  end_row     <- header, labels columns
//! begin_row  time(ms)="0"  a="2"  b="4"  end_row   <- oldest resident row
//! ...
//! begin_row  time(ms)="320"  a="34"  b="68"  end_row
//! ```
//!
//! # Example
//!
//! ```rust
//! use wraplog::export::export;
//! use wraplog::ring::RingStore;
//! use wraplog::sink::MemoryLog;
//! use wraplog::slab::SlotRing;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut ring = RingStore::new(SlotRing::new(6), 2)?;
//! ring.append(&[0, 1]);
//! ring.append(&[10, 2]);
//!
//! let mut log = MemoryLog::new();
//! let summary = export(&ring, &["x".to_string()], &mut log)?;
//! assert_eq!(summary.rows, 2);
//! assert_eq!(log.column("time(ms)"), vec!["0", "10"]);
//! # Ok(())
//! # }
//! ```

use std::io;

use crate::error::{ExportError, Result};
use crate::ring::{RingStore, RowIter, RowRef};
use crate::row::{decode_delta, decode_value};
use crate::schema::TIME_COLUMN;
use crate::slab::{SlotStorage, Storage};

/// Append-only persistent log organized as rows of named string cells.
///
/// A row is `begin_row`, one `log_data` per cell, then `end_row`.
pub trait LogSink {
    /// Erases existing content. `full_reset` also drops any column layout
    /// the store has learned.
    ///
    /// # Errors
    ///
    /// Returns the store's I/O error if it cannot be erased.
    fn clear(&mut self, full_reset: bool) -> io::Result<()>;

    /// Stops the store from adding its own timestamp column.
    ///
    /// # Errors
    ///
    /// Returns the store's I/O error if the setting cannot be applied.
    fn disable_auto_timestamp(&mut self) -> io::Result<()>;

    /// Opens a row.
    ///
    /// # Errors
    ///
    /// Returns the store's I/O error if the row cannot be started.
    fn begin_row(&mut self) -> io::Result<()>;

    /// Sets one cell of the open row.
    ///
    /// # Errors
    ///
    /// Returns the store's I/O error if the cell cannot be recorded.
    fn log_data(&mut self, column: &str, value: &str) -> io::Result<()>;

    /// Closes the open row.
    ///
    /// # Errors
    ///
    /// Returns the store's I/O error if the row cannot be committed.
    fn end_row(&mut self) -> io::Result<()>;
}

impl<L: LogSink + ?Sized> LogSink for &mut L {
    fn clear(&mut self, full_reset: bool) -> io::Result<()> {
        (**self).clear(full_reset)
    }

    fn disable_auto_timestamp(&mut self) -> io::Result<()> {
        (**self).disable_auto_timestamp()
    }

    fn begin_row(&mut self) -> io::Result<()> {
        (**self).begin_row()
    }

    fn log_data(&mut self, column: &str, value: &str) -> io::Result<()> {
        (**self).log_data(column, value)
    }

    fn end_row(&mut self) -> io::Result<()> {
        (**self).end_row()
    }
}

/// Outcome of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    /// Data rows written, excluding the header row.
    pub rows: usize,
    /// Elapsed time of the newest row, in milliseconds.
    pub span_ms: u64,
}

/// A resident row with its reconstructed elapsed time.
#[derive(Debug, Clone, Copy)]
pub struct ReplayRow<'a, S = Storage> {
    /// Milliseconds since the oldest resident row.
    pub elapsed_ms: u64,
    /// The stored row.
    pub row: RowRef<'a, S>,
}

impl<'a, S: SlotStorage> ReplayRow<'a, S> {
    /// Decoded column values in header order.
    pub fn values(&self) -> impl Iterator<Item = i64> + use<'a, S> {
        self.row.values().map(decode_value)
    }
}

/// Oldest-to-newest walk that prefix-sums the stored deltas.
#[derive(Debug, Clone)]
pub struct Replay<'a, S = Storage> {
    rows: RowIter<'a, S>,
    elapsed_ms: u64,
    started: bool,
}

impl<'a, S: SlotStorage> Replay<'a, S> {
    /// Starts a replay of `ring`.
    pub fn new(ring: &'a RingStore<S>) -> Self {
        Self {
            rows: ring.iter(),
            elapsed_ms: 0,
            started: false,
        }
    }
}

impl<'a, S: SlotStorage> Iterator for Replay<'a, S> {
    type Item = ReplayRow<'a, S>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;

        // The oldest row's delta points at a row that is gone.
        if self.started {
            self.elapsed_ms += decode_delta(row.delta_slot());
        } else {
            self.started = true;
        }

        Some(ReplayRow {
            elapsed_ms: self.elapsed_ms,
            row,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl<S: SlotStorage> ExactSizeIterator for Replay<'_, S> {}

fn sink_err(source: io::Error) -> ExportError {
    ExportError::Sink { source }
}

/// Writes every resident row of `ring` to `sink`, oldest first.
///
/// The sink is cleared, its own timestamping disabled, and a header row
/// naming the time column and `columns` is written before the data rows.
///
/// # Errors
///
/// Returns [`ExportError::Sink`] if the sink fails; rows already written
/// stay in the sink.
pub fn export<S, L>(ring: &RingStore<S>, columns: &[String], sink: &mut L) -> Result<ExportSummary>
where
    S: SlotStorage,
    L: LogSink + ?Sized,
{
    tracing::debug!(rows = ring.occupied_rows(), "exporting ring store");

    sink.clear(true).map_err(sink_err)?;
    sink.disable_auto_timestamp().map_err(sink_err)?;

    sink.begin_row().map_err(sink_err)?;
    sink.log_data(TIME_COLUMN, "").map_err(sink_err)?;
    for column in columns {
        sink.log_data(column, "").map_err(sink_err)?;
    }
    sink.end_row().map_err(sink_err)?;

    let mut summary = ExportSummary {
        rows: 0,
        span_ms: 0,
    };

    for replayed in Replay::new(ring) {
        sink.begin_row().map_err(sink_err)?;

        let elapsed = replayed.elapsed_ms.to_string();
        sink.log_data(TIME_COLUMN, &elapsed).map_err(sink_err)?;

        for (column, value) in columns.iter().zip(replayed.values()) {
            sink.log_data(column, &value.to_string()).map_err(sink_err)?;
        }

        sink.end_row().map_err(sink_err)?;

        summary.rows += 1;
        summary.span_ms = replayed.elapsed_ms;
    }

    tracing::debug!(rows = summary.rows, span_ms = summary.span_ms, "export complete");
    Ok(summary)
}
