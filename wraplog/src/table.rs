//! The table facade an embedded program holds.
//!
//! A [`Table`] ties the pieces together:
//! - validates a [`TableConfig`] and allocates the ring store exactly once
//! - turns each `log_data` call into one delta-encoded row
//! - exposes capacity and occupancy for introspection
//! - drains the ring into a [`LogSink`] on `save_buffer`
//!
//! # Example
//!
//! ```rust
//! use wraplog::clock::ManualClock;
//! use wraplog::sink::MemoryLog;
//! use wraplog::{Sample, Table, TableConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let clock = ManualClock::new(1_000);
//! let mut table = Table::with_clock(TableConfig::new(["temp", "light"]), clock.clone())?;
//!
//! table.log_data(&[Sample::new("temp", 21), Sample::new("light", 300)]);
//! clock.advance(500);
//! table.log_data(&[Sample::new("temp", 22)]);
//!
//! let mut log = MemoryLog::new();
//! table.save_buffer(&mut log)?;
//! assert_eq!(log.column("time(ms)"), vec!["0", "500"]);
//! assert_eq!(log.column("light"), vec!["300", "0"]);
//! # Ok(())
//! # }
//! ```

use crate::clock::{Clock, MonotonicClock};
use crate::error::Result;
use crate::export::{ExportSummary, LogSink, Replay, export};
use crate::ring::RingStore;
use crate::row::{RowEncoder, Sample};
use crate::schema::TableConfig;
use crate::slab::Storage;

/// A fixed-capacity telemetry table.
///
/// Schema and capacity are fixed when the table is created. The only
/// mutation is appending rows; once the ring is full each new row evicts the
/// oldest one.
///
/// # Thread Safety
///
/// `Table` is not internally synchronized. `log_data` takes `&mut self` and
/// `save_buffer` takes `&self`, so an export can never run in the middle of
/// a write. Hosts with several threads should wrap the table in one `Mutex`;
/// every operation is short and never blocks.
#[derive(Debug)]
pub struct Table<C = MonotonicClock> {
    /// The configuration the table was created from.
    config: TableConfig,
    /// Column order used to build rows.
    encoder: RowEncoder,
    /// Physical row storage.
    ring: RingStore<Storage>,
    /// Source of row timestamps.
    clock: C,
    /// Clock reading of the previous row, unset before the first.
    last_timestamp: Option<u64>,
    /// Row buffer reused by every `log_data` call.
    scratch: Box<[i16]>,
}

impl Table<MonotonicClock> {
    /// Creates a table timed by a monotonic clock started now.
    ///
    /// # Errors
    ///
    /// Returns [`TableError`](crate::error::TableError) if the configuration
    /// is rejected; see [`TableConfig::validate`].
    pub fn create(config: TableConfig) -> Result<Self> {
        Self::with_clock(config, MonotonicClock::new())
    }
}

impl<C: Clock> Table<C> {
    /// Creates a table timed by `clock`.
    ///
    /// Storage for every row the capacity budget allows is allocated here
    /// and never resized.
    ///
    /// # Errors
    ///
    /// Returns [`TableError`](crate::error::TableError) if the configuration
    /// is rejected; see [`TableConfig::validate`].
    pub fn with_clock(config: TableConfig, clock: C) -> Result<Self> {
        let max_rows = config.validate()?;
        let row_width = config.row_width();

        let storage = Storage::allocate(config.storage, max_rows * row_width);
        let ring = RingStore::new(storage, row_width)?;
        let encoder = RowEncoder::new(config.columns.clone());

        tracing::debug!(
            columns = ?config.columns,
            max_rows,
            storage = ?config.storage,
            "table created"
        );

        Ok(Self {
            config,
            encoder,
            ring,
            clock,
            last_timestamp: None,
            scratch: vec![0; row_width].into_boxed_slice(),
        })
    }

    /// Logs one row stamped with the table's clock.
    ///
    /// Columns without a sample are stored as 0, the last sample wins when a
    /// column repeats, and samples for untracked columns are dropped.
    ///
    /// Returns the number of dropped samples.
    pub fn log_data(&mut self, samples: &[Sample<'_>]) -> usize {
        let now_ms = self.clock.now_millis();
        self.log_data_at(now_ms, samples)
    }

    /// Logs one row with an explicit clock reading in milliseconds.
    ///
    /// The stored delta is the gap since the previous row, 0 for the first
    /// row and for a reading earlier than the previous one.
    ///
    /// Returns the number of dropped samples.
    pub fn log_data_at(&mut self, now_ms: u64, samples: &[Sample<'_>]) -> usize {
        let delta_ms = self
            .last_timestamp
            .map_or(0, |last| now_ms.saturating_sub(last));
        self.last_timestamp = Some(now_ms);

        let dropped = self.encoder.encode(delta_ms, samples, &mut self.scratch);
        self.ring.append(&self.scratch);
        dropped
    }

    /// Writes every resident row to `sink`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`](crate::error::ExportError) if the sink fails.
    pub fn save_buffer<L: LogSink + ?Sized>(&self, sink: &mut L) -> Result<ExportSummary> {
        export(&self.ring, self.encoder.columns(), sink)
    }

    /// Resident rows oldest first, with elapsed time since the oldest.
    pub fn rows(&self) -> Replay<'_, Storage> {
        Replay::new(&self.ring)
    }

    /// Maximum number of resident rows.
    pub fn max_rows(&self) -> usize {
        self.ring.max_rows()
    }

    /// Rows currently resident.
    pub fn populated_rows(&self) -> usize {
        self.ring.occupied_rows()
    }

    /// Rows logged since creation, evicted ones included.
    pub fn inserted_rows(&self) -> u64 {
        self.ring.inserted_rows()
    }

    /// Whether any row has been evicted.
    pub fn has_wrapped(&self) -> bool {
        self.ring.has_wrapped()
    }

    /// Tracked columns in slot order.
    pub fn columns(&self) -> &[String] {
        self.encoder.columns()
    }

    /// The configuration the table was created from.
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// The underlying ring store.
    pub fn ring(&self) -> &RingStore<Storage> {
        &self.ring
    }
}
