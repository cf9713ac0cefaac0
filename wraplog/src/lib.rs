//! # wraplog
//!
//! Fixed-budget circular telemetry logger.
//!
//! wraplog accumulates numeric sensor samples into a circular buffer sized
//! once from a slot budget, and on demand writes the buffer to an
//! append-only log store as a table: one row per sample, one column per
//! tracked signal, plus an elapsed-time column.
//!
//! **Status**: This crate is in early development. The API is not yet stable.
//!
//! ## Key Properties
//!
//! - Storage is allocated once at table creation and never resized
//! - Each row is `columns + 1` signed 16-bit slots; the extra slot holds the
//!   time since the previous row
//! - Strict FIFO eviction: once full, every new row overwrites the oldest
//! - Export reconstructs elapsed time from the delta chain, starting at 0 for
//!   the oldest resident row
//! - Logging never fails; configuration problems are rejected up front
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wraplog::sink::{DelimitedLog, TextFormat};
//! use wraplog::{Sample, Table, TableConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // 100 slots / (3 columns + 1) = 25 rows
//! let mut table = Table::create(TableConfig::new(["x", "y", "z"]))?;
//!
//! for i in 0..52 {
//!     table.log_data(&[Sample::new("x", i), Sample::new("y", i + 1)]);
//! }
//! assert_eq!(table.populated_rows(), 25);
//!
//! let mut log = DelimitedLog::create("log.csv", TextFormat::Csv)?;
//! table.save_buffer(&mut log)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`Table`] — Facade an embedded program holds; owns the ring and columns
//! - [`TableConfig`] — Columns, value kind, capacity budget, storage backend
//! - [`Sample`] — One `(column, value)` cell of a log call
//! - [`LogSink`] — Row protocol of the persistent log store
//!
//! ## Modules
//!
//! - [`table`] — Table lifecycle, logging, export
//! - [`schema`] — Configuration and capacity math
//! - [`row`] — Sample-to-row encoding and numeric width rules
//! - [`ring`] — Ring of rows with FIFO eviction and ordered iteration
//! - [`slab`] — Physical slot storage backends
//! - [`export`] — Replay and the log store row protocol
//! - [`sink`] — In-memory and delimited-text log stores
//! - [`clock`] — Millisecond clocks
//! - [`error`] — Error types

pub mod clock;
pub mod error;
pub mod export;
pub mod ring;
pub mod row;
pub mod schema;
pub mod sink;
pub mod slab;
pub mod table;

// Re-export primary API types at crate root for convenience.
pub use error::{Result, WraplogError};
pub use export::{ExportSummary, LogSink};
pub use row::Sample;
pub use schema::{StorageBackend, TableConfig, ValueKind};
pub use table::Table;
