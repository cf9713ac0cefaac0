//! Error types for the wraplog telemetry logger.

use std::path::PathBuf;

use thiserror::Error;

use crate::schema::ValueKind;

/// The main error type for all wraplog operations.
///
/// Every failure is either a configuration problem rejected when a table is
/// created, a problem loading configuration, or the persistent log store
/// refusing a write during export. Logging a row never fails.
#[derive(Error, Debug)]
pub enum WraplogError {
    /// The table configuration is not usable.
    #[error("table error: {0}")]
    Table(#[from] TableError),

    /// The configuration could not be read or parsed.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Error while writing the buffer to the log store.
    #[error("export error: {0}")]
    Export(#[from] ExportError),
}

/// Configuration errors, all fatal at table creation.
#[derive(Error, Debug)]
pub enum TableError {
    /// No columns were given.
    #[error("a table needs at least one column")]
    NoColumns,

    /// A column name is the empty string.
    #[error("column {index} has an empty name")]
    EmptyColumnName {
        /// Position of the offending column.
        index: usize,
    },

    /// The same column name appears twice.
    #[error("column '{name}' is listed more than once")]
    DuplicateColumn {
        /// The repeated name.
        name: String,
    },

    /// A column collides with the exported elapsed-time column.
    #[error("column name '{name}' is reserved for elapsed time")]
    ReservedColumn {
        /// The reserved name.
        name: String,
    },

    /// The capacity budget cannot hold a single row.
    #[error("capacity budget of {capacity_budget} slots holds no rows of width {row_width}")]
    InsufficientCapacity {
        /// Total number of numeric slots available.
        capacity_budget: usize,
        /// Slots per row (columns + time delta).
        row_width: usize,
    },

    /// The capacity budget is larger than any buffer the host can address.
    #[error("capacity budget of {capacity_budget} slots exceeds the addressable size")]
    CapacityTooLarge {
        /// Total number of numeric slots requested.
        capacity_budget: usize,
    },

    /// The requested value kind has no storage path.
    #[error("value kind {kind:?} is not supported by any storage backend")]
    UnsupportedValueKind {
        /// The rejected kind.
        kind: ValueKind,
    },
}

/// Errors loading a [`TableConfig`](crate::schema::TableConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config '{}': {source}", path.display())]
    Read {
        /// The config file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config text is not valid JSON for a table.
    #[error("failed to parse config: {source}")]
    Parse {
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that can occur while exporting to a log store.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The log store rejected an operation.
    #[error("log store write failed: {source}")]
    Sink {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Type alias for `Result<T, WraplogError>`.
pub type Result<T> = std::result::Result<T, WraplogError>;
