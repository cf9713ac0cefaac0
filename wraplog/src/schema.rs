//! Table configuration types for wraplog.
//!
//! A [`TableConfig`] fixes everything about a table at creation time: the
//! ordered column set, the value kind, the capacity budget and the physical
//! storage backend. Nothing here can change once a table exists, so all
//! validation happens up front and [`TableConfig::validate`] returns the row
//! capacity the ring store will be allocated with.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result, TableError};
use crate::slab::SLOT_SIZE;

/// Default number of numeric slots a table may occupy.
pub const DEFAULT_CAPACITY_BUDGET: usize = 100;

/// Name of the elapsed-time column emitted ahead of the tracked columns.
pub const TIME_COLUMN: &str = "time(ms)";

/// How sample values are stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Signed 16-bit integers.
    #[default]
    Integer,

    /// Floating point values. No storage backend supports this kind, so
    /// tables requesting it are rejected at creation.
    Float,
}

/// Physical storage strategy backing a table's ring store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Raw byte buffer addressed as little-endian 16-bit words.
    ByteBuffer,

    /// Typed fixed-width element array.
    #[default]
    SlotRing,
}

/// Complete configuration of one table.
///
/// # Example
///
/// ```rust
/// use wraplog::schema::{StorageBackend, TableConfig};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = TableConfig::new(["temp", "light"])
///     .with_capacity_budget(99)
///     .with_storage(StorageBackend::ByteBuffer);
///
/// // 99 slots / (2 columns + 1 time delta) = 33 rows
/// assert_eq!(config.validate()?, 33);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Tracked column names, in slot order.
    pub columns: Vec<String>,

    /// Storage kind for sample values.
    #[serde(default)]
    pub value_kind: ValueKind,

    /// Total numeric slots available to the table.
    #[serde(default = "default_capacity_budget")]
    pub capacity_budget: usize,

    /// Backend that owns the physical slots.
    #[serde(default)]
    pub storage: StorageBackend,
}

fn default_capacity_budget() -> usize {
    DEFAULT_CAPACITY_BUDGET
}

impl TableConfig {
    /// Creates a configuration with the default value kind, capacity budget
    /// and storage backend.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            value_kind: ValueKind::default(),
            capacity_budget: DEFAULT_CAPACITY_BUDGET,
            storage: StorageBackend::default(),
        }
    }

    /// Sets the value kind.
    #[must_use]
    pub fn with_value_kind(mut self, value_kind: ValueKind) -> Self {
        self.value_kind = value_kind;
        self
    }

    /// Sets the capacity budget in slots.
    #[must_use]
    pub fn with_capacity_budget(mut self, capacity_budget: usize) -> Self {
        self.capacity_budget = capacity_budget;
        self
    }

    /// Sets the storage backend.
    #[must_use]
    pub fn with_storage(mut self, storage: StorageBackend) -> Self {
        self.storage = storage;
        self
    }

    /// Parses a configuration from JSON.
    ///
    /// Only `columns` is required; the other fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not a valid config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| ConfigError::Parse { source }.into())
    }

    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if its contents are not a valid config.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&data)
    }

    /// Slots per row: one per column plus the time delta.
    pub fn row_width(&self) -> usize {
        self.columns.len() + 1
    }

    /// Validates the configuration and returns the row capacity.
    ///
    /// # Errors
    ///
    /// Returns [`TableError`] if there are no columns, a column name is
    /// empty, repeated or reserved, the value kind is unsupported, or the
    /// capacity budget cannot hold a single row. Budgets whose storage
    /// would not fit in the address space fail with
    /// [`TableError::CapacityTooLarge`].
    pub fn validate(&self) -> Result<usize> {
        validate_columns(&self.columns)?;

        if self.value_kind != ValueKind::Integer {
            return Err(TableError::UnsupportedValueKind {
                kind: self.value_kind,
            }
            .into());
        }

        let max_rows = max_rows_for(self.capacity_budget, self.columns.len());
        if max_rows == 0 {
            return Err(TableError::InsufficientCapacity {
                capacity_budget: self.capacity_budget,
                row_width: self.row_width(),
            }
            .into());
        }

        if storage_bytes(max_rows, self.row_width()).is_none() {
            return Err(TableError::CapacityTooLarge {
                capacity_budget: self.capacity_budget,
            }
            .into());
        }

        Ok(max_rows)
    }
}

/// Bytes needed to hold `max_rows` rows of `row_width` slots, or `None` if
/// that exceeds the largest allocation the host can make.
pub fn storage_bytes(max_rows: usize, row_width: usize) -> Option<usize> {
    max_rows
        .checked_mul(row_width)?
        .checked_mul(SLOT_SIZE)
        .filter(|&bytes| isize::try_from(bytes).is_ok())
}

/// Number of whole rows a capacity budget holds for `num_columns` columns.
///
/// Each row takes `num_columns + 1` slots; the extra slot is the time delta.
///
/// ```rust
/// use wraplog::schema::max_rows_for;
///
/// assert_eq!(max_rows_for(100, 3), 25);
/// assert_eq!(max_rows_for(99, 2), 33);
/// assert_eq!(max_rows_for(1, 1), 0);
/// ```
pub fn max_rows_for(capacity_budget: usize, num_columns: usize) -> usize {
    capacity_budget / (num_columns + 1)
}

fn validate_columns(columns: &[String]) -> Result<()> {
    if columns.is_empty() {
        return Err(TableError::NoColumns.into());
    }

    let mut seen = HashSet::with_capacity(columns.len());
    for (index, name) in columns.iter().enumerate() {
        if name.is_empty() {
            return Err(TableError::EmptyColumnName { index }.into());
        }
        if name == TIME_COLUMN {
            return Err(TableError::ReservedColumn { name: name.clone() }.into());
        }
        if !seen.insert(name.as_str()) {
            return Err(TableError::DuplicateColumn { name: name.clone() }.into());
        }
    }

    Ok(())
}
