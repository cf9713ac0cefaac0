//! Simulated sensor host with an embedded wraplog table.
//!
//! This binary stands in for the event loop of a microcontroller program:
//! it polls a set of synthetic sensors on a fixed tick, logs one row per
//! poll into a wraplog table, then saves the buffer as CSV or TSV the way a
//! "save buffer" button press would.
//!
//! Time is simulated with a manual clock, so runs are reproducible.

mod sensors;

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;
use wraplog::clock::ManualClock;
use wraplog::sink::{DelimitedLog, Erase, TextFormat};
use wraplog::{ExportSummary, Sample, StorageBackend, Table, TableConfig};

/// Drive a circular telemetry table with synthetic sensors.
#[derive(Parser)]
#[command(name = "wraplog-sim", version, about)]
struct Cli {
    /// JSON table configuration; overrides --columns, --capacity-budget and --storage.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tracked columns, comma separated.
    #[arg(long, value_delimiter = ',', default_value = "x,y,z")]
    columns: Vec<String>,

    /// Total numeric slots available to the table.
    #[arg(long, default_value_t = wraplog::schema::DEFAULT_CAPACITY_BUDGET)]
    capacity_budget: usize,

    /// Physical storage backend.
    #[arg(long, value_enum, default_value = "slot-ring")]
    storage: Storage,

    /// Number of sensor polls to log.
    #[arg(long, default_value = "52")]
    polls: u64,

    /// Milliseconds between polls.
    #[arg(long, default_value = "20")]
    interval_ms: u64,

    /// Column to leave out of every poll (repeatable); it is saved as 0.
    #[arg(long)]
    omit: Vec<String>,

    /// Output file; stdout if not given.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value = "csv")]
    format: Format,

    /// Print a JSON run summary to stderr after saving.
    #[arg(long)]
    summary: bool,
}

/// Storage backend choices.
#[derive(Clone, Copy, ValueEnum)]
enum Storage {
    /// Raw little-endian byte buffer.
    ByteBuffer,
    /// Typed element array.
    SlotRing,
}

impl From<Storage> for StorageBackend {
    fn from(storage: Storage) -> Self {
        match storage {
            Storage::ByteBuffer => Self::ByteBuffer,
            Storage::SlotRing => Self::SlotRing,
        }
    }
}

/// Output format choices.
#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Comma-separated values.
    Csv,
    /// Tab-separated values.
    Tsv,
}

impl From<Format> for TextFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Csv => Self::Csv,
            Format::Tsv => Self::Tsv,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!("simulation failed: {e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn table_config(cli: &Cli) -> wraplog::Result<TableConfig> {
    match &cli.config {
        Some(path) => TableConfig::load(path),
        None => Ok(TableConfig::new(cli.columns.iter().cloned())
            .with_capacity_budget(cli.capacity_budget)
            .with_storage(cli.storage.into())),
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = table_config(&cli)?;
    let clock = ManualClock::new(0);
    let mut table = Table::with_clock(config, clock.clone())?;

    tracing::info!(
        columns = ?table.columns(),
        max_rows = table.max_rows(),
        "table created"
    );

    for column in &cli.omit {
        if !table.columns().contains(column) {
            tracing::warn!("omitted column '{column}' is not tracked");
        }
    }

    let columns = table.columns().to_vec();
    let mut dropped = 0;
    for poll in 0..cli.polls {
        clock.set(poll * cli.interval_ms);

        let samples: Vec<Sample<'_>> = columns
            .iter()
            .enumerate()
            .filter(|(_, name)| !cli.omit.contains(*name))
            .map(|(index, name)| Sample::new(name, sensors::reading(index, poll)))
            .collect();
        dropped += table.log_data(&samples);
    }

    tracing::info!(
        polls = cli.polls,
        populated_rows = table.populated_rows(),
        wrapped = table.has_wrapped(),
        "polling finished"
    );

    let format = TextFormat::from(cli.format);
    let summary = match &cli.output {
        Some(path) => save(&table, DelimitedLog::create(path, format)?)?,
        None => save(&table, DelimitedLog::new(io::stdout(), format))?,
    };

    tracing::info!(rows = summary.rows, span_ms = summary.span_ms, "buffer saved");

    if cli.summary {
        let newest_row: Option<Vec<i16>> = table.ring().newest().map(|row| row.values().collect());
        let report = serde_json::json!({
            "columns": table.columns(),
            "max_rows": table.max_rows(),
            "inserted_rows": table.inserted_rows(),
            "populated_rows": table.populated_rows(),
            "exported_rows": summary.rows,
            "span_ms": summary.span_ms,
            "dropped_samples": dropped,
            "newest_row": newest_row,
        });
        eprintln!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

fn save<W: Write + Erase>(
    table: &Table<ManualClock>,
    mut log: DelimitedLog<W>,
) -> wraplog::Result<ExportSummary> {
    table.save_buffer(&mut log)
}
