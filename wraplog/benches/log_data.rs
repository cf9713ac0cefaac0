//! Microbenchmarks for the `log_data()` hot path and export.
//!
//! Run with: `cargo bench -p wraplog -- log_data`

#![allow(missing_docs, clippy::cast_possible_truncation)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use wraplog::clock::ManualClock;
use wraplog::sink::{DelimitedLog, MemoryLog, TextFormat};
use wraplog::{Sample, StorageBackend, Table, TableConfig};

/// Creates a table with `columns` columns and room for ~1000 rows.
fn setup_table(columns: usize, storage: StorageBackend) -> (Table<ManualClock>, Vec<String>) {
    let names: Vec<String> = (0..columns).map(|i| format!("sensor_{i}")).collect();
    let config = TableConfig::new(names.clone())
        .with_capacity_budget(1000 * (columns + 1))
        .with_storage(storage);
    let table = Table::with_clock(config, ManualClock::new(0)).unwrap();
    (table, names)
}

fn bench_log_single_column(c: &mut Criterion) {
    let (mut table, _) = setup_table(1, StorageBackend::SlotRing);
    let samples = [Sample::new("sensor_0", 42)];
    let mut now = 0u64;

    c.bench_function("log_data/single_column", |b| {
        b.iter(|| {
            now += 10;
            table.log_data_at(black_box(now), black_box(&samples[..]));
        });
    });
}

fn bench_log_column_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("log_data/column_count");

    for count in [1, 3, 10] {
        for storage in [StorageBackend::ByteBuffer, StorageBackend::SlotRing] {
            let (mut table, names) = setup_table(count, storage);
            let samples: Vec<Sample<'_>> = names
                .iter()
                .enumerate()
                .map(|(i, name)| Sample::new(name, i as i64))
                .collect();
            let mut now = 0u64;

            let id = BenchmarkId::new(format!("{storage:?}"), count);
            group.bench_with_input(id, &count, |b, _| {
                b.iter(|| {
                    now += 10;
                    table.log_data_at(black_box(now), black_box(&samples[..]));
                });
            });
        }
    }

    group.finish();
}

fn bench_save_buffer(c: &mut Criterion) {
    let (mut table, names) = setup_table(3, StorageBackend::SlotRing);
    let samples: Vec<Sample<'_>> = names.iter().map(|name| Sample::new(name, 1234)).collect();
    for i in 0..1500u64 {
        table.log_data_at(i * 10, &samples);
    }

    c.bench_function("save_buffer/memory", |b| {
        b.iter(|| {
            let mut log = MemoryLog::new();
            table.save_buffer(black_box(&mut log)).unwrap();
        });
    });

    c.bench_function("save_buffer/csv", |b| {
        b.iter(|| {
            let mut log = DelimitedLog::new(Vec::with_capacity(64 * 1024), TextFormat::Csv);
            table.save_buffer(black_box(&mut log)).unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_log_single_column,
    bench_log_column_count,
    bench_save_buffer,
);
criterion_main!(benches);
