//! Append and lookup benchmarks.
//!
//! Run: cargo bench --bench lines_dir

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use linecompress_rs::shard::locate::find_last;
use linecompress_rs::shard::FsLister;
use linecompress_rs::{LinesDir, LinesDirConfig};
use tempfile::TempDir;

/// A directory holding roughly `shards` compressed shards of small lines
fn populated_dir(shards: usize, subdirs: usize) -> (TempDir, LinesDir) {
    let temp = TempDir::new().unwrap();
    let dir = LinesDir::with_config(
        temp.path(),
        LinesDirConfig::new()
            .with_subdirs(subdirs)
            .with_byte_threshold(256)
            .with_compression_level(1),
    )
    .unwrap();

    // About ten 26-byte lines fill one shard
    for i in 0..shards * 10 {
        dir.add(&format!("benchmark line number {:04}", i % 10_000)).unwrap();
    }
    (temp, dir)
}

fn bench_find_last(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_last");

    for shards in [10usize, 100, 500] {
        let (temp, _dir) = populated_dir(shards, 2);
        group.bench_with_input(BenchmarkId::from_parameter(shards), &shards, |b, _| {
            b.iter(|| black_box(find_last(FsLister, temp.path(), 2).unwrap()));
        });
    }

    group.finish();
}

fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("add");

    for subdirs in [1usize, 2, 4] {
        let temp = TempDir::new().unwrap();
        let dir = LinesDir::with_config(
            temp.path(),
            LinesDirConfig::new().with_subdirs(subdirs).with_byte_threshold(64 * 1024),
        )
        .unwrap();

        group.bench_with_input(BenchmarkId::new("subdirs", subdirs), &subdirs, |b, _| {
            b.iter(|| dir.add(black_box("The quick brown fox jumps over the lazy dog")).unwrap());
        });
    }

    group.finish();
}

fn bench_read(c: &mut Criterion) {
    let (_temp, dir) = populated_dir(100, 2);

    c.bench_function("read_lines_forward", |b| {
        b.iter(|| black_box(dir.read_lines(false).count()));
    });
    c.bench_function("read_lines_newest_10", |b| {
        b.iter(|| black_box(dir.read_lines(true).take(10).count()));
    });
}

criterion_group!(benches, bench_find_last, bench_add, bench_read);
criterion_main!(benches);
