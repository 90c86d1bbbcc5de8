//! Benchmarks for the 2-3 tree and the index manager.
//!
//! ## Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//!
//! # Run specific group
//! cargo bench -- tree_operations
//! ```
//!
//! Results are saved to `target/criterion/` with HTML reports.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use stockbook::{IndexManager, Tree};

// ============================================================================
// HELPER FUNCTIONS - Deterministic data generation
// ============================================================================

/// Fixed-point scale (10^8)
const SCALE: i64 = 100_000_000;

/// Deterministic random keys (same seed = same keys)
fn generate_keys(count: usize, seed: u64) -> Vec<i64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count).map(|_| rng.gen_range(0..i64::MAX / 2)).collect()
}

/// Tree holding `count` random keys
fn populated_tree(count: usize, seed: u64) -> (Tree<i64, u64>, Vec<i64>) {
    let keys = generate_keys(count, seed);
    let mut tree = Tree::with_capacity(count * 2, i64::MIN, i64::MAX);
    for (i, &key) in keys.iter().enumerate() {
        tree.insert(key, i as u64);
    }
    (tree, keys)
}

/// Index with `count` records priced between 1 and 1000
fn populated_index(count: usize, seed: u64) -> IndexManager {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut index = IndexManager::with_capacity(count);
    for i in 0..count {
        let price = rng.gen_range(1..=1_000) * SCALE;
        // Ids are unique by construction
        let _ = index.add_record(format!("S{i:06}"), i as i64 + 1, price);
    }
    index
}

// ============================================================================
// BENCHMARK: Tree Operations
// ============================================================================

fn bench_tree_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_operations");

    group.measurement_time(Duration::from_secs(5));

    let (tree, keys) = populated_tree(100_000, 42);

    group.bench_function("search_in_100k", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % keys.len();
            black_box(tree.search(&keys[i]))
        });
    });

    group.bench_function("rank_in_100k", |b| {
        let handles: Vec<_> = keys.iter().filter_map(|k| tree.search(k)).collect();
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % handles.len();
            black_box(tree.rank(handles[i]))
        });
    });

    group.bench_function("select_in_100k", |b| {
        let mut i = 0;
        b.iter(|| {
            i = i % tree.len() + 1;
            black_box(tree.select(i))
        });
    });

    group.bench_function("insert_delete_in_100k", |b| {
        let mut tree = tree.clone();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        b.iter(|| {
            let id = tree.insert(rng.gen_range(0..i64::MAX / 2), 0);
            black_box(tree.delete(id))
        });
    });

    group.finish();
}

// ============================================================================
// BENCHMARK: Range Queries
// ============================================================================

fn bench_range_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_queries");

    group.measurement_time(Duration::from_secs(5));

    let (tree, _) = populated_tree(100_000, 42);
    let width = i64::MAX / 2 / 100;

    group.bench_function("count_1pct_of_100k", |b| {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        b.iter(|| {
            let lo = rng.gen_range(0..i64::MAX / 2);
            black_box(tree.count_range(&lo, &lo.saturating_add(width)))
        });
    });

    group.bench_function("list_1pct_of_100k", |b| {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        b.iter(|| {
            let lo = rng.gen_range(0..i64::MAX / 2);
            black_box(tree.range(&lo, &lo.saturating_add(width)))
        });
    });

    group.finish();
}

// ============================================================================
// BENCHMARK: Throughput
// ============================================================================

fn bench_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("throughput");

    group.measurement_time(Duration::from_secs(10));
    group.sample_size(50);

    for batch_size in [1_000, 10_000, 50_000] {
        group.throughput(Throughput::Elements(batch_size as u64));

        group.bench_with_input(BenchmarkId::new("inserts", batch_size), &batch_size, |b, &size| {
            let keys = generate_keys(size, 42);

            b.iter_batched(
                || keys.clone(),
                |keys| {
                    let mut tree = Tree::with_capacity(size, i64::MIN, i64::MAX);
                    for key in keys {
                        tree.insert(key, ());
                    }
                    tree.len()
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

// ============================================================================
// BENCHMARK: Index Manager
// ============================================================================

fn bench_index_manager(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_manager");

    group.measurement_time(Duration::from_secs(5));

    let index = populated_index(10_000, 42);

    group.bench_function("price_delta_in_10k", |b| {
        let mut index = index.clone();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut timestamp = 0;
        b.iter(|| {
            timestamp += 1;
            let id = format!("S{:06}", rng.gen_range(0..10_000));
            let delta = if rng.gen_bool(0.5) { SCALE } else { -SCALE };
            black_box(index.apply_price_delta(&id, timestamp, delta))
        });
    });

    group.bench_function("count_in_price_range_10k", |b| {
        b.iter(|| black_box(index.count_in_price_range(250 * SCALE, 750 * SCALE)));
    });

    group.bench_function("state_root_10k", |b| {
        b.iter(|| black_box(index.state_root()));
    });

    group.finish();
}

// ============================================================================
// CRITERION ENTRY POINT
// ============================================================================

criterion_group!(
    benches,
    bench_tree_operations,
    bench_range_queries,
    bench_throughput,
    bench_index_manager
);

criterion_main!(benches);
