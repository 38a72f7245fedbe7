//! Query pipeline benchmarks
//!
//! Run with: cargo bench --bench query

use std::collections::HashSet;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use kindred::engine::{EngineConfig, QueryRequest, SimilarityEngine};
use kindred::mods::Mods;
use kindred::table::{FeatureRow, FeatureTable};

fn synthetic_table(rows: usize) -> FeatureTable {
    let mut rng = StdRng::seed_from_u64(7);
    let rows: Vec<FeatureRow> = (0..rows)
        .map(|i| FeatureRow {
            star_rating: rng.gen_range(1.0..9.0),
            bpm: rng.gen_range(80.0..280.0),
            size: rng.gen_range(2.0..7.0),
            approach_rate: rng.gen_range(7.0..10.5),
            slider_factor: rng.gen_range(0.5..1.0),
            circle_slider_ratio: rng.gen_range(0.2..6.0),
            aim_speed_ratio: rng.gen_range(0.8..1.6),
            speed_object_ratio: rng.gen_range(0.0..1.0),
            map_id: i as i64 + 1,
            mods: Mods(if i % 3 == 0 { 64 } else { 0 }),
            accuracy_param: rng.gen_range(6.0..10.0),
            drain_param: rng.gen_range(3.0..7.0),
        })
        .collect();
    FeatureTable::from_rows(rows).unwrap()
}

fn bench_query(c: &mut Criterion) {
    let sizes = [1_000, 10_000, 100_000];

    let mut group = c.benchmark_group("query");
    group.sample_size(20);

    for size in sizes {
        group.throughput(Throughput::Elements(size as u64));

        let engine = SimilarityEngine::new(synthetic_table(size), EngineConfig::default());
        let request = QueryRequest {
            map_id: 2,
            mods: Mods(0),
            exclude_mods: HashSet::new(),
            max_results: 10,
        };

        group.bench_function(format!("rows_{}", size), |bencher| {
            bencher.iter(|| engine.query(black_box(&request)).unwrap())
        });
    }

    group.finish();
}

fn bench_query_with_exclusion(c: &mut Criterion) {
    let engine = SimilarityEngine::new(synthetic_table(10_000), EngineConfig::default());
    let request = QueryRequest {
        map_id: 2,
        mods: Mods(0),
        exclude_mods: [64].into(),
        max_results: 10,
    };

    c.bench_function("query_excluding_dt_rows_10000", |bencher| {
        bencher.iter(|| engine.query(black_box(&request)).unwrap())
    });
}

criterion_group!(benches, bench_query, bench_query_with_exclusion);
criterion_main!(benches);
