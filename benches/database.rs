use criterion::{black_box, criterion_group, criterion_main, Criterion};

use mzannot::lipid::{catalog, ChainParameters};
use mzannot::{build_lipid_database, LipidDatabase, MzTolerance};

fn query_all(db: &LipidDatabase, queries: &[f64], tolerance: &MzTolerance) -> usize {
    queries
        .iter()
        .map(|q| db.ions_within(*q, tolerance).len())
        .sum()
}

fn database_build(c: &mut Criterion) {
    let classes = catalog::all();
    let chains = ChainParameters::default();
    c.bench_function("build_lipid_database", |b| {
        b.iter(|| build_lipid_database(black_box(classes), black_box(&chains), &[], &[]))
    });
}

fn database_search(c: &mut Criterion) {
    let db = build_lipid_database(catalog::all(), &ChainParameters::default(), &[], &[]);
    let tolerance = MzTolerance::new(0.005, 10.0);
    let queries: Vec<f64> = (0..2000).map(|i| 300.0 + i as f64 * 0.37).collect();
    c.bench_function("ions_within", |b| {
        b.iter(|| query_all(black_box(&db), black_box(&queries), &tolerance))
    });
}

criterion_group!(benches, database_build, database_search);
criterion_main!(benches);
