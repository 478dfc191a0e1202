//! Per-stage latency of the compile pipeline.
//!
//! Measures parse, tile, and generate on the elementwise kernels, plus a
//! generated program with a long right-hand side to stress the operator scan.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tilec::codegen::{CTarget, CppTarget};
use tilec::{generate, generate_variants, parse, tile, KernelConfig, TensorRegistry};

const ADD: &str = "LOOPS: i=0:N:1, j=0:M:1 BODY: C[i,j] = A[i,j] + B[i,j]";
const TRANSPOSE: &str = "LOOPS: i=0:N:1, j=0:M:1 BODY: C[i,j] = A[j,i]";

fn registry() -> TensorRegistry {
    KernelConfig::default()
        .registry()
        .expect("default registry")
}

/// `C[i,j] = A[i,j] * B[i,j] + A[i,j] * B[i,j] + ...` with `terms` products.
fn long_body(terms: usize) -> String {
    let rhs: Vec<&str> = (0..terms).map(|_| "A[i,j] * B[i,j]").collect();
    format!("LOOPS: i=0:N:1, j=0:M:1 BODY: C[i,j] = {}", rhs.join(" + "))
}

fn bench_parse(c: &mut Criterion) {
    let reg = registry();
    let long = long_body(64);

    let mut group = c.benchmark_group("parse");
    group.bench_function("add", |b| b.iter(|| parse(black_box(ADD), &reg)));
    group.bench_function("transpose", |b| {
        b.iter(|| parse(black_box(TRANSPOSE), &reg))
    });
    group.bench_function("64_terms", |b| b.iter(|| parse(black_box(&long), &reg)));
    group.finish();
}

fn bench_tile(c: &mut Criterion) {
    let reg = registry();
    let root = parse(ADD, &reg).expect("parse add");
    c.bench_function("tile_add", |b| b.iter(|| tile(black_box(&root))));
}

fn bench_generate(c: &mut Criterion) {
    let reg = registry();
    let root = parse(ADD, &reg).expect("parse add");
    let tiled = tile(&root).expect("tile add");

    let mut group = c.benchmark_group("generate");
    group.bench_function("untiled", |b| b.iter(|| generate(black_box(&root))));
    group.bench_function("tiled", |b| b.iter(|| generate(black_box(&tiled))));
    group.bench_function("variants_cpp", |b| {
        b.iter(|| generate_variants("add", black_box(&root), Some(&tiled), &CppTarget::new()))
    });
    group.bench_function("variants_c", |b| {
        b.iter(|| generate_variants("add", black_box(&root), Some(&tiled), &CTarget::new()))
    });
    group.finish();
}

criterion_group!(benches, bench_parse, bench_tile, bench_generate);
criterion_main!(benches);
