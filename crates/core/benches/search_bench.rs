//! Benchmark for the search engine

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use easypow_core::{Algorithm, Pattern, SearchConfig, TargetMask, search};

fn bench_digests(c: &mut Criterion) {
    let input = b"benchmark input data for easypow digest throughput";

    for algorithm in Algorithm::ALL {
        let digest = algorithm.digest_fn();
        let mut out = vec![0u8; digest.output_len()];
        c.bench_function(&format!("digest_{algorithm}"), |b| {
            b.iter(|| digest.digest_into(black_box(input), &mut out))
        });
    }
}

fn bench_exhaustive_scan(c: &mut Criterion) {
    // 10^4 candidates against a fully masked zero target: never matches
    let pattern = Pattern::compile(b"easypow-bench-", 4, b"", b"0123456789").unwrap();
    let target = TargetMask::new(vec![0; 16], vec![0xFF; 16]).unwrap();

    for threads in [1, 4] {
        let config = SearchConfig::with_threads(threads);
        c.bench_function(&format!("md5_scan_10k_{threads}t"), |b| {
            b.iter(|| search(&pattern, &target, Algorithm::Md5.digest_fn(), &config))
        });
    }
}

fn bench_16bit_prefix(c: &mut Criterion) {
    let pattern = Pattern::compile(b"easypow-", 8, b"", b"0123456789").unwrap();
    let target = TargetMask::leading_ones(16, 32).unwrap();
    let config = SearchConfig::default();

    c.bench_function("sha256_16bit_prefix", |b| {
        b.iter(|| search(&pattern, &target, Algorithm::Sha256.digest_fn(), &config))
    });
}

criterion_group!(
    benches,
    bench_digests,
    bench_exhaustive_scan,
    bench_16bit_prefix
);
criterion_main!(benches);
