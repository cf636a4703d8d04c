use std::hint::black_box;

use blocked_gemm::{BlockParams, Gemm, KernelKind, Layout, MatMut, MatRef, gemm, multiply};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

fn inputs(size: usize) -> (Vec<f64>, Vec<f64>) {
    let a = (0..size * size).map(|i| (i % 100) as f64).collect();
    let b = (0..size * size).map(|i| (i % 100) as f64).collect();
    (a, b)
}

/// Same multiply under the built-in unit blocking, portable blocking and
/// the detected SIMD kernel.
fn bench_blocking(c: &mut Criterion) {
    let mut group = c.benchmark_group("gemm_blocking");
    group.sample_size(10);

    for size in [64, 128, 256] {
        let (a, b) = inputs(size);
        let flops = 2 * size * size * size;
        group.throughput(Throughput::Elements(flops as u64));

        group.bench_with_input(BenchmarkId::new("compiled", size), &size, |bench, &n| {
            let mut out = vec![0.0; n * n];
            bench.iter(|| {
                gemm(
                    1.0,
                    MatRef::from_slice(black_box(&a), n, n, Layout::RowMajor).unwrap(),
                    MatRef::from_slice(black_box(&b), n, n, Layout::RowMajor).unwrap(),
                    0.0,
                    MatMut::from_slice(&mut out, n, n, Layout::RowMajor).unwrap(),
                )
                .unwrap()
            });
        });

        let portable = Gemm::new(BlockParams::PORTABLE);
        group.bench_with_input(BenchmarkId::new("portable", size), &size, |bench, &n| {
            let mut out = vec![0.0; n * n];
            bench.iter(|| {
                portable
                    .run(
                        1.0,
                        MatRef::from_slice(black_box(&a), n, n, Layout::RowMajor).unwrap(),
                        MatRef::from_slice(black_box(&b), n, n, Layout::RowMajor).unwrap(),
                        0.0,
                        MatMut::from_slice(&mut out, n, n, Layout::RowMajor).unwrap(),
                    )
                    .unwrap()
            });
        });

        let label = format!("auto ({})", KernelKind::detect().name());
        group.bench_with_input(BenchmarkId::new(label, size), &size, |bench, &n| {
            let mut out = vec![0.0; n * n];
            bench.iter(|| multiply(black_box(&a), black_box(&b), &mut out, n, n, n).unwrap());
        });
    }

    group.finish();
}

/// Each available kernel on its tuned block sizes.
fn bench_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("gemm_kernels");
    group.sample_size(10);

    let size = 512;
    let (a, b) = inputs(size);
    group.throughput(Throughput::Elements((2 * size * size * size) as u64));

    for kind in KernelKind::available() {
        group.bench_function(BenchmarkId::from_parameter(kind.name()), |bench| {
            let mut out = vec![0.0; size * size];
            bench.iter(|| {
                blocked_gemm::dispatch::run_f64(
                    kind,
                    1,
                    1.0,
                    MatRef::from_slice(black_box(&a), size, size, Layout::RowMajor).unwrap(),
                    MatRef::from_slice(black_box(&b), size, size, Layout::RowMajor).unwrap(),
                    0.0,
                    MatMut::from_slice(&mut out, size, size, Layout::RowMajor).unwrap(),
                )
                .unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_blocking, bench_kernels);
criterion_main!(benches);
