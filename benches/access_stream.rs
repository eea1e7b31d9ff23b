use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tiered_dcpt::engine::Prefetcher;
use tiered_dcpt::sim::{SimHost, TraceGenerator};

fn criterion_benchmark(c: &mut Criterion) {
    let stride = TraceGenerator::stride(10_000, 16, 64);
    let scatter = TraceGenerator::scatter(10_000, 500, 7);

    c.bench_function("stride_stream_10k", |b| {
        b.iter(|| {
            let mut prefetcher = Prefetcher::default();
            let mut host = SimHost::new();
            for &stat in &stride {
                prefetcher.access(black_box(stat), &mut host);
            }
            black_box(host.issued().len())
        })
    });

    c.bench_function("scatter_stream_10k", |b| {
        b.iter(|| {
            let mut prefetcher = Prefetcher::default();
            let mut host = SimHost::new();
            for &stat in &scatter {
                prefetcher.access(black_box(stat), &mut host);
            }
            black_box(host.issued().len())
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
