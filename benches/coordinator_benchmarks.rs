//! Benchmarks for end-to-end sharded validation through the local launcher

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use ilr_validate::shard::ShardPartitioner;
use ilr_validate::testing::{sample_message, sample_snapshot};
use ilr_validate::worker::{LocalWorkerLauncher, ShardCoordinator};
use ilr_validate::CancellationSignal;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::runtime::Runtime;

fn bench_sharded_validation(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("sharded_validation");
    group.sample_size(20);

    let snapshot = sample_snapshot();
    let message = sample_message(5_000, 2_000);

    for size in [250, 1_000, 5_000] {
        group.bench_with_input(BenchmarkId::new("shard_size", size), &size, |b, &size| {
            let coordinator = ShardCoordinator::new(Arc::new(LocalWorkerLauncher::default()))
                .with_partitioner(ShardPartitioner::new(NonZeroUsize::new(size).unwrap()));
            b.to_async(&rt).iter_batched(
                CancellationSignal::new,
                |cancellation| {
                    let coordinator = &coordinator;
                    let message = &message;
                    let snapshot = &snapshot;
                    async move {
                        coordinator
                            .run(message, snapshot, "bench", &cancellation)
                            .await
                            .unwrap()
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_concurrency_limit(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("concurrency_limit");
    group.sample_size(20);

    let snapshot = sample_snapshot();
    let message = sample_message(4_000, 0);

    for limit in [1, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(limit), &limit, |b, &limit| {
            let coordinator = ShardCoordinator::new(Arc::new(LocalWorkerLauncher::default()))
                .with_partitioner(ShardPartitioner::new(NonZeroUsize::new(250).unwrap()))
                .with_concurrency_limit(NonZeroUsize::new(limit));
            b.to_async(&rt).iter(|| async {
                coordinator
                    .run(&message, &snapshot, "bench", &CancellationSignal::new())
                    .await
                    .unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sharded_validation, bench_concurrency_limit);
criterion_main!(benches);
