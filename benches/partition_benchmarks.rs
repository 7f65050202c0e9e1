//! Benchmarks for record sharding and shard payload encoding

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ilr_validate::shard::ShardPartitioner;
use ilr_validate::testing::sample_message;
use ilr_validate::worker::{ShardPayload, SnapshotPayload};
use std::hint::black_box;
use std::num::NonZeroUsize;

fn bench_partition(c: &mut Criterion) {
    let mut group = c.benchmark_group("partition");

    for learners in [1_000, 10_000, 50_000] {
        let message = sample_message(learners, learners / 2);
        group.bench_with_input(
            BenchmarkId::new("default_shard_size", learners),
            &message,
            |b, message| {
                let partitioner = ShardPartitioner::default();
                b.iter(|| black_box(partitioner.partition(message)));
            },
        );
    }

    let message = sample_message(10_000, 5_000);
    for size in [100, 1_000, 5_000] {
        group.bench_with_input(BenchmarkId::new("shard_size", size), &size, |b, &size| {
            let partitioner = ShardPartitioner::new(NonZeroUsize::new(size).unwrap());
            b.iter(|| black_box(partitioner.partition(&message)));
        });
    }

    group.finish();
}

fn bench_payload_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("payload_encoding");

    let plan = ShardPartitioner::default().partition(&sample_message(1_000, 1_000));
    let shard = plan.learner_shards[0].clone();
    group.bench_function("learner_shard", |b| {
        b.iter(|| black_box(ShardPayload::encode(&shard).unwrap()));
    });

    let snapshot = ilr_validate::testing::sample_snapshot();
    group.bench_function("snapshot", |b| {
        b.iter(|| black_box(SnapshotPayload::encode(&snapshot).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_partition, bench_payload_encoding);
criterion_main!(benches);
