use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

use ecs_runtime::ECSRoot;

mod common;
use common::*;

fn build_submit_benchmark(c: &mut Criterion) {
    let defs = defs();
    let mut group = c.benchmark_group("build_submit");

    group.bench_function("build_10k", |b| {
        b.iter_batched(
            ECSRoot::new,
            |mut root| {
                let requests = root.requests();
                for id in 0..AGENTS_SMALL as u32 {
                    requests.build(defs.agent, id, 1).unwrap();
                }
                root.submit();
                root
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("build_10k_preallocated", |b| {
        b.iter_batched(
            || {
                let mut root = ECSRoot::new();
                root.preallocate(defs.agent, 1, AGENTS_SMALL).unwrap();
                root
            },
            |mut root| {
                let requests = root.requests();
                for id in 0..AGENTS_SMALL as u32 {
                    requests.build(defs.agent, id, 1).unwrap();
                }
                root.submit();
                root
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, build_submit_benchmark);
criterion_main!(benches);
