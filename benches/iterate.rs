use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

mod common;
use common::*;

fn iterate_benchmark(c: &mut Criterion) {
    let defs = defs();
    let mut root = populated_root(AGENTS_MED);

    c.bench_function("iterate_100k_mut", |b| {
        b.iter(|| {
            for velocity in root.query_mut::<Velocity>(defs.agent, 1) {
                velocity.dx += black_box(0.5);
            }
        });
    });

    c.bench_function("iterate_100k_parallel", |b| {
        b.iter(|| {
            root.queries()
                .par_for_each_mut::<Velocity, _>(defs.agent, 1, |velocity| {
                    velocity.dy += black_box(0.5);
                });
        });
    });
}

criterion_group!(benches, iterate_benchmark);
criterion_main!(benches);
