use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use batchq::domain::models::{DispatchQueue, TaskPriority};

const TIERS: [TaskPriority; 4] = [
    TaskPriority::Low,
    TaskPriority::Normal,
    TaskPriority::High,
    TaskPriority::Urgent,
];

fn filled(size: usize) -> DispatchQueue<usize> {
    let mut queue = DispatchQueue::new();
    for i in 0..size {
        queue.enqueue(i, TIERS[i % TIERS.len()]);
    }
    queue
}

fn bench_enqueue_dequeue(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_queue");

    for size in [100_usize, 1_000, 10_000] {
        for priority_enabled in [true, false] {
            let label = if priority_enabled { "priority" } else { "fifo" };
            group.bench_with_input(BenchmarkId::new(label, size), &size, |b, &size| {
                b.iter(|| {
                    let mut queue = filled(size);
                    while let Some(item) = queue.dequeue(priority_enabled) {
                        black_box(item);
                    }
                });
            });
        }
    }

    group.finish();
}

fn bench_remove_matching(c: &mut Criterion) {
    c.bench_function("dispatch_queue/remove_one_of_10000", |b| {
        b.iter_batched(
            || filled(10_000),
            |mut queue| black_box(queue.remove_matching(|item| *item == 5_000)),
            criterion::BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_enqueue_dequeue, bench_remove_matching);
criterion_main!(benches);
