//! Benchmark for PersistentSequence vs standard Vec.
//!
//! Compares the persistent sequence against Vec and VecDeque for the
//! operations where the finger tree claims an asymptotic edge.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use perseq::PersistentSequence;
use std::collections::VecDeque;
use std::hint::black_box;

// =============================================================================
// push at both ends
// =============================================================================

fn benchmark_push_back(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("push_back");

    for size in [100, 1000, 10000] {
        group.bench_with_input(
            BenchmarkId::new("PersistentSequence", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut sequence = PersistentSequence::new();
                    for value in 0..size {
                        sequence = sequence.push_back(black_box(value));
                    }
                    black_box(sequence)
                });
            },
        );

        group.bench_with_input(BenchmarkId::new("Vec", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let mut vec = Vec::new();
                for value in 0..size {
                    vec.push(black_box(value));
                }
                black_box(vec)
            });
        });
    }

    group.finish();
}

fn benchmark_push_front(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("push_front");

    for size in [100, 1000, 10000] {
        group.bench_with_input(
            BenchmarkId::new("PersistentSequence", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut sequence = PersistentSequence::new();
                    for value in 0..size {
                        sequence = sequence.push_front(black_box(value));
                    }
                    black_box(sequence)
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("VecDeque", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut deque = VecDeque::new();
                    for value in 0..size {
                        deque.push_front(black_box(value));
                    }
                    black_box(deque)
                });
            },
        );
    }

    group.finish();
}

// =============================================================================
// random access
// =============================================================================

fn benchmark_get(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("get");

    for size in [100, 1000, 10000] {
        let sequence: PersistentSequence<usize> = (0..size).collect();
        group.bench_with_input(
            BenchmarkId::new("PersistentSequence", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut total = 0usize;
                    for index in (0..size).step_by(7) {
                        total += sequence.get(black_box(index)).unwrap();
                    }
                    black_box(total)
                });
            },
        );
    }

    group.finish();
}

// =============================================================================
// concat and split
// =============================================================================

fn benchmark_concat(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("concat");

    for size in [100, 1000, 10000] {
        let left: PersistentSequence<usize> = (0..size).collect();
        let right: PersistentSequence<usize> = (size..2 * size).collect();
        group.bench_with_input(
            BenchmarkId::new("PersistentSequence", size),
            &size,
            |bencher, _| {
                bencher.iter(|| black_box(left.concat(&right)));
            },
        );

        let left_vec: Vec<usize> = (0..size).collect();
        let right_vec: Vec<usize> = (size..2 * size).collect();
        group.bench_with_input(BenchmarkId::new("Vec", size), &size, |bencher, _| {
            bencher.iter(|| {
                let mut joined = left_vec.clone();
                joined.extend_from_slice(&right_vec);
                black_box(joined)
            });
        });
    }

    group.finish();
}

fn benchmark_split_at(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("split_at");

    for size in [100, 1000, 10000] {
        let sequence: PersistentSequence<usize> = (0..size).collect();
        group.bench_with_input(
            BenchmarkId::new("PersistentSequence", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| black_box(sequence.split_at((size / 2) as isize)));
            },
        );
    }

    group.finish();
}

// =============================================================================
// iteration
// =============================================================================

fn benchmark_iteration(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("iteration");

    for size in [100, 1000, 10000] {
        let sequence: PersistentSequence<usize> = (0..size).collect();
        group.bench_with_input(
            BenchmarkId::new("PersistentSequence", size),
            &size,
            |bencher, _| {
                bencher.iter(|| black_box(sequence.iter().sum::<usize>()));
            },
        );
    }

    group.finish();
}

// =============================================================================
// Criterion Group and Main
// =============================================================================

criterion_group!(
    benches,
    benchmark_push_back,
    benchmark_push_front,
    benchmark_get,
    benchmark_concat,
    benchmark_split_at,
    benchmark_iteration
);

criterion_main!(benches);
