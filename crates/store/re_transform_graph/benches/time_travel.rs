//! Keeps track of how time-travel queries scale with chain depth and history length.

use criterion::{Criterion, criterion_group, criterion_main};
use re_transform_graph::{
    FrameTransform, Timestamp, TransformTracker, TransformUpdate, UpdateBatch,
};

// ---

criterion_group!(benches, relative_pose_at, apply);
criterion_main!(benches);

// ---

// `cargo test` also runs the benchmark setup code, so make sure they run quickly:
#[cfg(debug_assertions)]
mod constants {
    pub const CHAIN_DEPTH: usize = 2;
    pub const NUM_BATCHES: i64 = 10;
}

#[cfg(not(debug_assertions))]
mod constants {
    pub const CHAIN_DEPTH: usize = 8;
    pub const NUM_BATCHES: i64 = 1_000;
}

#[expect(clippy::wildcard_imports)]
use self::constants::*;

// ---

fn frame_name(depth: usize) -> String {
    if depth == 0 {
        "world".to_owned()
    } else {
        format!("link_{depth}")
    }
}

/// Every batch moves every link of a `CHAIN_DEPTH` long chain, 10ms apart.
fn batches() -> Vec<UpdateBatch> {
    (0..NUM_BATCHES)
        .map(|i| {
            let stamp = Timestamp::from_nanos(i * 10_000_000);
            let updates = (1..=CHAIN_DEPTH)
                .map(|depth| {
                    TransformUpdate::new(
                        frame_name(depth - 1),
                        frame_name(depth),
                        FrameTransform::from_translation([i as f64, depth as f64, 0.0]),
                        stamp,
                    )
                })
                .collect();
            UpdateBatch::new(stamp, updates)
        })
        .collect()
}

fn filled_tracker() -> TransformTracker {
    let mut tracker = TransformTracker::default();
    for batch in batches() {
        tracker.apply(batch);
    }
    tracker
}

fn relative_pose_at(c: &mut Criterion) {
    let tracker = filled_tracker();
    let leaf = frame_name(CHAIN_DEPTH);

    let mut group = c.benchmark_group("time_travel");

    group.bench_function("relative_pose_at/newest", |b| {
        let time = Timestamp::from_nanos((NUM_BATCHES - 1) * 10_000_000);
        b.iter(|| tracker.relative_pose_at(&leaf, "world", time));
    });

    group.bench_function("relative_pose_at/oldest", |b| {
        b.iter(|| tracker.relative_pose_at(&leaf, "world", Timestamp::ZERO));
    });
}

fn apply(c: &mut Criterion) {
    let batches = batches();

    let mut group = c.benchmark_group("time_travel");
    group.throughput(criterion::Throughput::Elements(batches.len() as _));

    group.bench_function("apply", |b| {
        b.iter(|| {
            let mut tracker = TransformTracker::default();
            for batch in batches.clone() {
                tracker.apply(batch);
            }
            tracker
        });
    });
}
