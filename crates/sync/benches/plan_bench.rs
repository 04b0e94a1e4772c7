//! Differ performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use quill_core::{hash_bytes, FileEntry, Snapshot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sync::compute_sync_plan;

fn entry(index: usize, revision: u64) -> FileEntry {
    let path = format!("posts/post-{:05}.md", index);
    let content = format!("{} r{}", path, revision);
    FileEntry::new(path, hash_bytes(content.as_bytes()), content.len() as u64, 0)
}

fn base_snapshot(count: usize) -> Snapshot {
    Snapshot::from_entries((0..count).map(|index| entry(index, 0)))
}

/// Derive a diverged side: `edits` re-hashed entries and `deletes` removals
fn diverge(base: &Snapshot, count: usize, edits: usize, deletes: usize, seed: u64) -> Snapshot {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut snapshot = base.clone();
    for _ in 0..edits {
        snapshot.insert(entry(rng.gen_range(0..count), rng.gen()));
    }
    for _ in 0..deletes {
        snapshot.remove(&format!("posts/post-{:05}.md", rng.gen_range(0..count)));
    }
    snapshot
}

fn bench_plan_no_change(c: &mut Criterion) {
    let manifest = base_snapshot(1000);
    let client = manifest.clone();
    let server = manifest.clone();

    c.bench_function("plan_no_change_1k", |b| {
        b.iter(|| {
            black_box(compute_sync_plan(
                black_box(&client),
                black_box(&manifest),
                black_box(&server),
            ))
        });
    });
}

fn bench_plan_divergent(c: &mut Criterion) {
    let manifest = base_snapshot(1000);
    // ~10% edits and a few deletes on each side; overlapping indices
    // produce conflicts and delete-modify pairs
    let client = diverge(&manifest, 1000, 100, 10, 1);
    let server = diverge(&manifest, 1000, 100, 10, 2);

    c.bench_function("plan_divergent_1k", |b| {
        b.iter(|| {
            black_box(compute_sync_plan(
                black_box(&client),
                black_box(&manifest),
                black_box(&server),
            ))
        });
    });
}

fn bench_plan_large(c: &mut Criterion) {
    let manifest = base_snapshot(10_000);
    let client = diverge(&manifest, 10_000, 500, 50, 3);
    let server = diverge(&manifest, 10_000, 500, 50, 4);

    c.bench_function("plan_divergent_10k", |b| {
        b.iter(|| {
            black_box(compute_sync_plan(
                black_box(&client),
                black_box(&manifest),
                black_box(&server),
            ))
        });
    });
}

criterion_group!(
    benches,
    bench_plan_no_change,
    bench_plan_divergent,
    bench_plan_large
);
criterion_main!(benches);
