//! Performance benchmarks for tirelire-engine

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tirelire_engine::model::{AppState, Goal, Job, JobStatus, Transaction, TransactionKind};
use tirelire_engine::{fingerprint, merge, reduce, storage, Action, Timestamp};

fn ts() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn tx(id: u64) -> Transaction {
    Transaction {
        id: format!("t{id}"),
        kind: TransactionKind::Income,
        amount: (id % 50) as f64 + 0.5,
        category: "argent de poche".into(),
        label: format!("transaction {id}"),
        date: ts(),
        notes: None,
    }
}

fn populated_state(size: u64) -> AppState {
    let mut state = AppState {
        transactions: (0..size).map(tx).collect(),
        goals: (0..size / 10)
            .map(|i| Goal {
                id: format!("g{i}"),
                name: format!("goal {i}"),
                target_amount: 100.0,
                current_amount: i as f64,
                created_at: ts(),
                image_url: None,
            })
            .collect(),
        jobs: (0..size / 10)
            .map(|i| Job {
                id: format!("j{i}"),
                title: format!("job {i}"),
                description: String::new(),
                reward: 2.0,
                status: JobStatus::Available,
                created_at: ts(),
                accepted_at: None,
                completed_at: None,
                icon: None,
                transaction_id: None,
                frequency: Default::default(),
                requires_validation: true,
            })
            .collect(),
        ..Default::default()
    };
    for i in 0..size / 20 {
        state.deleted_ids.transactions.push(format!("dead{i}"));
    }
    state
}

fn bench_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("reduce");

    group.bench_function("add_transaction", |b| {
        let state = populated_state(500);
        let mut id = 10_000u64;
        b.iter(|| {
            id += 1;
            reduce(black_box(state.clone()), Action::AddTransaction(tx(id)))
        })
    });

    group.bench_function("delete_transaction", |b| {
        let state = populated_state(500);
        b.iter(|| {
            reduce(
                black_box(state.clone()),
                Action::DeleteTransaction("t250".into()),
            )
        })
    });

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    for size in [100, 500, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("disjoint", size), size, |b, &size| {
            let local = populated_state(size);
            let mut remote = populated_state(size);
            for t in &mut remote.transactions {
                t.id = format!("r-{}", t.id);
            }
            b.iter(|| merge(black_box(&local), black_box(&remote)))
        });

        group.bench_with_input(BenchmarkId::new("overlapping", size), size, |b, &size| {
            let local = populated_state(size);
            let remote = populated_state(size);
            b.iter(|| merge(black_box(&local), black_box(&remote)))
        });
    }

    group.finish();
}

fn bench_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint");

    for size in [100, 500, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("digest", size), size, |b, &size| {
            let state = populated_state(size);
            b.iter(|| fingerprint(black_box(&state)))
        });
    }

    group.finish();
}

fn bench_storage(c: &mut Criterion) {
    let mut group = c.benchmark_group("storage");

    group.bench_function("save_state", |b| {
        let state = populated_state(500);
        b.iter(|| storage::save_state(black_box(&state)))
    });

    group.bench_function("load_state", |b| {
        let json = storage::save_state(&populated_state(500)).unwrap();
        b.iter(|| storage::load_state(black_box(&json)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_reduce,
    bench_merge,
    bench_fingerprint,
    bench_storage,
);
criterion_main!(benches);
