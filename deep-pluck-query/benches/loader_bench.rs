//! Benchmarks for merging and batched loading.
//!
//! - `combine`: attaching child rows to parents for one association
//! - `load_all`: a two-level pluck over the in-memory store

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use tokio::runtime::Runtime;

use deep_pluck_query::relations::{AssociationResolver, combine_data};
use deep_pluck_query::{
    AssociationSpec, EntitySpec, MemoryStore, MultipleMatchPolicy, Pluck, PluckSpec, Row, Schema,
    row,
};

fn create_runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap()
}

fn schema() -> Schema {
    Schema::new()
        .entity(
            EntitySpec::new("User", "users")
                .association(AssociationSpec::has_many("posts", "Post")),
        )
        .entity(
            EntitySpec::new("Post", "posts")
                .association(AssociationSpec::has_many("post_comments", "PostComment")),
        )
        .entity(EntitySpec::new("PostComment", "post_comments"))
}

fn users(n: i64) -> Vec<Row> {
    (1..=n).map(|id| row! { "id" => id, "name" => format!("user{}", id) }).collect()
}

fn posts(n: i64, per_user: i64) -> Vec<Row> {
    (0..n * per_user)
        .map(|i| row! { "id" => i + 1, "user_id" => i / per_user + 1, "title" => format!("post{}", i) })
        .collect()
}

// ============================================================================
// Combine Benchmarks
// ============================================================================

fn bench_combine(c: &mut Criterion) {
    let mut group = c.benchmark_group("combine");
    let facts = schema().resolve("User", "posts").unwrap();

    for num_users in [10_i64, 100, 1_000].iter() {
        group.throughput(Throughput::Elements(*num_users as u64));
        let parents = users(*num_users);
        let children = posts(*num_users, 5);

        group.bench_with_input(
            BenchmarkId::new("has_many", num_users),
            num_users,
            |b, _| {
                b.iter(|| {
                    let mut parents = parents.clone();
                    combine_data(
                        &mut parents,
                        children.clone(),
                        &facts,
                        MultipleMatchPolicy::Error,
                    )
                    .unwrap();
                    black_box(parents)
                })
            },
        );
    }

    group.finish();
}

// ============================================================================
// Load Benchmarks
// ============================================================================

fn bench_load_all(c: &mut Criterion) {
    let rt = create_runtime();
    let schema = schema();
    let mut group = c.benchmark_group("load_all");

    for num_users in [10_i64, 100, 1_000].iter() {
        group.throughput(Throughput::Elements(*num_users as u64));

        let store = MemoryStore::new();
        store.insert_many("users", users(*num_users));
        store.insert_many("posts", posts(*num_users, 5));
        store.insert_many(
            "post_comments",
            (1..=*num_users * 5).map(|post_id| row! { "post_id" => post_id, "comment" => "nice" }),
        );

        group.bench_with_input(
            BenchmarkId::new("two_levels", num_users),
            num_users,
            |b, _| {
                b.to_async(&rt).iter(|| async {
                    let spec = PluckSpec::from("name")
                        .and(("posts", PluckSpec::from("title").and(("post_comments", "comment"))));
                    let rows = Pluck::new(store.relation("User", "users"), &schema)
                        .add(spec)
                        .unwrap()
                        .load_all()
                        .await
                        .unwrap();
                    black_box(rows)
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_combine, bench_load_all);

criterion_main!(benches);
