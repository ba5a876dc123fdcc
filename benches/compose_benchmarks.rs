//! Benchmarks for entity query composition.
//!
//! Covers the three stages a request goes through:
//! - schema lookup (tables, columns, limitations)
//! - join planning over the predicate pool
//! - full composition plus SQL compilation
//!
//! Run with: `cargo bench`

use adsql::schema::{self, EntityKind, Params};
use adsql::sql::{compile_select, plan_joins};
use adsql::{compose_select, BuilderConfig, EntityQuery};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

// ---------------------------------------------------------------------------
// Requests organized by join depth
// ---------------------------------------------------------------------------

fn requests() -> Vec<(&'static str, EntityQuery)> {
    vec![
        (
            "placement_by_advertiser",
            EntityQuery::new(EntityKind::Placement).param("advertiser_id", "5"),
        ),
        (
            "zone_by_agency",
            EntityQuery::new(EntityKind::Zone).param("agency_id", "3"),
        ),
        (
            "ad_all_fields",
            EntityQuery::new(EntityKind::Ad)
                .param("agency_id", "1")
                .param("ad_width", "468")
                .all_fields(true),
        ),
        (
            "history_day",
            EntityQuery::new(EntityKind::HistoryDay)
                .param("agency_id", "1")
                .param("publisher_id", "2")
                .param("day_begin", "2024-01-01")
                .param("day_end", "2024-01-31"),
        ),
        (
            "stats_by_entity",
            EntityQuery::new(EntityKind::StatsByEntity)
                .param("agency_id", "1")
                .param("include", vec!["advertiser_id", "placement_id", "publisher_id"]),
        ),
        (
            "publisher_with_stats",
            EntityQuery::new(EntityKind::Publisher)
                .param("agency_id", "1")
                .include_stats(true),
        ),
    ]
}

// ---------------------------------------------------------------------------
// Benchmark groups
// ---------------------------------------------------------------------------

fn bench_schema(c: &mut Criterion) {
    let mut group = c.benchmark_group("schema");
    let config = BuilderConfig::default();

    for (name, query) in &requests() {
        group.bench_with_input(BenchmarkId::new("lookup", name), query, |b, query| {
            b.iter(|| {
                let tables = schema::tables(query.kind, &query.params, query.include_stats).unwrap();
                let columns = schema::columns(query.kind, &query.params, query.all_fields, &config);
                let filters = schema::limitations(query.kind, &query.params);
                black_box((tables, columns, filters))
            });
        });
    }

    group.finish();
}

fn bench_planning(c: &mut Criterion) {
    let mut group = c.benchmark_group("planning");
    let config = BuilderConfig::default();

    for (name, query) in &requests() {
        let tables = schema::tables(query.kind, &query.params, query.include_stats).unwrap();
        let mut pool = schema::limitations(query.kind, &query.params);
        pool.extend(schema::structural_joins(&tables));
        let refs = tables.table_refs(&config);

        group.bench_with_input(
            BenchmarkId::new("plan_joins", name),
            &(refs, pool),
            |b, (refs, pool)| {
                b.iter(|| plan_joins(black_box(refs.clone()), &[], black_box(pool.clone())).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose");
    let config = BuilderConfig::default();

    for (name, query) in &requests() {
        group.bench_with_input(BenchmarkId::new("to_sql", name), query, |b, query| {
            b.iter(|| compile_select(&compose_select(black_box(query), &config).unwrap()));
        });
    }

    group.finish();
}

fn bench_all_entities(c: &mut Criterion) {
    let config = BuilderConfig::default();
    let queries: Vec<EntityQuery> = EntityKind::ALL
        .iter()
        .map(|kind| EntityQuery::new(*kind).params(Params::new().with("agency_id", "1")))
        .collect();

    c.bench_function("compose_every_entity", |b| {
        b.iter(|| {
            for query in &queries {
                black_box(compose_select(query, &config).unwrap());
            }
        });
    });
}

criterion_group!(
    benches,
    bench_schema,
    bench_planning,
    bench_compose,
    bench_all_entities
);
criterion_main!(benches);
