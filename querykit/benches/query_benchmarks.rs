/*!
# Query Benchmarks

Benchmarks for the pure parts of the engine: parameter extraction, range
resolution, tokenizing and statement building. No database is involved.

## Usage

```bash
cargo bench --bench query_benchmarks

# Run one group
cargo bench --bench query_benchmarks -- "Search Tokenizer"

# Quick benchmark with fewer samples
cargo bench --bench query_benchmarks -- --quick
```

HTML reports are generated in `target/criterion/report/index.html`.
*/

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use querykit::{
    FilterType, QueryDefinition, RawParams, SearchRelation, SortOrder, resolve_range, tokenize,
};
use sea_orm::{DbBackend, QueryTrait, entity::prelude::*};
use std::hint::black_box;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "benchmark_tasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: i32,
    pub created_by: Option<i32>,
    pub created_at: DateTimeUtc,
    pub due_date: Option<Date>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn definition() -> QueryDefinition<Entity> {
    QueryDefinition::<Entity>::builder()
        .filter("global", FilterType::GlobalSearch)
        .filter("search", FilterType::SimpleSearch)
        .filter("status", FilterType::Exact)
        .filter("priority", FilterType::Exact)
        .filter("title", FilterType::Partial)
        .range("date", "created_at")
        .range("due", "due_date")
        .range("priority", "priority")
        .default_sort("priority", SortOrder::Desc)
        .global_search_columns(["title", "description"])
        .search_relation(
            SearchRelation::belongs_to("creator", "users", "created_by").columns(["name", "email"]),
        )
        .simple_search_field("title")
        .build()
        .expect("benchmark definition is valid")
}

const QUERIES: [(&str, &str); 3] = [
    ("empty", ""),
    ("filters", "status=pending&priority=3&title=report&page=2&per_page=25"),
    (
        "everything",
        "global=quarterly+report+draft&status=pending&date_start=2024-01-01&date_end=2024-12-31&due_min=2024-02-01&priority_max=4&sort_by=due_date&sort_order=asc",
    ),
];

fn bench_extraction(c: &mut Criterion) {
    let definition = definition();
    let mut group = c.benchmark_group("Parameter Extractor");

    for (name, query) in QUERIES {
        let raw = RawParams::from_query(query);
        group.bench_with_input(BenchmarkId::new("extract", name), &raw, |b, raw| {
            b.iter(|| definition.extract(black_box(raw)));
        });
        group.bench_with_input(BenchmarkId::new("from_query", name), &query, |b, query| {
            b.iter(|| RawParams::from_query(black_box(query)));
        });
    }

    group.finish();
}

fn bench_range_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("Range Resolver");
    let cases = [
        ("suffix_dates", "date_start=2024-01-01&date_end=2024-02-01"),
        ("prefix_dates", "start_date=2024-01-01&end_date=2024-02-01"),
        ("numbers", "min_date=1&date_max=10"),
        ("missing", "page=1"),
    ];

    for (name, query) in cases {
        let raw = RawParams::from_query(query);
        group.bench_with_input(BenchmarkId::new("resolve_range", name), &raw, |b, raw| {
            b.iter(|| resolve_range(black_box(raw), "date"));
        });
    }

    group.finish();
}

fn bench_tokenizer(c: &mut Criterion) {
    let mut group = c.benchmark_group("Search Tokenizer");
    let inputs = [
        ("short", "proj alpha"),
        ("punctuated", "  foo   bar-baz  qux_quux 100% done!  "),
        ("long", "lorem ipsum dolor sit amet consectetur adipiscing elit sed do eiusmod tempor"),
    ];

    for (name, input) in inputs {
        group.bench_with_input(BenchmarkId::new("tokenize", name), &input, |b, input| {
            b.iter(|| tokenize(black_box(input)));
        });
    }

    group.finish();
}

fn bench_statement_building(c: &mut Criterion) {
    let definition = definition();
    let mut group = c.benchmark_group("Query Pipeline");

    for (name, query) in QUERIES {
        let raw = RawParams::from_query(query);
        group.bench_with_input(BenchmarkId::new("apply_and_build", name), &raw, |b, raw| {
            b.iter(|| {
                let (_, listing) = definition.listing(black_box(raw));
                listing.into_select().build(DbBackend::Postgres)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_extraction,
    bench_range_resolution,
    bench_tokenizer,
    bench_statement_building
);
criterion_main!(benches);
