use criterion::{Criterion, black_box, criterion_group, criterion_main};
use sift::{
    CompileOptions, FieldType, SchemaCatalog, SchemaDef, compile, compile_ast, parse, scan,
};

fn catalog() -> SchemaCatalog {
    SchemaCatalog::new()
        .with_schema(
            "events",
            SchemaDef::new("events")
                .field("status", FieldType::Text)
                .field("priority", FieldType::Integer)
                .field("time_start", FieldType::UtcDatetime)
                .field("title", FieldType::Text)
                .field("content", FieldType::Text)
                .belongs_to("organization", "organizations", "organization_id", "id")
                .many_to_many("tags", "tags", "events_tags", "event_id", "tag_id"),
        )
        .with_schema(
            "organizations",
            SchemaDef::new("organizations").field("name", FieldType::Text),
        )
        .with_schema("tags", SchemaDef::new("tags").field("name", FieldType::Text))
}

const QUERY: &str = "search words (status:live OR status:draft) AND priority>=3 \
                     AND time_start>2025-08-07 AND organization.name:Bea* \
                     AND status NOT IN (archived, NULL)";

fn bench_scan(c: &mut Criterion) {
    c.bench_function("scan_query", |b| {
        b.iter(|| scan(black_box(QUERY)).unwrap())
    });
}

fn bench_parse(c: &mut Criterion) {
    let tokens = scan(QUERY).unwrap();
    c.bench_function("parse_tokens", |b| {
        b.iter(|| parse(black_box(&tokens)).unwrap())
    });
}

fn bench_lower(c: &mut Criterion) {
    let catalog = catalog();
    let opts = CompileOptions::new("events")
        .with_search_fields(vec!["title".to_string(), "content".to_string()]);
    let node = parse(&scan(QUERY).unwrap()).unwrap();
    c.bench_function("lower_ast", |b| {
        b.iter(|| compile_ast(black_box(&node), black_box(&catalog), black_box(&opts)).unwrap())
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let catalog = catalog();
    let opts = CompileOptions::new("events")
        .with_search_fields(vec!["title".to_string(), "content".to_string()]);
    c.bench_function("compile_query", |b| {
        b.iter(|| compile(black_box(QUERY), black_box(&catalog), black_box(&opts)).unwrap())
    });
}

criterion_group!(
    compile_paths,
    bench_scan,
    bench_parse,
    bench_lower,
    bench_full_pipeline
);
criterion_main!(compile_paths);
