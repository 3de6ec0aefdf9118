use criterion::{criterion_group, criterion_main, Criterion};
use http::Method;
use std::hint::black_box;
use swagrouter::router::RouteTree;
use swagrouter::signature::SignatureCompiler;
use swagrouter::spec::{Catalog, Location, Operation};
use swagrouter::validator::validate;
use swagrouter::value::{Map, Value};

const ROUTES: &[&str] = &[
    "zoo/animals",
    "zoo/animals/is-x-integer-id",
    "zoo/animals/is-x-string-slug",
    "zoo/animals/is-x-integer-id/toys/is-x-integer-toyId",
    "zoo/is-x-string-category/animals/is-x-integer-id/habitats/is-x-integer-habitatId/sections/is-x-integer-sectionId",
    "inventory/is-x-integer-warehouseId/feeds/is-x-integer-feedId/items/is-x-integer-itemId/batches/is-x-integer-batchId",
    "complex/is-x-integer-a/is-x-integer-b/is-x-integer-c/is-x-integer-d/is-x-integer-e/is-x-integer-f",
    "zoo/health",
];

fn zoo_tree() -> RouteTree<&'static str> {
    let mut tree = RouteTree::new("is-x-");
    for path in ROUTES {
        tree.insert(path, Method::GET, *path)
            .expect("failed to register route");
    }
    tree
}

fn bench_route_resolution(c: &mut Criterion) {
    let tree = zoo_tree();
    let paths: Vec<Vec<&str>> = [
        "zoo/animals/123",
        "zoo/animals/rex",
        "zoo/animals/123/toys/456",
        "zoo/cats/animals/123/habitats/88/sections/5",
        "inventory/1/feeds/2/items/3/batches/4",
        "complex/1/2/3/4/5/6/extra/segments",
    ]
    .iter()
    .map(|p| p.split('/').collect())
    .collect();

    c.bench_function("route_resolve", |b| {
        b.iter(|| {
            for segments in &paths {
                let found = tree.resolve(segments);
                black_box(&found);
            }
        })
    });
}

fn bench_query_validation(c: &mut Criterion) {
    let operation = Operation::from_yaml_str(
        r#"
parameters:
  - {in: query, name: ids, type: array, collectionFormat: csv, items: {type: integer}}
  - {in: query, name: limit, type: integer, minimum: 1, maximum: 100, default: 20}
  - {in: query, name: order, type: string, enum: [asc, desc]}
  - {in: query, name: since, type: string, format: date}
"#,
    )
    .expect("failed to parse operation");
    let catalog = Catalog::default();
    let signature = SignatureCompiler::new(&catalog, "is-x-")
        .compile_incoming(&operation, Location::Query)
        .expect("failed to compile signature");

    let mut query = Map::new();
    query.insert("ids".to_string(), Value::from("1,2,3,4,5"));
    query.insert("order".to_string(), Value::from("desc"));
    query.insert("since".to_string(), Value::from("2024-02-29"));

    c.bench_function("query_validate", |b| {
        b.iter(|| {
            let mut data = query.clone();
            let report = validate(&mut data, &signature, true, false);
            black_box(report.all_valid());
        })
    });
}

criterion_group!(benches, bench_route_resolution, bench_query_validation);
criterion_main!(benches);
