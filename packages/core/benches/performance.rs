//! Performance benchmarks for sinoptico core operations
//!
//! Run with: `cargo bench -p sinoptico-core`
//!
//! These benchmarks measure the read path:
//! - Forest assembly from a flat family (wide and deep shapes)
//! - Depth-first flattening for rendering/export
//! - A full `build_forest` round through `MemoryStore`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Map};
use sinoptico_core::models::{Node, NodeKind};
use sinoptico_core::services::{assemble_forest, flatten, TreeBuilder};
use sinoptico_core::MemoryStore;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Product with `width` subproducts, each holding `width` supplies, in shuffled order
fn wide_family(width: usize) -> Vec<Node> {
    let mut nodes = vec![Node::new_with_id("root", NodeKind::Product, Map::new()).with_root("root")];

    for s in 0..width {
        let sub_id = format!("sub-{}", s);
        nodes.push(
            Node::new_with_id(sub_id.clone(), NodeKind::Subproduct, Map::new())
                .with_parent("root", "root")
                .with_order(((s * 7) % width) as i64),
        );
        for i in 0..width {
            nodes.push(
                Node::new_with_id(format!("{}-sup-{}", sub_id, i), NodeKind::Supply, Map::new())
                    .with_parent(sub_id.clone(), "root")
                    .with_order((width - i) as i64)
                    .with_attribute("name", json!(format!("Supply {}", i))),
            );
        }
    }

    nodes
}

/// Single chain of subproducts `depth` levels deep
fn deep_family(depth: usize) -> Vec<Node> {
    let mut nodes = vec![Node::new_with_id("n0", NodeKind::Product, Map::new()).with_root("n0")];
    for d in 1..depth {
        nodes.push(
            Node::new_with_id(format!("n{}", d), NodeKind::Subproduct, Map::new())
                .with_parent(format!("n{}", d - 1), "n0"),
        );
    }
    nodes
}

fn bench_assemble_forest(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble_forest");

    for width in [10usize, 30, 60] {
        let nodes = wide_family(width);
        group.bench_with_input(BenchmarkId::new("wide", nodes.len()), &nodes, |b, nodes| {
            b.iter(|| black_box(assemble_forest(nodes.clone())))
        });
    }

    let nodes = deep_family(1_000);
    group.bench_with_input(BenchmarkId::new("deep", nodes.len()), &nodes, |b, nodes| {
        b.iter(|| black_box(assemble_forest(nodes.clone())))
    });

    group.finish();
}

fn bench_flatten(c: &mut Criterion) {
    let forest = assemble_forest(wide_family(60));

    c.bench_function("flatten_wide_3661", |b| {
        b.iter(|| black_box(flatten(black_box(&forest.roots)).len()))
    });
}

fn bench_build_forest_memory_store(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let store = Arc::new(MemoryStore::with_nodes(wide_family(30)));
    let builder = TreeBuilder::new(store);

    c.bench_function("build_forest_memory_store_931", |b| {
        b.iter(|| {
            rt.block_on(async {
                let forest = builder.build_forest("root").await.unwrap();
                black_box(forest)
            })
        })
    });
}

criterion_group!(
    benches,
    bench_assemble_forest,
    bench_flatten,
    bench_build_forest_memory_store
);
criterion_main!(benches);
