//! Benchmarks for the pivot tree layout engine.
//!
//! Run with: cargo bench -p pivot-layout

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use pivot_core::PivotNode;
use pivot_layout::{LayoutEngine, PositionCache, Reconciler};

/// Complete tree with `fanout` children per node, `depth` levels below root.
fn make_tree(fanout: usize, depth: usize) -> PivotNode {
    let node = PivotNode::new(depth.to_string(), "bench node");
    if depth == 0 {
        return node;
    }
    node.with_children((0..fanout).map(|_| make_tree(fanout, depth - 1)))
}

fn bench_cold_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/cold");
    let engine = LayoutEngine::default();

    for (fanout, depth) in [(2, 6), (3, 5), (5, 3), (20, 2)] {
        let tree = Arc::new(make_tree(fanout, depth));
        group.bench_with_input(
            BenchmarkId::new("fanout_depth", format!("{fanout}x{depth}")),
            &tree,
            |b, tree| {
                b.iter(|| {
                    let mut cache = PositionCache::new();
                    black_box(engine.layout(Some(tree), &mut cache))
                })
            },
        );
    }

    group.finish();
}

fn bench_warm_layout_and_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/warm_reconcile");
    let engine = LayoutEngine::default();

    for (fanout, depth) in [(2, 6), (3, 5)] {
        let tree = Arc::new(make_tree(fanout, depth));
        let mut cache = PositionCache::new();
        let mut reconciler = Reconciler::new();
        reconciler.commit(engine.layout(Some(&tree), &mut cache));

        group.bench_function(BenchmarkId::new("unchanged", format!("{fanout}x{depth}")), |b| {
            b.iter(|| black_box(reconciler.commit(engine.layout(Some(&tree), &mut cache))))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_cold_layout, bench_warm_layout_and_reconcile);
criterion_main!(benches);
