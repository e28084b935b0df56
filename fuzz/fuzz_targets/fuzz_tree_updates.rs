#![no_main]

use std::collections::HashMap;
use std::sync::Arc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pivot_core::{MAX_CHILD_INDEX, MAX_PATH_DEPTH, Path, PivotNode, apply_update};
use pivot_layout::{LayoutEngine, Position, PositionCache};

#[derive(Debug, Arbitrary)]
struct Update {
    path: Vec<u16>,
    year: u16,
}

fuzz_target!(|updates: Vec<Update>| {
    let engine = LayoutEngine::default();
    let mut cache = PositionCache::new();
    let mut pinned: HashMap<String, Position> = HashMap::new();
    let mut root: Option<Arc<PivotNode>> = None;

    for update in updates.iter().take(16) {
        let segments: Vec<usize> = update.path.iter().map(|&i| usize::from(i)).collect();
        let in_bounds = segments.len() <= MAX_PATH_DEPTH
            && segments.iter().all(|&index| index <= MAX_CHILD_INDEX);
        let Ok(path) = Path::try_from(segments) else {
            assert!(!in_bounds, "addressable path rejected");
            continue;
        };
        assert!(in_bounds, "unaddressable path accepted");
        let node = Arc::new(PivotNode::new(update.year.to_string(), "fuzz"));
        let before = root.as_deref().cloned();
        let next = apply_update(root.as_ref(), &path, Arc::clone(&node));

        // Inputs are never mutated.
        assert_eq!(root.as_deref(), before.as_ref(), "apply_update mutated its input");
        // Idempotence.
        assert_eq!(
            apply_update(Some(&next), &path, node),
            next,
            "reapplying the same update changed the tree"
        );
        // Every ancestor of the path exists.
        assert!(next.get(path.segments()).is_some(), "updated node unreachable");

        root = Some(next);
        let model = engine.layout(root.as_ref(), &mut cache);
        let count = root.as_ref().map_or(0, |r| r.node_count());
        assert_eq!(model.nodes.len(), count);
        assert_eq!(model.edges.len(), count - 1);
        assert!(model.nodes.iter().filter(|n| n.is_newest()).count() <= 1);

        // A path keeps its first position for as long as the cache lives.
        for node in &model.nodes {
            let first = *pinned.entry(node.id.to_string()).or_insert(node.position);
            assert_eq!(first, node.position, "position of {} moved", node.id);
        }
    }
});
