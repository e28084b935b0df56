//! Commit-on-change reconciliation of render models.
//!
//! Every layout pass builds fresh nodes and edges, even when an update landed
//! somewhere that changes nothing visible. [`Reconciler::commit`] compares the
//! fresh lists element by element (deep equality on id, kind, position, and
//! content) against what is currently committed and keeps the old allocation
//! when they match, so a downstream renderer keyed on list identity does no
//! work.

use std::sync::Arc;

use pivot_core::NodeId;
use rustc_hash::FxHashMap;

use crate::model::{RenderEdge, RenderModel, RenderNode};

/// Return `previous` if `fresh` is structurally equal to it, otherwise a new
/// list built from `fresh`.
///
/// The result of an equal comparison is the *same* allocation as `previous`.
pub fn reconcile<T: PartialEq>(previous: &Arc<[T]>, fresh: Vec<T>) -> Arc<[T]> {
    if previous[..] == fresh[..] {
        Arc::clone(previous)
    } else {
        Arc::from(fresh)
    }
}

/// Outcome for one list of a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListCommit {
    /// Fresh list was equal; the previous list stays current.
    Kept,
    /// Fresh list differed and is now current.
    Replaced,
}

/// Which ids differ between the previous and the newly committed model.
///
/// Empty when nothing was replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelDiff {
    /// Node ids absent from the previous model.
    pub added: Vec<NodeId>,
    /// Node ids present in both models whose render node differs.
    pub changed: Vec<NodeId>,
    /// Node ids present before but not anymore.
    pub removed: Vec<NodeId>,
    /// Edge ids absent from the previous model.
    pub edges_added: Vec<String>,
    /// Edge ids present before but not anymore.
    pub edges_removed: Vec<String>,
}

impl ModelDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.changed.is_empty()
            && self.removed.is_empty()
            && self.edges_added.is_empty()
            && self.edges_removed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub nodes: ListCommit,
    pub edges: ListCommit,
    pub diff: ModelDiff,
}

impl Commit {
    /// True when neither list was replaced.
    pub fn is_unchanged(&self) -> bool {
        self.nodes == ListCommit::Kept && self.edges == ListCommit::Kept
    }
}

/// Holds the currently committed render model.
#[derive(Debug)]
pub struct Reconciler {
    nodes: Arc<[RenderNode]>,
    edges: Arc<[RenderEdge]>,
    kept: u64,
    replaced: u64,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self {
            nodes: Arc::from(Vec::new()),
            edges: Arc::from(Vec::new()),
            kept: 0,
            replaced: 0,
        }
    }
}

impl Reconciler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently committed nodes.
    pub fn nodes(&self) -> &Arc<[RenderNode]> {
        &self.nodes
    }

    /// Currently committed edges.
    pub fn edges(&self) -> &Arc<[RenderEdge]> {
        &self.edges
    }

    /// Offer a freshly computed model; commit only the lists that changed.
    pub fn commit(&mut self, fresh: RenderModel) -> Commit {
        let RenderModel { nodes, edges } = fresh;

        let next_nodes = reconcile(&self.nodes, nodes);
        let next_edges = reconcile(&self.edges, edges);
        let nodes_commit = list_commit(&self.nodes, &next_nodes);
        let edges_commit = list_commit(&self.edges, &next_edges);

        let diff = if nodes_commit == ListCommit::Kept && edges_commit == ListCommit::Kept {
            ModelDiff::default()
        } else {
            diff_models(&self.nodes, &next_nodes, &self.edges, &next_edges)
        };

        self.nodes = next_nodes;
        self.edges = next_edges;

        let commit = Commit {
            nodes: nodes_commit,
            edges: edges_commit,
            diff,
        };
        if commit.is_unchanged() {
            self.kept += 1;
        } else {
            self.replaced += 1;
        }
        tracing::trace!(
            nodes = ?commit.nodes,
            edges = ?commit.edges,
            added = commit.diff.added.len(),
            changed = commit.diff.changed.len(),
            "reconcile"
        );
        commit
    }

    /// Drop the committed model, e.g. when a new request starts.
    pub fn reset(&mut self) {
        self.nodes = Arc::from(Vec::new());
        self.edges = Arc::from(Vec::new());
    }

    /// Number of commits that kept the previous model.
    pub fn kept(&self) -> u64 {
        self.kept
    }

    /// Number of commits that replaced at least one list.
    pub fn replaced(&self) -> u64 {
        self.replaced
    }
}

fn list_commit<T>(previous: &Arc<[T]>, next: &Arc<[T]>) -> ListCommit {
    if Arc::ptr_eq(previous, next) {
        ListCommit::Kept
    } else {
        ListCommit::Replaced
    }
}

fn diff_models(
    old_nodes: &[RenderNode],
    new_nodes: &[RenderNode],
    old_edges: &[RenderEdge],
    new_edges: &[RenderEdge],
) -> ModelDiff {
    let previous: FxHashMap<&NodeId, &RenderNode> =
        old_nodes.iter().map(|node| (&node.id, node)).collect();

    let mut diff = ModelDiff::default();
    for node in new_nodes {
        match previous.get(&node.id) {
            None => diff.added.push(node.id.clone()),
            Some(old) if *old != node => diff.changed.push(node.id.clone()),
            Some(_) => {}
        }
    }

    let current: FxHashMap<&NodeId, ()> = new_nodes.iter().map(|node| (&node.id, ())).collect();
    diff.removed = old_nodes
        .iter()
        .filter(|node| !current.contains_key(&node.id))
        .map(|node| node.id.clone())
        .collect();

    let previous_edges: FxHashMap<&str, ()> =
        old_edges.iter().map(|edge| (edge.id.as_str(), ())).collect();
    diff.edges_added = new_edges
        .iter()
        .filter(|edge| !previous_edges.contains_key(edge.id.as_str()))
        .map(|edge| edge.id.clone())
        .collect();

    let current_edges: FxHashMap<&str, ()> =
        new_edges.iter().map(|edge| (edge.id.as_str(), ())).collect();
    diff.edges_removed = old_edges
        .iter()
        .filter(|edge| !current_edges.contains_key(edge.id.as_str()))
        .map(|edge| edge.id.clone())
        .collect();
    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LayoutEngine, PositionCache};
    use pivot_core::PivotNode;
    use pretty_assertions::assert_eq;

    fn sample_tree() -> Arc<PivotNode> {
        Arc::new(PivotNode::new("476", "root").with_children([
            PivotNode::new("477", "a"),
            PivotNode::new("478", "b"),
        ]))
    }

    #[test]
    fn reconcile_keeps_previous_allocation_when_equal() {
        let previous: Arc<[u32]> = Arc::from(vec![1, 2, 3]);
        let kept = reconcile(&previous, vec![1, 2, 3]);
        assert!(Arc::ptr_eq(&previous, &kept));

        let replaced = reconcile(&previous, vec![1, 2, 4]);
        assert!(!Arc::ptr_eq(&previous, &replaced));
        assert_eq!(&replaced[..], &[1, 2, 4]);
    }

    #[test]
    fn identical_layouts_keep_committed_lists() {
        let engine = LayoutEngine::default();
        let mut cache = PositionCache::new();
        let tree = sample_tree();
        let mut reconciler = Reconciler::new();

        let first = reconciler.commit(engine.layout(Some(&tree), &mut cache));
        assert_eq!(first.nodes, ListCommit::Replaced);
        let committed_nodes = Arc::clone(reconciler.nodes());
        let committed_edges = Arc::clone(reconciler.edges());

        // A separate pass builds fresh objects for the same tree.
        let second = reconciler.commit(engine.layout(Some(&tree), &mut cache));
        assert!(second.is_unchanged());
        assert!(second.diff.is_empty());
        assert!(Arc::ptr_eq(&committed_nodes, reconciler.nodes()));
        assert!(Arc::ptr_eq(&committed_edges, reconciler.edges()));
        assert_eq!(reconciler.kept(), 1);
        assert_eq!(reconciler.replaced(), 1);
    }

    #[test]
    fn structurally_equal_content_from_distinct_trees_is_kept() {
        let engine = LayoutEngine::default();
        let mut cache = PositionCache::new();
        let mut reconciler = Reconciler::new();

        reconciler.commit(engine.layout(Some(&sample_tree()), &mut cache));
        let commit = reconciler.commit(engine.layout(Some(&sample_tree()), &mut cache));
        assert!(commit.is_unchanged());
    }

    #[test]
    fn content_change_replaces_nodes_but_not_edges() {
        let engine = LayoutEngine::default();
        let mut cache = PositionCache::new();
        let mut reconciler = Reconciler::new();
        reconciler.commit(engine.layout(Some(&sample_tree()), &mut cache));

        let edited = Arc::new(PivotNode::new("476", "root").with_children([
            PivotNode::new("477", "a, revised"),
            PivotNode::new("478", "b"),
        ]));
        let commit = reconciler.commit(engine.layout(Some(&edited), &mut cache));
        assert_eq!(commit.nodes, ListCommit::Replaced);
        assert_eq!(commit.edges, ListCommit::Kept);
        // The root's payload includes its children, so it changes too.
        assert_eq!(
            commit.diff.changed,
            vec![NodeId::root(), NodeId::from_segments(&[0])]
        );
        assert!(commit.diff.added.is_empty());
    }

    #[test]
    fn growth_reports_added_nodes_and_edges() {
        let engine = LayoutEngine::default();
        let mut cache = PositionCache::new();
        let mut reconciler = Reconciler::new();
        reconciler.commit(engine.layout(Some(&sample_tree()), &mut cache));

        let grown = Arc::new(PivotNode::new("476", "root").with_children([
            PivotNode::new("477", "a"),
            PivotNode::new("478", "b"),
            PivotNode::new("479", "c"),
        ]));
        let commit = reconciler.commit(engine.layout(Some(&grown), &mut cache));
        assert_eq!(commit.diff.added, vec![NodeId::from_segments(&[2])]);
        assert_eq!(commit.diff.edges_added, vec!["root->2".to_string()]);
        // Newest cue moved from "1" to "2", so "1" changed as well as root.
        assert!(commit.diff.changed.contains(&NodeId::from_segments(&[1])));
    }

    #[test]
    fn shrinking_snapshot_reports_removed_nodes_and_edges() {
        let engine = LayoutEngine::default();
        let mut cache = PositionCache::new();
        let mut reconciler = Reconciler::new();
        reconciler.commit(engine.layout(Some(&sample_tree()), &mut cache));

        let pruned =
            Arc::new(PivotNode::new("476", "root").with_children([PivotNode::new("477", "a")]));
        let commit = reconciler.commit(engine.layout(Some(&pruned), &mut cache));
        assert_eq!(commit.edges, ListCommit::Replaced);
        assert_eq!(commit.diff.removed, vec![NodeId::from_segments(&[1])]);
        assert_eq!(commit.diff.edges_removed, vec!["root->1".to_string()]);
        assert!(commit.diff.edges_added.is_empty());
    }

    #[test]
    fn reset_empties_committed_model() {
        let engine = LayoutEngine::default();
        let mut reconciler = Reconciler::new();
        reconciler.commit(engine.layout(Some(&sample_tree()), &mut PositionCache::new()));
        reconciler.reset();
        assert!(reconciler.nodes().is_empty());
        assert!(reconciler.edges().is_empty());

        let commit = reconciler.commit(RenderModel::default());
        assert!(commit.is_unchanged());
    }
}
