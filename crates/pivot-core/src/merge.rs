//! Path-addressed tree merging.
//!
//! Updates arrive out of order: a grandchild may be reported before its
//! parent, or the third child before the first. [`apply_update`] tolerates
//! this by synthesizing [`PivotNode::placeholder`] nodes for every missing
//! ancestor and sibling on the way down, so a merge never fails.
//!
//! Merging is persistent. The previous tree is never touched; the result
//! shares every subtree off the updated path with its input.

use std::sync::Arc;

use crate::model::PivotNode;
use crate::path::Path;

/// One pending mutation of the working tree.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeUpdate {
    /// Replace the whole tree with a snapshot.
    Snapshot(Arc<PivotNode>),
    /// Replace the node at `path`, synthesizing missing ancestors.
    Patch { path: Path, node: Arc<PivotNode> },
}

impl TreeUpdate {
    /// Apply this update to `root`, returning the new root.
    pub fn apply(&self, root: Option<&Arc<PivotNode>>) -> Arc<PivotNode> {
        match self {
            Self::Snapshot(tree) => Arc::clone(tree),
            Self::Patch { path, node } => apply_update(root, path, Arc::clone(node)),
        }
    }

    /// Path this update targets; the root for snapshots.
    pub fn path(&self) -> Path {
        match self {
            Self::Snapshot(_) => Path::root(),
            Self::Patch { path, .. } => path.clone(),
        }
    }
}

/// Replace the node at `path` under `root` with `node`.
///
/// An empty path replaces the root wholesale. Otherwise each level's children
/// list is padded with placeholders up to the addressed index before
/// descending. An absent root is treated as a placeholder root.
///
/// Padding grows with the addressed index; decoded paths are bounded by
/// [`MAX_CHILD_INDEX`](crate::MAX_CHILD_INDEX).
pub fn apply_update(root: Option<&Arc<PivotNode>>, path: &Path, node: Arc<PivotNode>) -> Arc<PivotNode> {
    if path.is_root() {
        return node;
    }
    let merged = match root {
        Some(root) => merge_below(root, path.segments(), node),
        None => merge_below(&PivotNode::placeholder(), path.segments(), node),
    };
    Arc::new(merged)
}

/// Copy `parent` with the child slot at `segments[0]` replaced.
///
/// `segments` is never empty here.
fn merge_below(parent: &PivotNode, segments: &[usize], node: Arc<PivotNode>) -> PivotNode {
    let Some((&index, rest)) = segments.split_first() else {
        return node.as_ref().clone();
    };

    let mut next = parent.clone();
    let children = next.children.get_or_insert_with(Vec::new);
    if children.len() <= index {
        children.resize_with(index + 1, || Arc::new(PivotNode::placeholder()));
    }

    children[index] = if rest.is_empty() {
        node
    } else {
        Arc::new(merge_below(&children[index], rest, node))
    };
    next
}
