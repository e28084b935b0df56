#![forbid(unsafe_code)]

//! Stable tree layout for pivot trees.
//!
//! [`LayoutEngine::layout`] turns a tree into a [`RenderModel`]: one
//! [`RenderNode`] per tree node, positioned on a grid, and one [`RenderEdge`]
//! per parent→child link.
//!
//! # Algorithm
//!
//! Every node has a *subtree width*: 1 for a leaf, otherwise the sum of its
//! children's widths. Nodes are visited depth-first in pre-order. A node
//! entered at horizontal offset `left` on level `depth` is centered over its
//! span:
//!
//! ```text
//! x = left + (width - 1) * node_spacing / 2
//! y = depth * vertical_spacing
//! ```
//!
//! and its children are laid out left to right, each starting where the
//! previous child's span ended.
//!
//! # Stability
//!
//! Positions are only computed the first time a path is seen. After that the
//! [`PositionCache`] answers, so a node never moves while the tree grows
//! around it. Siblings discovered later are not re-spaced; if an early subtree
//! turns out wider than it was when its neighbours were placed, nodes may
//! overlap. That trade-off is accepted in exchange for zero jitter.

pub mod cache;
pub mod model;
pub mod reconcile;

use std::sync::Arc;

use pivot_core::{NodeId, PivotNode};
use serde::{Deserialize, Serialize};

pub use cache::{PositionCache, PositionCacheStats};
pub use model::{NodeData, PIVOT_NODE_KIND, Position, RenderEdge, RenderModel, RenderNode, RenderSink};
pub use reconcile::{Commit, ListCommit, ModelDiff, Reconciler};

/// Horizontal distance between adjacent leaf columns.
pub const NODE_SPACING: f64 = 350.0;

/// Vertical distance between tree levels.
pub const VERTICAL_SPACING: f64 = 500.0;

/// Grid spacing used by the layout engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub node_spacing: f64,
    pub vertical_spacing: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_spacing: NODE_SPACING,
            vertical_spacing: VERTICAL_SPACING,
        }
    }
}

/// Computes positioned render models from trees.
///
/// The engine itself is stateless; all memory of earlier passes lives in the
/// [`PositionCache`] the caller passes in.
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    #[must_use]
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lay out `tree`, reusing and extending `cache`.
    ///
    /// An absent tree yields an empty model. Exactly one node of a non-empty
    /// model is flagged newest: the one whose id the cache assigned last.
    pub fn layout(&self, tree: Option<&Arc<PivotNode>>, cache: &mut PositionCache) -> RenderModel {
        let Some(root) = tree else {
            return RenderModel::default();
        };

        let misses_before = cache.stats().misses;
        let mut pass = LayoutPass {
            config: self.config,
            cache,
            model: RenderModel::default(),
            path: Vec::new(),
        };
        pass.visit(root, None, 0.0);
        let LayoutPass { cache, mut model, .. } = pass;

        if let Some(newest) = cache.newest() {
            for node in &mut model.nodes {
                node.data.is_newest = node.id == *newest;
            }
        }

        tracing::debug!(
            nodes = model.nodes.len(),
            edges = model.edges.len(),
            assigned = cache.stats().misses - misses_before,
            "layout pass"
        );
        model
    }
}

/// Subtree width in leaf columns; a node with no (or empty) children is 1.
pub fn subtree_width(node: &PivotNode) -> usize {
    node.subtree_width()
}

/// State threaded through one pre-order traversal.
struct LayoutPass<'a> {
    config: LayoutConfig,
    cache: &'a mut PositionCache,
    model: RenderModel,
    path: Vec<usize>,
}

impl LayoutPass<'_> {
    fn visit(&mut self, node: &Arc<PivotNode>, parent: Option<&NodeId>, left_offset: f64) {
        let id = NodeId::from_segments(&self.path);
        let level = self.path.len() as f64;
        let LayoutConfig {
            node_spacing,
            vertical_spacing,
        } = self.config;

        let position = self.cache.get_or_assign(&id, || {
            let width = node.subtree_width() as f64;
            Position::new(
                left_offset + (width - 1.0) * node_spacing / 2.0,
                level * vertical_spacing,
            )
        });

        self.model.nodes.push(RenderNode {
            id: id.clone(),
            kind: PIVOT_NODE_KIND,
            position,
            data: NodeData {
                content: Arc::clone(node),
                is_newest: false,
            },
        });
        if let Some(parent) = parent {
            self.model
                .edges
                .push(RenderEdge::new(parent.clone(), id.clone()));
        }

        let mut offset = left_offset;
        for (index, child) in node.children().iter().enumerate() {
            self.path.push(index);
            self.visit(child, Some(&id), offset);
            self.path.pop();
            offset += child.subtree_width() as f64 * node_spacing;
        }
    }
}
