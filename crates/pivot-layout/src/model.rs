//! Render model handed to the presentation layer.
//!
//! The model is the only boundary between the engine and whatever draws the
//! tree. It is plain data: a list of positioned nodes and a list of
//! parent→child edges, both derived entirely from the tree and the position
//! cache.

use std::io;
use std::sync::Arc;

use pivot_core::{NodeId, PivotNode};
use serde::Serialize;

/// Node kind tag understood by the presentation layer.
pub const PIVOT_NODE_KIND: &str = "pivot";

/// Absolute position of a node's anchor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Payload of a rendered node: the tree content plus the transient
/// newest-node cue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeData {
    #[serde(flatten)]
    pub content: Arc<PivotNode>,
    #[serde(rename = "isNewNode")]
    pub is_newest: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub position: Position,
    pub data: NodeData,
}

impl RenderNode {
    pub fn content(&self) -> &PivotNode {
        &self.data.content
    }

    pub fn is_newest(&self) -> bool {
        self.data.is_newest
    }
}

/// Directed parent→child edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderEdge {
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
}

impl RenderEdge {
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self {
            id: format!("{source}->{target}"),
            source,
            target,
        }
    }
}

/// Output of one layout pass.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RenderModel {
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
}

impl RenderModel {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Find a rendered node by id.
    pub fn node(&self, id: &str) -> Option<&RenderNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// The node currently carrying the newest-node cue, if any.
    pub fn newest(&self) -> Option<&RenderNode> {
        self.nodes.iter().find(|node| node.is_newest())
    }
}

/// The drawing collaborator: receives the committed node and edge lists.
///
/// Callers only invoke it after the reconciler reports a change.
pub trait RenderSink {
    fn render(&mut self, nodes: &[RenderNode], edges: &[RenderEdge]) -> io::Result<()>;
}
