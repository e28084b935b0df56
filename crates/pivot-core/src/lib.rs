#![forbid(unsafe_code)]

//! Pivot tree data model.
//!
//! A pivot tree is a strictly hierarchical narrative: every [`PivotNode`]
//! describes one historical turning point and owns an ordered list of
//! children. Nodes are identified across updates only by their [`Path`], the
//! chain of child indices from the root.
//!
//! Trees are immutable values. Children are held behind [`std::sync::Arc`],
//! so [`merge::apply_update`] can return a new tree that shares every
//! untouched subtree with the previous one.

pub mod merge;
pub mod model;
pub mod path;

pub use merge::{TreeUpdate, apply_update};
pub use model::{
    ActorKind, PLACEHOLDER_DESCRIPTION, PLACEHOLDER_YEAR, PivotActor, PivotDecision,
    PivotNarrative, PivotNode, PivotRamification, PivotRelationship, RamificationTerm,
    RelationshipKind, Viewpoint,
};
pub use path::{MAX_CHILD_INDEX, MAX_PATH_DEPTH, NodeId, Path, PathError};
