//! Pivot node content types.
//!
//! The generator streams nodes while it is still filling them in, so decoding
//! is deliberately lenient: every content field defaults when it is absent or
//! `null`, and unrecognized enum strings decode to an `Other` variant instead
//! of failing the whole message.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

/// Temporal label given to synthesized placeholder nodes.
pub const PLACEHOLDER_YEAR: &str = "unknown";

/// Description given to synthesized placeholder nodes.
pub const PLACEHOLDER_DESCRIPTION: &str = "loading";

/// Decode `null` (or a missing field, together with `#[serde(default)]`) as
/// the type's default value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Declares a string-valued enum with a catch-all `Other` variant.
///
/// Known values round-trip through their wire spelling; anything else is kept
/// verbatim in `Other`.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            /// A value outside the known vocabulary.
            Other(String),
        }

        impl $name {
            /// Wire spelling of this value.
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Other(raw) => raw,
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::Other(String::new())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                match raw.as_str() {
                    $($wire => Self::$variant,)+
                    _ => Self::Other(raw),
                }
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                match value {
                    $name::Other(raw) => raw,
                    known => known.as_str().to_owned(),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum! {
    /// What kind of participant an actor is.
    pub enum ActorKind {
        Nation => "nation",
        Person => "person",
        Alliance => "alliance",
    }
}

string_enum! {
    /// Relationship between two actors.
    pub enum RelationshipKind {
        Ally => "ally",
        Enemy => "enemy",
        Neutral => "neutral",
        Vassal => "vassal",
    }
}

string_enum! {
    /// Horizon of a ramification.
    pub enum RamificationTerm {
        Short => "short",
        Long => "long",
    }
}

string_enum! {
    /// Perspective a narrative is written from.
    pub enum Viewpoint {
        Contemporary => "contemporary",
        Historian => "historian",
        Propaganda => "propaganda",
    }
}

/// A participant in a pivot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PivotActor {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: ActorKind,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Vec<PivotRelationship>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PivotRelationship {
    #[serde(deserialize_with = "null_as_default")]
    pub target: PivotActor,
    #[serde(deserialize_with = "null_as_default")]
    pub relationship_type: RelationshipKind,
    #[serde(deserialize_with = "null_as_default")]
    pub strength: f64,
}

/// A decision one actor could take at a pivot, with its consequences.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PivotDecision {
    #[serde(deserialize_with = "null_as_default")]
    pub actor: PivotActor,
    #[serde(deserialize_with = "null_as_default")]
    pub short_term_ramifications: Vec<PivotRamification>,
    #[serde(deserialize_with = "null_as_default")]
    pub long_term_ramifications: Vec<PivotRamification>,
    #[serde(deserialize_with = "null_as_default")]
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PivotRamification {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub term: RamificationTerm,
    #[serde(deserialize_with = "null_as_default")]
    pub affected_actor: PivotActor,
    #[serde(deserialize_with = "null_as_default")]
    pub ramification: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PivotNarrative {
    #[serde(deserialize_with = "null_as_default")]
    pub viewpoint: Viewpoint,
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
}

/// One node of a pivot tree.
///
/// `children == None` and `children == Some(vec![])` are both leaves.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PivotNode {
    #[serde(deserialize_with = "null_as_default")]
    pub year: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub actors: Vec<PivotActor>,
    #[serde(deserialize_with = "null_as_default")]
    pub possible_outcomes: Vec<PivotDecision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narratives: Option<Vec<PivotNarrative>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Arc<PivotNode>>>,
}

impl PivotNode {
    /// A content-only node with no actors, outcomes, or children.
    pub fn new(year: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            year: year.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    /// Synthesized stand-in for a node that has not arrived yet.
    pub fn placeholder() -> Self {
        Self::new(PLACEHOLDER_YEAR, PLACEHOLDER_DESCRIPTION)
    }

    /// True if this node's content is the placeholder sentinel.
    ///
    /// Only content is inspected; a placeholder may already have real
    /// children merged beneath it.
    pub fn is_placeholder(&self) -> bool {
        self.year == PLACEHOLDER_YEAR
            && self.description == PLACEHOLDER_DESCRIPTION
            && self.actors.is_empty()
            && self.possible_outcomes.is_empty()
            && self.narratives.is_none()
    }

    /// Builder-style helper replacing this node's children.
    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = PivotNode>) -> Self {
        self.children = Some(children.into_iter().map(Arc::new).collect());
        self
    }

    /// Children in order; empty for a leaf.
    pub fn children(&self) -> &[Arc<PivotNode>] {
        self.children.as_deref().unwrap_or_default()
    }

    pub fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(|child| child.node_count())
            .sum::<usize>()
    }

    /// Number of leaves under this node; a leaf counts itself.
    ///
    /// This is the horizontal footprint used by the layout engine.
    pub fn subtree_width(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.children()
                .iter()
                .map(|child| child.subtree_width())
                .sum()
        }
    }

    /// Look up a descendant by child-index chain.
    pub fn get(&self, path: &[usize]) -> Option<&PivotNode> {
        path.iter()
            .try_fold(self, |node, &index| node.children().get(index).map(Arc::as_ref))
    }
}
