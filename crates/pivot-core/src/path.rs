//! Path identity for tree nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Largest child index a decoded path may address.
pub const MAX_CHILD_INDEX: usize = 1023;

/// Deepest level a decoded path may address.
pub const MAX_PATH_DEPTH: usize = 64;

/// Chain of child indices from the root. The empty path is the root.
///
/// Decoding rejects paths beyond [`MAX_PATH_DEPTH`] or with an index above
/// [`MAX_CHILD_INDEX`]; every decoded path can be merged without unbounded
/// placeholder padding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct Path(Vec<usize>);

/// A path outside the addressable bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathError {
    TooDeep { depth: usize },
    IndexOutOfRange { index: usize },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooDeep { depth } => {
                write!(f, "path depth {depth} exceeds {MAX_PATH_DEPTH}")
            }
            Self::IndexOutOfRange { index } => {
                write!(f, "child index {index} exceeds {MAX_CHILD_INDEX}")
            }
        }
    }
}

impl std::error::Error for PathError {}

impl Path {
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of edges between the root and this node.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn segments(&self) -> &[usize] {
        &self.0
    }

    /// Path of the `index`-th child of this node.
    #[must_use]
    pub fn child(&self, index: usize) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend_from_slice(&self.0);
        segments.push(index);
        Self(segments)
    }

    /// Path of the parent, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        self.0
            .split_last()
            .map(|(_, ancestors)| Self(ancestors.to_vec()))
    }

    /// Stable id derived from this path.
    pub fn id(&self) -> NodeId {
        NodeId::from_segments(&self.0)
    }
}

impl TryFrom<Vec<usize>> for Path {
    type Error = PathError;

    /// Bounds-checked construction, used when decoding.
    fn try_from(segments: Vec<usize>) -> Result<Self, Self::Error> {
        if segments.len() > MAX_PATH_DEPTH {
            return Err(PathError::TooDeep {
                depth: segments.len(),
            });
        }
        if let Some(&index) = segments.iter().find(|&&index| index > MAX_CHILD_INDEX) {
            return Err(PathError::IndexOutOfRange { index });
        }
        Ok(Self(segments))
    }
}

impl From<Path> for Vec<usize> {
    fn from(path: Path) -> Self {
        path.0
    }
}

impl From<Vec<usize>> for Path {
    fn from(segments: Vec<usize>) -> Self {
        Self(segments)
    }
}

impl From<&[usize]> for Path {
    fn from(segments: &[usize]) -> Self {
        Self(segments.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Path {
    fn from(segments: [usize; N]) -> Self {
        Self(segments.to_vec())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id().as_str())
    }
}

/// String id of a node: `"root"` for the empty path, otherwise the indices
/// joined by `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub const ROOT: &'static str = "root";

    pub fn root() -> Self {
        Self(Self::ROOT.to_owned())
    }

    pub fn from_segments(segments: &[usize]) -> Self {
        if segments.is_empty() {
            return Self::root();
        }
        let mut id = String::with_capacity(segments.len() * 2);
        for (i, index) in segments.iter().enumerate() {
            if i > 0 {
                id.push('-');
            }
            id.push_str(&index.to_string());
        }
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == Self::ROOT
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for NodeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NodeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
