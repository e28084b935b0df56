//! JSON wire protocol between the client and the pivot generator.
//!
//! Every message is one JSON object discriminated by its `type` field.
//!
//! Client → server:
//!
//! ```text
//! { "type": "generate", "prompt": string, "maxDepth": integer }
//! ```
//!
//! Server → client:
//!
//! ```text
//! { "type": "tree_update", "tree": PivotNode }                 full snapshot
//! { "type": "tree_update", "tree": PivotNode, "path": [int] }  node at path
//! { "type": "complete" }
//! { "type": "error", "error": string }
//! ```

use std::sync::Arc;

use pivot_core::{Path, PivotNode, TreeUpdate};
use serde::{Deserialize, Serialize};

/// Default tree depth requested from the generator.
pub const DEFAULT_MAX_DEPTH: u32 = 3;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Messages sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Generate {
        prompt: String,
        #[serde(rename = "maxDepth")]
        max_depth: u32,
    },
}

/// Messages sent by the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    TreeUpdate {
        tree: PivotNode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<Path>,
    },
    Complete,
    Error {
        error: String,
    },
}

impl ServerMessage {
    /// Convert a `tree_update` into the tree mutation it describes.
    ///
    /// Without a path the payload is a whole-tree snapshot.
    pub fn into_tree_update(self) -> Option<TreeUpdate> {
        match self {
            Self::TreeUpdate { tree, path: None } => Some(TreeUpdate::Snapshot(Arc::new(tree))),
            Self::TreeUpdate {
                tree,
                path: Some(path),
            } => Some(TreeUpdate::Patch {
                path,
                node: Arc::new(tree),
            }),
            Self::Complete | Self::Error { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Codec errors
// ---------------------------------------------------------------------------

/// Errors that can occur while encoding or decoding a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Payload is not valid JSON.
    Syntax(String),
    /// JSON is well-formed but is not a known message (unknown `type`,
    /// missing or mistyped fields).
    Shape(String),
    /// Encoding an outbound message failed.
    Encode(String),
}

impl core::fmt::Display for CodecError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Syntax(msg) => write!(f, "malformed JSON: {msg}"),
            Self::Shape(msg) => write!(f, "unexpected message shape: {msg}"),
            Self::Encode(msg) => write!(f, "encode failed: {msg}"),
        }
    }
}

impl std::error::Error for CodecError {}

// ---------------------------------------------------------------------------
// Encode / decode
// ---------------------------------------------------------------------------

/// Encode an outbound message as a JSON text frame.
pub fn encode_client(message: &ClientMessage) -> Result<String, CodecError> {
    serde_json::to_string(message).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Decode one inbound text frame.
pub fn decode_server(text: &str) -> Result<ServerMessage, CodecError> {
    serde_json::from_str(text).map_err(|e| {
        if e.is_syntax() || e.is_eof() {
            CodecError::Syntax(e.to_string())
        } else {
            CodecError::Shape(e.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn generate_uses_camel_case_depth() {
        let text = encode_client(&ClientMessage::Generate {
            prompt: "The fall of Rome".to_string(),
            max_depth: 3,
        })
        .expect("encode");
        let value: serde_json::Value = serde_json::from_str(&text).expect("json");
        assert_eq!(
            value,
            serde_json::json!({"type": "generate", "prompt": "The fall of Rome", "maxDepth": 3})
        );
    }

    #[test]
    fn decodes_snapshot_update() {
        let message =
            decode_server(r#"{"type":"tree_update","tree":{"year":"476","description":"x"}}"#)
                .expect("decode");
        let ServerMessage::TreeUpdate { tree, path } = message else {
            panic!("expected tree_update");
        };
        assert_eq!(tree.year, "476");
        assert!(path.is_none());
    }

    #[test]
    fn decodes_path_addressed_update() {
        let message = decode_server(r#"{"type":"tree_update","path":[0,2],"tree":{"year":"480"}}"#)
            .expect("decode");
        let update = message.into_tree_update().expect("tree update");
        assert_eq!(update.path(), Path::from([0, 2]));
    }

    #[test]
    fn decodes_complete_and_error() {
        assert_eq!(decode_server(r#"{"type":"complete"}"#), Ok(ServerMessage::Complete));
        assert_eq!(
            decode_server(r#"{"type":"error","error":"model overloaded"}"#),
            Ok(ServerMessage::Error {
                error: "model overloaded".to_string()
            })
        );
    }

    #[test]
    fn complete_and_error_are_not_tree_updates() {
        assert!(ServerMessage::Complete.into_tree_update().is_none());
        assert!(
            ServerMessage::Error {
                error: String::new()
            }
            .into_tree_update()
            .is_none()
        );
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(decode_server("{not json"), Err(CodecError::Syntax(_))));
        assert!(matches!(decode_server(""), Err(CodecError::Syntax(_))));
    }

    #[test]
    fn rejects_wrong_shapes() {
        for text in [
            r#"{"type":"tree_update"}"#,
            r#"{"type":"tree_update","tree":null}"#,
            r#"{"type":"error"}"#,
            r#"{"type":"mystery"}"#,
            r#"{"tree":{}}"#,
            r#"[1,2,3]"#,
            r#"{"type":"tree_update","path":[18446744073709551615],"tree":{}}"#,
            r#"{"type":"tree_update","path":[1000000000],"tree":{}}"#,
        ] {
            assert!(
                matches!(decode_server(text), Err(CodecError::Shape(_))),
                "accepted {text}"
            );
        }
    }

    #[test]
    fn partial_content_with_nulls_still_decodes() {
        let message = decode_server(
            r#"{"type":"tree_update","path":[0],"tree":{"year":"480","actors":[{"type":null,"name":"Zeno","relationships":[{"strength":null}]}],"narratives":[{"viewpoint":null}]}}"#,
        )
        .expect("decode");
        let update = message.into_tree_update().expect("tree update");
        assert_eq!(update.path(), Path::from([0]));
    }
}
