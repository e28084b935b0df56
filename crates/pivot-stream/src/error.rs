//! Error types for the streaming session.

use thiserror::Error;

use crate::protocol::CodecError;

/// Message recorded when an inbound payload cannot be decoded.
pub const DECODE_FAILURE_MESSAGE: &str = "failed to decode server message";

/// Failures reported by a [`Transport`](crate::transport::Transport).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("failed to connect: {0}")]
    Connect(String),
    #[error("connection closed")]
    Closed,
    #[error("send failed: {0}")]
    Send(String),
    #[error("receive failed: {0}")]
    Receive(String),
}

/// Errors surfaced by a [`StreamSession`](crate::session::StreamSession).
///
/// Every variant ends the current request. None of them end the session: a
/// new prompt can always be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The prompt was empty after trimming.
    #[error("prompt must not be empty")]
    EmptyPrompt,
    /// Submit was attempted without an open connection.
    #[error("not connected")]
    NotConnected,
    /// The connection could not be opened, dropped, or a send failed.
    #[error("connection error: {0}")]
    Connection(String),
    /// The generator reported an error.
    #[error("{0}")]
    Protocol(String),
    /// An inbound payload was malformed.
    #[error("{}", DECODE_FAILURE_MESSAGE)]
    Decode(CodecError),
}

impl SessionError {
    /// True for input rejected locally before any network traffic.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::EmptyPrompt | Self::NotConnected)
    }
}

impl From<TransportError> for SessionError {
    fn from(err: TransportError) -> Self {
        Self::Connection(err.to_string())
    }
}

impl From<CodecError> for SessionError {
    fn from(err: CodecError) -> Self {
        Self::Decode(err)
    }
}
