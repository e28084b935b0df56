#![forbid(unsafe_code)]

//! Streaming generation sessions for pivot trees.
//!
//! A [`StreamSession`] sends one `generate` request over a [`Transport`],
//! merges the `tree_update` messages that stream back into a working tree,
//! and turns bursts of updates into a single layout and reconcile pass.
//!
//! - [`protocol`]: JSON wire messages and their codec.
//! - [`coalescer`]: fixed-window batching of updates.
//! - [`transport`]: the transport trait and a scripted replay transport.
//! - [`ws`]: websocket transport (tungstenite).
//! - [`session`]: the session state machine.

pub mod coalescer;
pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod ws;

pub use coalescer::UpdateCoalescer;
pub use error::{DECODE_FAILURE_MESSAGE, SessionError, TransportError};
pub use protocol::{
    ClientMessage, CodecError, DEFAULT_MAX_DEPTH, ServerMessage, decode_server, encode_client,
};
pub use session::{SessionConfig, SessionStats, StreamSession};
pub use transport::{ReplayTransport, Transport};
pub use ws::{WsTransport, WsTransportConfig};

/// Clock type taken by [`StreamSession::poll`] and [`UpdateCoalescer`].
pub use web_time::Instant;
