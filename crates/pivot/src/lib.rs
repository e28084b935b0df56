#![forbid(unsafe_code)]

//! Pivot tree public facade crate.
//!
//! Re-exports the tree model, the layout engine, and the streaming session
//! from the internal crates, and offers a prelude for day-to-day usage.
//!
//! ```no_run
//! use pivot::Instant;
//!
//! let mut session = pivot::connect("ws://127.0.0.1:8000/ws")?;
//! session.submit("The fall of Rome", 3)?;
//! while session.is_loading() {
//!     if let Some(commit) = session.poll(Instant::now()) {
//!         println!("{} nodes, {} changed", session.nodes().len(), commit.diff.changed.len());
//!     }
//! }
//! # Ok::<(), pivot::Error>(())
//! ```

use std::fmt;

// --- Model re-exports ------------------------------------------------------

pub use pivot_core::{
    ActorKind, NodeId, Path, PivotActor, PivotDecision, PivotNarrative, PivotNode,
    PivotRamification, PivotRelationship, RamificationTerm, RelationshipKind, TreeUpdate,
    Viewpoint, apply_update,
};

// --- Layout re-exports -----------------------------------------------------

pub use pivot_layout::{
    Commit, LayoutConfig, LayoutEngine, ModelDiff, Position, PositionCache, Reconciler,
    RenderEdge, RenderModel, RenderNode, RenderSink,
};

// --- Stream re-exports -----------------------------------------------------

pub use pivot_stream::{
    Instant, ReplayTransport, SessionConfig, SessionError, SessionStats, StreamSession,
    Transport, WsTransport, WsTransportConfig,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for pivot clients.
#[derive(Debug)]
pub enum Error {
    /// Session-level failure (connection, protocol, decode, user input).
    Session(SessionError),
    /// I/O failure while rendering.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Session(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<SessionError> for Error {
    fn from(err: SessionError) -> Self {
        Self::Session(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Standard result type for pivot APIs.
pub type Result<T> = std::result::Result<T, Error>;

/// Open a websocket session to the generator at `url` with default settings.
pub fn connect(url: impl Into<String>) -> Result<StreamSession<WsTransport>> {
    let transport = WsTransport::new(WsTransportConfig {
        url: url.into(),
        ..WsTransportConfig::default()
    });
    let mut session = StreamSession::new(transport);
    session.connect()?;
    Ok(session)
}

/// Hand the session's committed model to `sink`.
pub fn render_to<T: Transport, S: RenderSink + ?Sized>(
    session: &StreamSession<T>,
    sink: &mut S,
) -> Result<()> {
    sink.render(session.nodes(), session.edges())?;
    Ok(())
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Commit, Error, Instant, NodeId, Path, PivotNode, RenderEdge, RenderNode, RenderSink,
        Result, SessionError, StreamSession, Transport,
    };

    pub use crate::{core, layout, stream};
}

pub use pivot_core as core;
pub use pivot_layout as layout;
pub use pivot_stream as stream;
