//! One logical generation request over a transport.
//!
//! [`StreamSession`] owns everything a request accumulates: the working tree,
//! the position cache, the pending-update queue, and the committed render
//! model. Submitting a new prompt resets all of it in one step.
//!
//! The session is driven cooperatively. Callers invoke [`StreamSession::poll`]
//! from their loop (or [`StreamSession::handle_message`] directly when they
//! own the socket) and render whenever a poll returns a changed [`Commit`]:
//!
//! ```text
//! inbound frame ─► decode ─► queue update ─┐
//!                                          │ window elapsed / drain
//!                                          ▼
//!                       apply batch ─► layout ─► reconcile ─► Commit
//! ```

use std::sync::Arc;
use std::time::Duration;

use pivot_core::{NodeId, PivotNode, TreeUpdate};
use pivot_layout::{
    Commit, LayoutConfig, LayoutEngine, PositionCache, PositionCacheStats, Reconciler, RenderEdge,
    RenderNode,
};
use web_time::Instant;

use crate::coalescer::{DEFAULT_WINDOW, UpdateCoalescer};
use crate::error::{SessionError, TransportError};
use crate::protocol::{self, ClientMessage, ServerMessage};
use crate::transport::Transport;

/// Session tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Batching window between a tree update and the layout pass it triggers.
    pub coalesce_window: Duration,
    pub layout: LayoutConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            coalesce_window: DEFAULT_WINDOW,
            layout: LayoutConfig::default(),
        }
    }
}

/// Counters accumulated over the session's lifetime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    pub requests: u64,
    pub messages_received: u64,
    pub decode_errors: u64,
    pub updates_applied: u64,
    pub layout_passes: u64,
    pub commits_kept: u64,
    pub commits_replaced: u64,
    /// Position cache counters for the current request.
    pub cache: PositionCacheStats,
}

/// Drives one generation request at a time over a [`Transport`].
pub struct StreamSession<T: Transport> {
    transport: T,
    engine: LayoutEngine,
    cache: PositionCache,
    reconciler: Reconciler,
    pending: UpdateCoalescer<TreeUpdate>,
    tree: Option<Arc<PivotNode>>,
    loading: bool,
    /// A request was sent and the generator has not yet answered it with
    /// `complete` or `error`, so it may still be streaming.
    awaiting_generator: bool,
    error: Option<SessionError>,
    stats: SessionStats,
}

impl<T: Transport> std::fmt::Debug for StreamSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSession")
            .field("connected", &self.transport.is_open())
            .field("loading", &self.loading)
            .field("error", &self.error)
            .field("nodes", &self.reconciler.nodes().len())
            .field("pending", &self.pending.pending_len())
            .finish()
    }
}

impl<T: Transport> StreamSession<T> {
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, SessionConfig::default())
    }

    #[must_use]
    pub fn with_config(transport: T, config: SessionConfig) -> Self {
        Self {
            transport,
            engine: LayoutEngine::new(config.layout),
            cache: PositionCache::new(),
            reconciler: Reconciler::new(),
            pending: UpdateCoalescer::new(config.coalesce_window),
            tree: None,
            loading: false,
            awaiting_generator: false,
            error: None,
            stats: SessionStats::default(),
        }
    }

    // -- connection --------------------------------------------------------

    /// Open the transport. Success clears any recorded error.
    pub fn connect(&mut self) -> Result<(), SessionError> {
        match self.transport.open() {
            Ok(()) => {
                tracing::info!("session connected");
                self.error = None;
                Ok(())
            }
            Err(err) => Err(self.fail_request(err.into())),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_open()
    }

    /// Close the transport and discard in-flight state.
    ///
    /// The committed render model stays readable.
    pub fn close(&mut self) {
        self.transport.close();
        self.pending.clear();
        self.loading = false;
        self.awaiting_generator = false;
    }

    // -- requests ----------------------------------------------------------

    /// Start a new generation request.
    ///
    /// The prompt is trimmed and must not be empty. Without an open
    /// connection the request is rejected and the session stays idle; nothing
    /// is queued for later. A request the generator may still be answering,
    /// including one that ended locally on a malformed frame, is abandoned by
    /// closing and reopening the connection. The tree, position cache,
    /// pending updates, and committed model all start over.
    pub fn submit(&mut self, prompt: &str, max_depth: u32) -> Result<(), SessionError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(SessionError::EmptyPrompt);
        }
        if !self.transport.is_open() {
            return Err(self.fail_request(SessionError::NotConnected));
        }

        if self.awaiting_generator {
            tracing::info!(loading = self.loading, "abandoning in-flight request");
            self.transport.close();
            self.awaiting_generator = false;
            if let Err(err) = self.transport.open() {
                self.reset_request();
                return Err(self.fail_request(err.into()));
            }
        }
        self.reset_request();

        let frame = protocol::encode_client(&ClientMessage::Generate {
            prompt: prompt.to_string(),
            max_depth,
        })?;
        if let Err(err) = self.transport.send_text(&frame) {
            return Err(self.fail_request(err.into()));
        }

        self.loading = true;
        self.awaiting_generator = true;
        self.stats.requests += 1;
        tracing::info!(prompt, max_depth, "generation requested");
        Ok(())
    }

    // -- inbound -----------------------------------------------------------

    /// Handle one inbound text frame received at `now`.
    ///
    /// Never fails: malformed frames and generator errors are recorded and
    /// end the current request.
    pub fn handle_message(&mut self, text: &str, now: Instant) {
        self.stats.messages_received += 1;
        let message = match protocol::decode_server(text) {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(error = %err, "discarding malformed server message");
                self.stats.decode_errors += 1;
                self.fail_request(err.into());
                return;
            }
        };

        match message {
            ServerMessage::Complete => {
                tracing::info!(pending = self.pending.pending_len(), "generation complete");
                self.loading = false;
                self.awaiting_generator = false;
            }
            ServerMessage::Error { error } => {
                tracing::warn!(%error, "generator reported an error");
                self.awaiting_generator = false;
                self.fail_request(SessionError::Protocol(error));
            }
            message @ ServerMessage::TreeUpdate { .. } => {
                if let Some(update) = message.into_tree_update() {
                    tracing::trace!(path = %update.path(), "tree update queued");
                    self.pending.push(update, now);
                }
            }
        }
    }

    /// Pump the transport and run a layout pass if a batch is due.
    ///
    /// Once the request has finished, leftover updates are flushed without
    /// waiting for the window. Returns the commit of the layout pass, if one
    /// ran.
    pub fn poll(&mut self, now: Instant) -> Option<Commit> {
        self.pump(now);
        if self.loading {
            let batch = self.pending.take_due(now)?;
            self.flush(batch)
        } else {
            self.drain()
        }
    }

    /// Apply every pending update immediately and run one layout pass.
    pub fn drain(&mut self) -> Option<Commit> {
        let batch = self.pending.drain();
        self.flush(batch)
    }

    /// When the next pending batch becomes due.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.deadline()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.has_pending()
    }

    fn pump(&mut self, now: Instant) {
        while self.transport.is_open() {
            match self.transport.try_recv() {
                Ok(Some(text)) => self.handle_message(&text, now),
                Ok(None) => break,
                Err(err) => {
                    self.transport.close();
                    self.awaiting_generator = false;
                    if self.loading {
                        tracing::warn!(error = %err, "connection lost during generation");
                        self.fail_request(err.into());
                    } else if err != TransportError::Closed {
                        tracing::warn!(error = %err, "connection lost");
                    } else {
                        tracing::info!("connection closed by peer");
                    }
                }
            }
        }
    }

    fn flush(&mut self, batch: Vec<TreeUpdate>) -> Option<Commit> {
        if batch.is_empty() {
            return None;
        }
        let applied = batch.len();
        for update in batch {
            self.tree = Some(update.apply(self.tree.as_ref()));
        }
        self.stats.updates_applied += applied as u64;

        let model = self.engine.layout(self.tree.as_ref(), &mut self.cache);
        self.stats.layout_passes += 1;
        let commit = self.reconciler.commit(model);
        if commit.is_unchanged() {
            self.stats.commits_kept += 1;
        } else {
            self.stats.commits_replaced += 1;
        }
        tracing::debug!(
            applied,
            nodes = self.reconciler.nodes().len(),
            unchanged = commit.is_unchanged(),
            "flushed tree updates"
        );
        Some(commit)
    }

    // -- state -------------------------------------------------------------

    /// True between a successful submit and `complete`, `error`, or a
    /// failure.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Most recent failure of the current request.
    pub fn error(&self) -> Option<&SessionError> {
        self.error.as_ref()
    }

    /// Working tree including updates not yet laid out.
    pub fn tree(&self) -> Option<&Arc<PivotNode>> {
        self.tree.as_ref()
    }

    /// Committed render nodes.
    pub fn nodes(&self) -> &Arc<[RenderNode]> {
        self.reconciler.nodes()
    }

    /// Committed render edges.
    pub fn edges(&self) -> &Arc<[RenderEdge]> {
        self.reconciler.edges()
    }

    /// Id of the node most recently given a position.
    pub fn newest(&self) -> Option<&NodeId> {
        self.cache.newest()
    }

    /// Look up a committed render node by id.
    pub fn node(&self, id: &str) -> Option<&RenderNode> {
        self.reconciler.nodes().iter().find(|node| node.id == *id)
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            cache: self.cache.stats(),
            ..self.stats.clone()
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    // -- internals ---------------------------------------------------------

    fn reset_request(&mut self) {
        self.tree = None;
        self.cache.clear();
        self.cache.reset_stats();
        self.pending.clear();
        self.reconciler.reset();
        self.error = None;
        self.loading = false;
    }

    /// Record `err` as the outcome of the current request and return it.
    fn fail_request(&mut self, err: SessionError) -> SessionError {
        self.loading = false;
        self.error = Some(err.clone());
        err
    }
}

impl<T: Transport> Drop for StreamSession<T> {
    fn drop(&mut self) {
        self.transport.close();
    }
}
