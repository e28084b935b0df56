//! Message transport seam.
//!
//! A [`StreamSession`](crate::session::StreamSession) only needs to open a
//! connection, send text frames, and poll for inbound text frames without
//! blocking. [`Transport`] captures exactly that, so the session logic can be
//! driven by a live websocket ([`WsTransport`](crate::ws::WsTransport)) or by
//! a scripted [`ReplayTransport`].

use std::collections::VecDeque;

use crate::error::TransportError;

/// A message-oriented, non-blocking connection.
pub trait Transport {
    /// Open the connection. Opening an already open transport is a no-op.
    fn open(&mut self) -> Result<(), TransportError>;

    fn is_open(&self) -> bool;

    /// Send one text frame.
    fn send_text(&mut self, text: &str) -> Result<(), TransportError>;

    /// Receive the next text frame if one is available.
    ///
    /// Returns `Ok(None)` when nothing is pending, and
    /// `Err(TransportError::Closed)` once the peer has closed.
    fn try_recv(&mut self) -> Result<Option<String>, TransportError>;

    /// Close the connection. Closing a closed transport is a no-op.
    fn close(&mut self);
}

/// Transport that plays back a fixed script of inbound messages.
///
/// Outbound frames are recorded and can be inspected with
/// [`ReplayTransport::sent`]. The inbound queue survives `close`/`open`, so a
/// resubmitted request continues where the script left off.
#[derive(Debug, Clone, Default)]
pub struct ReplayTransport {
    inbound: VecDeque<String>,
    sent: Vec<String>,
    open: bool,
    refuse_connect: bool,
    close_when_exhausted: bool,
    opens: u32,
}

impl ReplayTransport {
    #[must_use]
    pub fn new<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inbound: messages.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// A transport whose `open` always fails.
    #[must_use]
    pub fn refusing() -> Self {
        Self {
            refuse_connect: true,
            ..Self::default()
        }
    }

    /// Report the peer as closed once the script runs out.
    #[must_use]
    pub fn close_when_exhausted(mut self) -> Self {
        self.close_when_exhausted = true;
        self
    }

    /// Append a message to the end of the script.
    pub fn push_inbound(&mut self, message: impl Into<String>) {
        self.inbound.push_back(message.into());
    }

    /// Frames sent so far, oldest first.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    pub fn is_exhausted(&self) -> bool {
        self.inbound.is_empty()
    }

    /// Number of successful `open` calls that actually opened.
    pub fn open_count(&self) -> u32 {
        self.opens
    }
}

impl Transport for ReplayTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        if self.refuse_connect {
            return Err(TransportError::Connect("connection refused".to_string()));
        }
        if !self.open {
            self.open = true;
            self.opens += 1;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::Closed);
        }
        self.sent.push(text.to_string());
        Ok(())
    }

    fn try_recv(&mut self) -> Result<Option<String>, TransportError> {
        if !self.open {
            return Err(TransportError::Closed);
        }
        match self.inbound.pop_front() {
            Some(message) => Ok(Some(message)),
            None if self.close_when_exhausted => {
                self.open = false;
                Err(TransportError::Closed)
            }
            None => Ok(None),
        }
    }

    fn close(&mut self) {
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_script_in_order() {
        let mut transport = ReplayTransport::new(["a", "b"]);
        transport.open().expect("open");
        assert_eq!(transport.try_recv(), Ok(Some("a".to_string())));
        assert_eq!(transport.try_recv(), Ok(Some("b".to_string())));
        assert_eq!(transport.try_recv(), Ok(None));
        assert!(transport.is_exhausted());
    }

    #[test]
    fn closed_transport_rejects_io() {
        let mut transport = ReplayTransport::new(["a"]);
        assert_eq!(transport.send_text("x"), Err(TransportError::Closed));
        assert_eq!(transport.try_recv(), Err(TransportError::Closed));
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn records_sent_frames() {
        let mut transport = ReplayTransport::default();
        transport.open().expect("open");
        transport.send_text("one").expect("send");
        transport.send_text("two").expect("send");
        assert_eq!(transport.sent(), ["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn refusing_transport_never_opens() {
        let mut transport = ReplayTransport::refusing();
        assert!(matches!(transport.open(), Err(TransportError::Connect(_))));
        assert!(!transport.is_open());
    }

    #[test]
    fn script_survives_reopen() {
        let mut transport = ReplayTransport::new(["a", "b"]);
        transport.open().expect("open");
        let _ = transport.try_recv();
        transport.close();
        transport.open().expect("reopen");
        assert_eq!(transport.try_recv(), Ok(Some("b".to_string())));
        assert_eq!(transport.open_count(), 2);
    }

    #[test]
    fn close_when_exhausted_reports_peer_close() {
        let mut transport = ReplayTransport::new(["a"]).close_when_exhausted();
        transport.open().expect("open");
        assert_eq!(transport.try_recv(), Ok(Some("a".to_string())));
        assert_eq!(transport.try_recv(), Err(TransportError::Closed));
        assert!(!transport.is_open());
    }
}
