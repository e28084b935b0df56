//! Websocket transport backed by tungstenite.
//!
//! The socket is switched to non-blocking mode right after the handshake so
//! [`Transport::try_recv`] never stalls the caller's loop.

use std::io;
use std::net::TcpStream;
use std::thread;
use std::time::Duration;

use tungstenite::protocol::WebSocketConfig;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Error as WsError, Message, WebSocket};

use crate::error::TransportError;
use crate::transport::Transport;

/// Default generator endpoint.
pub const DEFAULT_URL: &str = "ws://127.0.0.1:8000/ws";

/// Default max websocket message/frame size.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 4 * 1024 * 1024;

const SEND_RETRIES: u8 = 5;
const SEND_RETRY_SLEEP: Duration = Duration::from_millis(2);

/// Connection settings for [`WsTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WsTransportConfig {
    /// `ws://` endpoint (`wss://` requires the `rustls` feature).
    pub url: String,
    /// Max websocket message/frame size.
    pub max_message_bytes: usize,
}

impl Default for WsTransportConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }
}

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// [`Transport`] over a client websocket.
pub struct WsTransport {
    config: WsTransportConfig,
    socket: Option<Socket>,
}

impl std::fmt::Debug for WsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsTransport")
            .field("config", &self.config)
            .field("open", &self.socket.is_some())
            .finish()
    }
}

impl WsTransport {
    #[must_use]
    pub fn new(config: WsTransportConfig) -> Self {
        Self {
            config,
            socket: None,
        }
    }

    pub fn config(&self) -> &WsTransportConfig {
        &self.config
    }

    fn socket_mut(&mut self) -> Result<&mut Socket, TransportError> {
        self.socket.as_mut().ok_or(TransportError::Closed)
    }

    fn drop_socket(&mut self) {
        self.socket = None;
    }
}

impl Transport for WsTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        if self.socket.is_some() {
            return Ok(());
        }
        let ws_config = WebSocketConfig::default()
            .max_message_size(Some(self.config.max_message_bytes))
            .max_frame_size(Some(self.config.max_message_bytes));

        let (mut socket, _response) =
            tungstenite::client::connect_with_config(self.config.url.as_str(), Some(ws_config), 3)
                .map_err(|error| TransportError::Connect(error.to_string()))?;
        set_nonblocking(socket.get_mut())
            .map_err(|error| TransportError::Connect(error.to_string()))?;

        tracing::debug!(url = %self.config.url, "websocket connected");
        self.socket = Some(socket);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        let socket = self.socket_mut()?;
        match socket.send(Message::text(text.to_owned())) {
            Ok(()) => Ok(()),
            // The frame is already buffered; only the flush is outstanding.
            Err(WsError::Io(error)) if error.kind() == io::ErrorKind::WouldBlock => {
                flush_with_retries(socket)
            }
            Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => {
                self.drop_socket();
                Err(TransportError::Closed)
            }
            Err(error) => Err(TransportError::Send(error.to_string())),
        }
    }

    fn try_recv(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            let socket = self.socket_mut()?;
            match socket.read() {
                Ok(Message::Text(text)) => return Ok(Some(text.as_str().to_owned())),
                Ok(Message::Binary(bytes)) => {
                    return String::from_utf8(bytes.to_vec())
                        .map(Some)
                        .map_err(|error| TransportError::Receive(error.to_string()));
                }
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Ok(Message::Close(frame)) => {
                    tracing::debug!(?frame, "websocket closed by peer");
                    self.drop_socket();
                    return Err(TransportError::Closed);
                }
                Err(WsError::Io(error)) if error.kind() == io::ErrorKind::WouldBlock => {
                    return Ok(None);
                }
                Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => {
                    self.drop_socket();
                    return Err(TransportError::Closed);
                }
                Err(error) => {
                    self.drop_socket();
                    return Err(TransportError::Receive(error.to_string()));
                }
            }
        }
    }

    fn close(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            if let Err(error) = socket.close(None).and_then(|()| socket.flush()) {
                tracing::trace!(%error, "websocket close handshake incomplete");
            }
        }
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.close();
    }
}

fn flush_with_retries(socket: &mut Socket) -> Result<(), TransportError> {
    let mut retries = 0_u8;
    loop {
        match socket.flush() {
            Ok(()) => return Ok(()),
            Err(WsError::Io(error))
                if error.kind() == io::ErrorKind::WouldBlock && retries < SEND_RETRIES =>
            {
                retries = retries.saturating_add(1);
                thread::sleep(SEND_RETRY_SLEEP);
            }
            Err(error) => return Err(TransportError::Send(error.to_string())),
        }
    }
}

fn set_nonblocking(stream: &mut MaybeTlsStream<TcpStream>) -> io::Result<()> {
    match stream {
        MaybeTlsStream::Plain(tcp) => tcp.set_nonblocking(true),
        #[cfg(feature = "rustls")]
        MaybeTlsStream::Rustls(tls) => tls.sock.set_nonblocking(true),
        _ => Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "unsupported websocket stream type",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = WsTransportConfig::default();
        assert_eq!(config.url, DEFAULT_URL);
        assert_eq!(config.max_message_bytes, 4 * 1024 * 1024);
    }

    #[test]
    fn unopened_transport_is_closed() {
        let mut transport = WsTransport::new(WsTransportConfig::default());
        assert!(!transport.is_open());
        assert_eq!(transport.send_text("{}"), Err(TransportError::Closed));
        assert_eq!(transport.try_recv(), Err(TransportError::Closed));
        transport.close();
    }

    #[test]
    fn connect_to_unreachable_endpoint_fails() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let mut transport = WsTransport::new(WsTransportConfig {
            url: format!("ws://{addr}/ws"),
            ..WsTransportConfig::default()
        });
        assert!(matches!(transport.open(), Err(TransportError::Connect(_))));
        assert!(!transport.is_open());
    }

    #[test]
    fn invalid_url_fails_to_connect() {
        let mut transport = WsTransport::new(WsTransportConfig {
            url: "not a url".to_string(),
            ..WsTransportConfig::default()
        });
        assert!(matches!(transport.open(), Err(TransportError::Connect(_))));
    }
}
