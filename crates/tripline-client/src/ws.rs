//! Production WebSocket transport.
//!
//! One connection per session, authenticated through query parameters on
//! the connect URL. Non-JSON and non-text messages are skipped; the
//! stream ending for any reason surfaces exactly one
//! [`TransportEvent::Closed`].

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, warn};
use tripline_core::Identity;

use crate::error::TransportError;
use crate::transport::{Transport, TransportEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket transport against the booking server's push endpoint.
pub struct WsTransport {
    base_url: String,
    stream: Option<WsStream>,
}

impl WsTransport {
    /// Create a transport for the given endpoint, e.g.
    /// `wss://example.com/ws`. No connection is opened yet.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), stream: None }
    }
}

impl Transport for WsTransport {
    async fn open(&mut self, identity: &Identity) -> Result<(), TransportError> {
        self.close().await;

        let url = format!(
            "{}?userId={}&token={}",
            self.base_url, identity.user_id, identity.token
        );
        let (stream, _response) = connect_async(url.as_str())
            .await
            .map_err(|err| TransportError::Connect(err.to_string()))?;
        self.stream = Some(stream);
        Ok(())
    }

    async fn send(&mut self, frame: Value) -> Result<(), TransportError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(TransportError::Stream("no open connection".to_owned()));
        };
        stream
            .send(Message::Text(frame.to_string()))
            .await
            .map_err(|err| TransportError::Stream(err.to_string()))
    }

    async fn recv(&mut self) -> TransportEvent {
        loop {
            let Some(stream) = self.stream.as_mut() else {
                // No connection: stay pending until the driver opens one.
                return std::future::pending().await;
            };

            match stream.next().await {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<Value>(&text) {
                    Ok(frame) => return TransportEvent::Frame(frame),
                    Err(err) => {
                        warn!(%err, "dropping non-JSON text message");
                    },
                },
                Some(Ok(Message::Close(close))) => {
                    self.stream = None;
                    let reason =
                        close.map_or_else(|| "closed by server".to_owned(), |c| c.reason.to_string());
                    return TransportEvent::Closed { reason };
                },
                Some(Ok(other)) => {
                    debug!(kind = ?other, "skipping non-text message");
                },
                Some(Err(err)) => {
                    self.stream = None;
                    return TransportEvent::Closed { reason: err.to_string() };
                },
                None => {
                    self.stream = None;
                    return TransportEvent::Closed { reason: "stream ended".to_owned() };
                },
            }
        }
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(err) = stream.close(None).await {
                debug!(%err, "close handshake failed");
            }
        }
    }
}
