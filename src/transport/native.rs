//! Native WebSocket transport over `tokio-tungstenite`.
//!
//! - 30-second connect timeout (configurable)
//! - Text frames are decoded as JSON; undecodable frames are logged and skipped
//! - WS-level pings are answered inline while reading
//! - A close frame or end of stream ends the message sequence

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::WsError;
use crate::transport::{Transport, TransportConfig};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// WebSocket transport for the exchange's JSON-RPC endpoint.
///
/// Sink and stream are locked separately, so sends are never blocked behind
/// a pending read.
pub struct WsTransport {
    config: TransportConfig,
    sink: Arc<Mutex<Option<WsSink>>>,
    source: Mutex<Option<WsSource>>,
}

impl WsTransport {
    /// Create a new transport. Does not connect yet.
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            sink: Arc::new(Mutex::new(None)),
            source: Mutex::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    async fn send_frame(&self, frame: Message) -> Result<(), WsError> {
        let mut guard = self.sink.lock().await;
        let sink = guard.as_mut().ok_or(WsError::NotConnected)?;

        tokio::time::timeout(self.config.send_timeout, sink.send(frame))
            .await
            .map_err(|_| WsError::Timeout)?
            .map_err(|e| WsError::SendFailed(e.to_string()))
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn connect(&self) -> Result<(), WsError> {
        if self.sink.lock().await.is_some() {
            return Ok(());
        }

        tracing::info!("Connecting to {}", self.config.url);
        let (ws_stream, _) =
            tokio::time::timeout(self.config.connect_timeout, connect_async(self.config.url.as_str()))
                .await
                .map_err(|_| WsError::ConnectionFailed("Connection timeout".into()))?
                .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;

        let (sink, source) = ws_stream.split();
        *self.source.lock().await = Some(source);
        *self.sink.lock().await = Some(sink);

        tracing::info!("Connected to {}", self.config.url);
        Ok(())
    }

    async fn send(&self, message: Value) -> Result<(), WsError> {
        let text = serde_json::to_string(&message)?;
        self.send_frame(Message::Text(text.into())).await
    }

    async fn recv(&self) -> Result<Option<Value>, WsError> {
        let mut guard = self.source.lock().await;
        let source = guard.as_mut().ok_or(WsError::NotConnected)?;

        loop {
            match source.next().await {
                Some(Ok(Message::Text(text))) => {
                    let text_str: &str = &text;
                    match serde_json::from_str::<Value>(text_str) {
                        Ok(value) => return Ok(Some(value)),
                        Err(e) => {
                            tracing::warn!("WS deserialization error: {}, raw: {}", e, text_str);
                        }
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    if let Err(e) = self.send_frame(Message::Pong(data)).await {
                        tracing::warn!("Failed to answer ping: {}", e);
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = extract_close(frame.as_ref());
                    tracing::info!("WebSocket closed by peer: code={} reason={}", code, reason);
                    *guard = None;
                    self.sink.lock().await.take();
                    return Ok(None);
                }
                Some(Ok(_)) => {} // Binary, Pong, raw frames
                Some(Err(e)) => {
                    tracing::error!("WebSocket error: {}", e);
                    *guard = None;
                    self.sink.lock().await.take();
                    return Err(WsError::from(e));
                }
                None => {
                    *guard = None;
                    self.sink.lock().await.take();
                    return Ok(None);
                }
            }
        }
    }

    async fn close(&self) -> Result<(), WsError> {
        let sink = self.sink.lock().await.take();

        if let Some(mut sink) = sink {
            let _ = sink
                .send(Message::Close(Some(CloseFrame {
                    code: CloseCode::Normal,
                    reason: "Client disconnect".into(),
                })))
                .await;
            let _ = sink.close().await;
            tracing::info!("Disconnected from {}", self.config.url);
        }

        // A reader parked in `recv` holds the stream; it drops it on the close echo.
        if let Ok(mut source) = self.source.try_lock() {
            source.take();
        }
        Ok(())
    }
}

/// Extract close code and reason from an optional CloseFrame.
fn extract_close(frame: Option<&CloseFrame>) -> (u16, String) {
    match frame {
        Some(f) => (f.code.into(), f.reason.to_string()),
        None => (1006, "No close frame".into()),
    }
}
