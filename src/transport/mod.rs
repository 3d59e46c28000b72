//! Transport layer: a duplex channel of JSON messages.
//!
//! The client talks to the exchange only through [`Transport`]:
//! - `ws-native` feature: `tokio-tungstenite` ([`native::WsTransport`])
//! - always available: in-process pair ([`memory::MemoryTransport`])
//!
//! `recv` has exactly one caller at a time: the client's reader task.
//! `send` may be called concurrently from any number of tasks.

pub mod memory;

#[cfg(feature = "ws-native")]
pub mod native;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::WsError;

pub use memory::{MemoryPeer, MemoryTransport};
#[cfg(feature = "ws-native")]
pub use native::WsTransport;

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Open the connection. Calling it on an open connection is a no-op.
    async fn connect(&self) -> Result<(), WsError>;

    /// Send one message.
    async fn send(&self, message: Value) -> Result<(), WsError>;

    /// Next message from the peer, in delivery order. `Ok(None)` once the
    /// connection is closed.
    async fn recv(&self) -> Result<Option<Value>, WsError>;

    /// Close the connection. Calling it on a closed connection is a no-op.
    async fn close(&self) -> Result<(), WsError>;
}

/// Configuration for the native WebSocket transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub url: String,
    pub connect_timeout: Duration,
    pub send_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            url: crate::network::DEFAULT_WS_URL.to_string(),
            connect_timeout: Duration::from_secs(30),
            send_timeout: Duration::from_secs(10),
        }
    }
}

impl TransportConfig {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}
