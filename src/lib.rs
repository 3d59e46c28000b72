//! # Deribit Trader SDK
//!
//! An async client core for the Deribit JSON-RPC API over WebSocket.
//!
//! ## Architecture
//!
//! The SDK is organized in layers:
//!
//! 1. **Core**: envelopes, method names, params, id generation, errors
//! 2. **Auth**: `client_credentials` grant, session payload, per-connection auth flag
//! 3. **Dispatch**: symbol-keyed subscriber registry for market-data pushes
//! 4. **Transport**: `Transport` trait with a `tokio-tungstenite` implementation and an in-process pair
//! 5. **High-Level Client**: `DeribitClient` with response correlation and nested sub-clients
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use deribit_trader_sdk::prelude::*;
//! use std::time::Duration;
//!
//! let client = DeribitClient::builder()
//!     .request_timeout(Duration::from_secs(5))
//!     .build_native(TransportConfig::default());
//! client.connect().await?;
//!
//! let ticker = client.market().get_ticker("BTC-PERPETUAL").await?;
//! client.authenticate(&client_id, &client_secret).await?;
//! let placed = client.orders().place_buy_order("BTC-PERPETUAL", 10.0, 50000.0).await?;
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Order side and input validation.
pub mod shared;

/// JSON-RPC envelopes, methods, params, request ids.
pub mod rpc;

/// Unified SDK error types.
pub mod error;

/// Network URL constants.
pub mod network;

/// Latency timing.
pub mod latency;

// ── Layer 2: Auth ────────────────────────────────────────────────────────────

/// Authentication: credentials grant, session, auth flag.
pub mod auth;

// ── Layer 3: Dispatch ────────────────────────────────────────────────────────

/// Market-data push routing.
pub mod dispatch;

// ── Layer 4: Transport ───────────────────────────────────────────────────────

/// Duplex message channel to the exchange.
pub mod transport;

// ── Layer 5: High-Level Client ───────────────────────────────────────────────

/// `DeribitClient`, the primary entry point.
pub mod client;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    pub use crate::shared::Side;

    // Protocol
    pub use crate::rpc::{InboundMessage, RequestEnvelope, ResponseEnvelope, RpcErrorPayload, RpcMethod};

    // Errors
    pub use crate::error::{SdkError, SdkResult, WsError};

    // Network
    pub use crate::network::{DEFAULT_WS_URL, DERIBIT_TESTNET_WS_URL, DERIBIT_WS_URL};

    // Auth
    pub use crate::auth::AuthSession;

    // Dispatch
    pub use crate::dispatch::{DispatchOutcome, MarketDataPush};

    // Transport
    pub use crate::transport::{MemoryPeer, MemoryTransport, Transport, TransportConfig};
    #[cfg(feature = "ws-native")]
    pub use crate::transport::WsTransport;

    // Client + sub-clients
    pub use crate::client::{
        ClientConfig, ClientEvent, DeribitClient, DeribitClientBuilder, MarketClient, OrdersClient,
    };
}
