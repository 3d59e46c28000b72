//! JSON-RPC 2.0 envelopes, method names and per-method parameters.
//!
//! Requests are built once, with their id fixed at construction. Inbound
//! messages are classified by shape: anything carrying a numeric `id` is a
//! response to one of our requests, everything else is a push.

pub mod id;
pub mod params;
pub(crate) mod pending;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::network::JSONRPC_VERSION;

pub use id::RequestIdGenerator;
pub use params::{
    CancelParams, ChannelsParams, CurrencyParams, EditParams, EmptyParams, InstrumentParams,
    InstrumentsParams, OrderParams, OrderType,
};

// ─── Methods ─────────────────────────────────────────────────────────────────

/// Every JSON-RPC method this client knows how to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RpcMethod {
    #[serde(rename = "public/auth")]
    Auth,
    #[serde(rename = "public/get_instruments")]
    GetInstruments,
    #[serde(rename = "public/ticker")]
    Ticker,
    #[serde(rename = "public/get_order_book")]
    GetOrderBook,
    #[serde(rename = "public/subscribe")]
    Subscribe,
    #[serde(rename = "public/unsubscribe")]
    Unsubscribe,
    #[serde(rename = "private/buy")]
    Buy,
    #[serde(rename = "private/sell")]
    Sell,
    #[serde(rename = "private/cancel")]
    Cancel,
    #[serde(rename = "private/edit")]
    Edit,
    #[serde(rename = "private/get_positions")]
    GetPositions,
    #[serde(rename = "private/get_open_orders_by_currency")]
    GetOpenOrdersByCurrency,
}

impl RpcMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "public/auth",
            Self::GetInstruments => "public/get_instruments",
            Self::Ticker => "public/ticker",
            Self::GetOrderBook => "public/get_order_book",
            Self::Subscribe => "public/subscribe",
            Self::Unsubscribe => "public/unsubscribe",
            Self::Buy => "private/buy",
            Self::Sell => "private/sell",
            Self::Cancel => "private/cancel",
            Self::Edit => "private/edit",
            Self::GetPositions => "private/get_positions",
            Self::GetOpenOrdersByCurrency => "private/get_open_orders_by_currency",
        }
    }

    /// Whether the method needs an authenticated session.
    pub fn is_private(&self) -> bool {
        self.as_str().starts_with("private/")
    }
}

impl std::fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Request ─────────────────────────────────────────────────────────────────

/// JSON-RPC 2.0 request envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestEnvelope {
    /// JSON-RPC version (always "2.0").
    pub jsonrpc: &'static str,
    /// Request ID for correlation.
    pub id: u64,
    /// JSON-RPC method name.
    pub method: RpcMethod,
    /// Method-specific parameters, always a JSON object.
    pub params: Value,
}

impl RequestEnvelope {
    /// Builds an envelope, serializing `params` into a JSON object.
    pub fn new<P: Serialize>(id: u64, method: RpcMethod, params: &P) -> serde_json::Result<Self> {
        Ok(Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params: serde_json::to_value(params)?,
        })
    }

    /// The wire form of this request.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

// ─── Response ────────────────────────────────────────────────────────────────

/// JSON-RPC 2.0 response envelope.
///
/// Returned to callers verbatim: an `error` payload is a valid outcome,
/// not a failure of the call itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// JSON-RPC version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    /// Request ID (absent for pushes).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Success result (mutually exclusive with error).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error details (mutually exclusive with result).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorPayload>,
    /// Whether this is from testnet.
    #[serde(default)]
    pub testnet: bool,
    /// Server receive timestamp (microseconds).
    #[serde(rename = "usIn", default, skip_serializing_if = "Option::is_none")]
    pub us_in: Option<u64>,
    /// Server send timestamp (microseconds).
    #[serde(rename = "usOut", default, skip_serializing_if = "Option::is_none")]
    pub us_out: Option<u64>,
    /// Processing time difference (microseconds).
    #[serde(rename = "usDiff", default, skip_serializing_if = "Option::is_none")]
    pub us_diff: Option<u64>,
}

impl ResponseEnvelope {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Split into the result payload or the exchange's error payload.
    ///
    /// A response carrying neither is reported as an error with code 0.
    pub fn into_result(self) -> Result<Value, RpcErrorPayload> {
        match (self.result, self.error) {
            (_, Some(err)) => Err(err),
            (Some(result), None) => Ok(result),
            (None, None) => Err(RpcErrorPayload {
                code: 0,
                message: "Response carried neither result nor error".to_string(),
                data: None,
            }),
        }
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorPayload {
    /// Error code.
    pub code: i64,
    /// Error message.
    pub message: String,
    /// Additional error data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl std::fmt::Display for RpcErrorPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

// ─── Inbound classification ──────────────────────────────────────────────────

/// An inbound message, sorted by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Carries an `id`: a reply to one of our requests.
    Response(ResponseEnvelope),
    /// No `id`: an unsolicited push.
    Push(Value),
    /// Carries an `id` but is not a decodable response.
    Invalid { raw: Value, reason: String },
}

impl InboundMessage {
    pub fn classify(raw: Value) -> Self {
        let has_id = raw.get("id").map(|id| !id.is_null()).unwrap_or(false);
        if !has_id {
            return Self::Push(raw);
        }

        match ResponseEnvelope::deserialize(&raw) {
            Ok(response) => Self::Response(response),
            Err(e) => Self::Invalid {
                reason: e.to_string(),
                raw,
            },
        }
    }
}
