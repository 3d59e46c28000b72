//! Network URL constants for the Deribit SDK.

/// Production WebSocket JSON-RPC endpoint.
pub const DERIBIT_WS_URL: &str = "wss://www.deribit.com/ws/api/v2";

/// Testnet WebSocket JSON-RPC endpoint.
pub const DERIBIT_TESTNET_WS_URL: &str = "wss://test.deribit.com/ws/api/v2";

/// Default WebSocket URL (testnet).
pub const DEFAULT_WS_URL: &str = DERIBIT_TESTNET_WS_URL;

/// JSON-RPC protocol version carried on every request.
pub const JSONRPC_VERSION: &str = "2.0";
