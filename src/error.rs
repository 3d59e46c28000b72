//! Unified SDK error types.

use thiserror::Error;

/// Top-level SDK error.
///
/// Argument and auth-gate failures are raised before any I/O. Transport
/// failures are carried through unchanged.
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Operation requires authentication. Please authenticate first.")]
    AuthRequired,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Transport error: {0}")]
    Transport(#[from] WsError),

    #[error("Timed out waiting for response to {method} (id {id})")]
    Timeout { id: u64, method: String },

    #[error("Disconnected before a response was received")]
    Disconnected,

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl SdkError {
    /// Whether the error was detected locally, before anything was sent.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::AuthRequired | Self::InvalidArgument(_))
    }
}

/// Transport-layer errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WsError {
    #[error("Not connected")]
    NotConnected,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Connection closed: code={code:?} reason={reason}")]
    Closed { code: Option<u16>, reason: String },

    #[error("Operation timed out")]
    Timeout,
}

#[cfg(feature = "ws-native")]
impl From<tokio_tungstenite::tungstenite::Error> for WsError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error;
        match err {
            Error::ConnectionClosed => WsError::Closed {
                code: Some(1000),
                reason: "Connection closed normally".to_string(),
            },
            Error::AlreadyClosed => WsError::NotConnected,
            Error::Url(e) => WsError::ConnectionFailed(e.to_string()),
            Error::Http(resp) => {
                WsError::ConnectionFailed(format!("HTTP error: {:?}", resp.status()))
            }
            Error::HttpFormat(e) => WsError::ConnectionFailed(e.to_string()),
            other => WsError::ReceiveFailed(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for WsError {
    fn from(err: serde_json::Error) -> Self {
        WsError::DeserializationError(err.to_string())
    }
}

/// Result type alias for SDK operations.
pub type SdkResult<T> = Result<T, SdkError>;
