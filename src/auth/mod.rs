//! Authentication: credentials grant, session payload, connection auth state.
//!
//! ## Lifecycle
//!
//! - A fresh connection is unauthenticated.
//! - `public/auth` returning a `result` flips the flag to authenticated.
//! - `public/auth` returning an `error` leaves the connection unauthenticated.
//! - Any disconnect or reconnect resets the flag; the exchange binds the
//!   session to the socket, so trust never carries over to a new one.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Grant type used for API key authentication.
pub const CLIENT_CREDENTIALS: &str = "client_credentials";

// ============================================================================
// Request
// ============================================================================

/// Parameters of `public/auth` for the `client_credentials` grant.
#[derive(Clone, Serialize)]
pub struct AuthParams {
    pub grant_type: &'static str,
    pub client_id: String,
    pub client_secret: String,
}

impl AuthParams {
    pub fn client_credentials(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            grant_type: CLIENT_CREDENTIALS,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl std::fmt::Debug for AuthParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthParams")
            .field("grant_type", &self.grant_type)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// Session
// ============================================================================

/// The `result` of a successful `public/auth` call.
///
/// Fields the exchange adds beyond the documented ones are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    /// Token lifetime in seconds.
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub token_type: String,
    /// Local time the session was granted.
    #[serde(skip)]
    pub obtained_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AuthSession {
    /// Parse an auth result payload, stamping it with the current time.
    pub fn from_result(result: Value) -> serde_json::Result<Self> {
        let mut session: AuthSession = serde_json::from_value(result)?;
        session.obtained_at = Utc::now();
        Ok(session)
    }

    /// When the token expires, or `None` if `expires_in` is too large to
    /// land on a representable instant.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let lifetime = i64::try_from(self.expires_in)
            .ok()
            .and_then(Duration::try_seconds)?;
        self.obtained_at.checked_add_signed(lifetime)
    }

    /// Whether the token has expired as of `now`. A lifetime past the
    /// representable range never expires.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|expires_at| now >= expires_at)
    }
}

// ============================================================================
// Connection auth state
// ============================================================================

/// Authentication flag for the current connection.
#[derive(Debug, Default)]
pub struct AuthState {
    authenticated: AtomicBool,
}

impl AuthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::Acquire)
    }

    pub(crate) fn mark_authenticated(&self) {
        self.authenticated.store(true, Ordering::Release);
    }

    /// Back to unauthenticated. Returns whether the flag was set.
    pub(crate) fn reset(&self) -> bool {
        self.authenticated.swap(false, Ordering::AcqRel)
    }
}
