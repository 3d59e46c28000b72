//! High-level client: `DeribitClient` with nested sub-client accessors.
//!
//! The client owns the connection lifecycle, the auth flag, the request id
//! counter and the subscriber registry. Every request goes through one
//! correlation path: register a waiter under a fresh id, send, and wait for
//! the reader task to hand back the response carrying that id.
//!
//! Sub-clients group the operations:
//! - [`Market`]: public queries and channel subscriptions
//! - [`Orders`]: order entry and account queries, gated on authentication

pub mod market;
pub mod orders;
mod reader;

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::Stream;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::auth::{AuthParams, AuthSession, AuthState};
use crate::dispatch::{DispatchOutcome, MarketDataCallback, SubscriberRegistry};
use crate::error::{SdkError, SdkResult};
use crate::latency;
use crate::rpc::pending::{PendingGuard, PendingRequests};
use crate::rpc::{RequestEnvelope, RequestIdGenerator, ResponseEnvelope, RpcMethod};
use crate::transport::Transport;

pub use market::Market as MarketClient;
pub use orders::Orders as OrdersClient;

use market::Market;
use orders::Orders;

const MARKET_DATA_LATENCY_LABEL: &str = "Market Data Processing Latency";

// ─── Events ──────────────────────────────────────────────────────────────────

/// Connection and dispatch events, delivered best-effort through
/// [`DeribitClient::events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Connected,
    Disconnected { reason: String },
    Authenticated,
    /// A push arrived for a symbol nobody is subscribed to.
    NoSubscriber { symbol: String },
    /// A push, or a message carrying an id, that could not be interpreted.
    MalformedPush { reason: String },
    /// A response whose id has no waiting caller, e.g. after a timeout.
    UnmatchedResponse { id: u64 },
    /// The subscriber for `symbol` panicked while handling a push.
    SubscriberPanicked { symbol: String },
}

// ─── Config ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// How long a caller waits for its correlated response.
    pub request_timeout: Duration,
    /// Capacity of the event channel. Events are dropped when it is full.
    pub event_channel_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            event_channel_capacity: 256,
        }
    }
}

// ─── Shared state ────────────────────────────────────────────────────────────

/// State shared by every clone of the client and the reader task.
pub(crate) struct Shared {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) config: ClientConfig,
    pub(crate) ids: RequestIdGenerator,
    pub(crate) auth: AuthState,
    pub(crate) pending: PendingRequests,
    pub(crate) subscribers: SubscriberRegistry,
    pub(crate) connected: AtomicBool,
    /// Bumped on every connect and every disconnect.
    pub(crate) generation: AtomicU64,
    event_tx: mpsc::Sender<ClientEvent>,
}

impl Shared {
    pub(crate) fn emit(&self, event: ClientEvent) {
        if let Err(e) = self.event_tx.try_send(event) {
            tracing::trace!("Client event dropped: {}", e);
        }
    }

    pub(crate) async fn handle_market_data(&self, push: &Value) -> DispatchOutcome {
        let outcome = self.subscribers.dispatch(push).await;
        match &outcome {
            DispatchOutcome::Delivered { symbol } => {
                tracing::trace!("Market data delivered for {}", symbol);
            }
            DispatchOutcome::NoSubscriber { symbol } => {
                tracing::warn!("No subscribers for symbol: {}", symbol);
                self.emit(ClientEvent::NoSubscriber {
                    symbol: symbol.clone(),
                });
            }
            DispatchOutcome::MalformedPush { reason } => {
                tracing::warn!("Invalid market data: {}", reason);
                self.emit(ClientEvent::MalformedPush {
                    reason: reason.clone(),
                });
            }
            DispatchOutcome::SubscriberPanicked { symbol } => {
                tracing::error!("Subscriber for {} panicked", symbol);
                self.emit(ClientEvent::SubscriberPanicked {
                    symbol: symbol.clone(),
                });
            }
        }
        outcome
    }

    pub(crate) async fn on_market_data_received(&self, push: &Value) -> DispatchOutcome {
        let mark = latency::start();
        let outcome = self.handle_market_data(push).await;
        latency::end(mark, MARKET_DATA_LATENCY_LABEL);
        outcome
    }

    /// Transition to disconnected. Only the first caller after a connect
    /// does the cleanup, so the reader and `disconnect` may race safely.
    ///
    /// The flag flip and the drain happen under the pending-table lock, so a
    /// request registered on a newer connection is never failed here.
    pub(crate) fn connection_lost(&self, reason: String) {
        let transition = || {
            if !self.connected.swap(false, Ordering::AcqRel) {
                return false;
            }
            self.generation.fetch_add(1, Ordering::AcqRel);
            self.auth.reset();
            true
        };
        let Some(failed) = self.pending.fail_all_if(transition) else {
            return;
        };
        if failed > 0 {
            tracing::warn!("{} pending request(s) failed on disconnect", failed);
        }
        tracing::info!("Disconnected: {}", reason);
        self.emit(ClientEvent::Disconnected { reason });
    }
}

/// Holds the reader task. Dropping the last client clone stops it.
struct ReaderSlot {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for ReaderSlot {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.get_mut().take() {
            handle.abort();
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Client
// ═════════════════════════════════════════════════════════════════════════════

/// The primary entry point.
///
/// Cheap to clone; clones share the connection, auth state and subscribers.
#[derive(Clone)]
pub struct DeribitClient {
    pub(crate) shared: Arc<Shared>,
    reader: Arc<ReaderSlot>,
    events: Arc<Mutex<mpsc::Receiver<ClientEvent>>>,
}

impl DeribitClient {
    pub fn builder() -> DeribitClientBuilder {
        DeribitClientBuilder::default()
    }

    /// A client with default configuration over `transport`.
    pub fn new<T: Transport>(transport: Arc<T>) -> Self {
        Self::builder().build(transport)
    }

    // ── Sub-client accessors ─────────────────────────────────────────────

    pub fn market(&self) -> Market<'_> {
        Market { client: self }
    }

    pub fn orders(&self) -> Orders<'_> {
        Orders { client: self }
    }

    // ── Connection lifecycle ─────────────────────────────────────────────

    /// Open the transport and start the reader task. No-op when connected.
    pub async fn connect(&self) -> SdkResult<()> {
        let mut slot = self.reader.handle.lock().await;
        if self.is_connected() {
            return Ok(());
        }

        self.shared.transport.connect().await?;
        if let Some(stale) = slot.take() {
            stale.abort();
        }

        self.shared.auth.reset();
        self.shared.generation.fetch_add(1, Ordering::AcqRel);
        self.shared.connected.store(true, Ordering::Release);
        *slot = Some(tokio::spawn(reader::run(Arc::clone(&self.shared))));

        tracing::info!("Client connected");
        self.shared.emit(ClientEvent::Connected);
        Ok(())
    }

    /// Stop the reader, close the transport and fail every pending request.
    ///
    /// The connection is unauthenticated afterwards.
    pub async fn disconnect(&self) -> SdkResult<()> {
        let mut slot = self.reader.handle.lock().await;
        if let Some(handle) = slot.take() {
            handle.abort();
            let _ = handle.await;
        }

        let closed = self.shared.transport.close().await;
        self.shared.connection_lost("Client disconnect".to_string());
        closed.map_err(SdkError::from)
    }

    /// Disconnect, then connect again. Authentication must be redone; request
    /// ids keep counting from where they were.
    pub async fn reconnect(&self) -> SdkResult<()> {
        self.disconnect().await?;
        self.connect().await
    }

    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    pub fn is_authenticated(&self) -> bool {
        self.shared.auth.is_authenticated()
    }

    /// Number of requests still waiting for a response.
    pub fn pending_requests(&self) -> usize {
        self.shared.pending.len()
    }

    /// Get a stream of client events.
    ///
    /// All clones share one event queue; each event goes to one reader.
    pub fn events(&self) -> Pin<Box<dyn Stream<Item = ClientEvent> + Send + '_>> {
        Box::pin(futures_util::stream::unfold(
            &self.events,
            |rx| async move {
                let mut guard = rx.lock().await;
                guard.recv().await.map(|event| (event, rx))
            },
        ))
    }

    // ── Authentication ───────────────────────────────────────────────────

    /// Authenticate the connection with API key credentials.
    ///
    /// On success the connection is authenticated and the session is
    /// returned. An error payload from the exchange leaves the connection
    /// unauthenticated and fails with [`SdkError::AuthenticationFailed`].
    ///
    /// Trust is granted only to the connection the request went out on. If
    /// that connection dropped or was replaced before the response was
    /// handled, the call fails with [`SdkError::Disconnected`].
    pub async fn authenticate(&self, client_id: &str, client_secret: &str) -> SdkResult<AuthSession> {
        let generation = self.shared.generation.load(Ordering::Acquire);
        let params = AuthParams::client_credentials(client_id, client_secret);
        let response = self.request(RpcMethod::Auth, &params).await?;

        match response.into_result() {
            Ok(result) => {
                let session = AuthSession::from_result(result)?;
                if !self.mark_authenticated_for(generation) {
                    tracing::warn!("Connection changed before authentication completed");
                    return Err(SdkError::Disconnected);
                }
                tracing::info!("Authenticated, token valid for {}s", session.expires_in);
                self.shared.emit(ClientEvent::Authenticated);
                Ok(session)
            }
            Err(err) => {
                self.shared.auth.reset();
                tracing::warn!("Authentication failed: {}", err);
                Err(SdkError::AuthenticationFailed(err.to_string()))
            }
        }
    }

    /// Set the auth flag if the connection is still the one of `generation`.
    ///
    /// The generation is checked again after setting the flag: a reconnect
    /// that slipped in between clears it rather than leaving stale trust.
    fn mark_authenticated_for(&self, generation: u64) -> bool {
        let shared = &*self.shared;
        let current = || {
            shared.connected.load(Ordering::Acquire)
                && shared.generation.load(Ordering::Acquire) == generation
        };
        if !current() {
            return false;
        }
        self.shared.auth.mark_authenticated();
        if !current() {
            self.shared.auth.reset();
            return false;
        }
        true
    }

    pub(crate) fn ensure_authenticated(&self) -> SdkResult<()> {
        if !self.is_authenticated() {
            return Err(SdkError::AuthRequired);
        }
        Ok(())
    }

    // ── Market data ──────────────────────────────────────────────────────

    /// Register `callback` for pushes carrying `symbol`, replacing any
    /// previous callback for it.
    pub async fn add_subscriber<F>(&self, symbol: &str, callback: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let callback: MarketDataCallback = Arc::new(callback);
        if self.shared.subscribers.insert(symbol, callback).await {
            tracing::debug!("Replaced subscriber for {}", symbol);
        }
    }

    pub async fn remove_subscriber(&self, symbol: &str) -> bool {
        self.shared.subscribers.remove(symbol).await
    }

    /// Route one push to its subscriber. Unroutable pushes are logged and
    /// reported as events; they never fail.
    pub async fn handle_market_data(&self, push: &Value) -> DispatchOutcome {
        self.shared.handle_market_data(push).await
    }

    /// [`handle_market_data`](Self::handle_market_data), timed with the latency logger.
    pub async fn on_market_data_received(&self, push: &Value) -> DispatchOutcome {
        self.shared.on_market_data_received(push).await
    }

    // ── Request core ─────────────────────────────────────────────────────

    /// Send one request and wait for the response carrying its id.
    ///
    /// The response is returned verbatim, error payload included.
    pub(crate) async fn request<P: Serialize>(
        &self,
        method: RpcMethod,
        params: &P,
    ) -> SdkResult<ResponseEnvelope> {
        if !self.is_connected() {
            return Err(SdkError::Disconnected);
        }

        let id = self.shared.ids.next_id();
        let message = RequestEnvelope::new(id, method, params)?.to_value()?;

        let mark = latency::start();
        let rx = self.shared.pending.register(id, method);
        let _entry = PendingGuard::new(&self.shared.pending, id);
        if !self.is_connected() {
            return Err(SdkError::Disconnected);
        }

        tracing::debug!("Sending {} (id {})", method, id);
        if let Err(e) = self.shared.transport.send(message).await {
            tracing::warn!("Send failed for {} (id {}): {}", method, id, e);
            return Err(e.into());
        }

        let response = match tokio::time::timeout(self.shared.config.request_timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(SdkError::Disconnected),
            Err(_) => {
                tracing::warn!("Timed out waiting for {} (id {})", method, id);
                return Err(SdkError::Timeout {
                    id,
                    method: method.to_string(),
                });
            }
        };

        latency::end(mark, method.as_str());
        tracing::debug!("Received response for {} (id {})", method, id);
        Ok(response)
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

#[derive(Default)]
pub struct DeribitClientBuilder {
    config: ClientConfig,
}

impl DeribitClientBuilder {
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn event_channel_capacity(mut self, capacity: usize) -> Self {
        self.config.event_channel_capacity = capacity.max(1);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn build<T: Transport>(self, transport: Arc<T>) -> DeribitClient {
        let transport: Arc<dyn Transport> = transport;
        let (event_tx, event_rx) = mpsc::channel(self.config.event_channel_capacity);

        DeribitClient {
            shared: Arc::new(Shared {
                transport,
                config: self.config,
                ids: RequestIdGenerator::new(),
                auth: AuthState::new(),
                pending: PendingRequests::new(),
                subscribers: SubscriberRegistry::new(),
                connected: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                event_tx,
            }),
            reader: Arc::new(ReaderSlot {
                handle: Mutex::new(None),
            }),
            events: Arc::new(Mutex::new(event_rx)),
        }
    }

    /// Build over a native WebSocket transport.
    #[cfg(feature = "ws-native")]
    pub fn build_native(self, config: crate::transport::TransportConfig) -> DeribitClient {
        self.build(Arc::new(crate::transport::WsTransport::new(config)))
    }
}
