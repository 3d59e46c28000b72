//! Market-data dispatch: routes each push to the callback for its symbol.
//!
//! A push is routed by its symbol: a top-level `symbol` field, or for
//! subscription notifications (`{"method": "subscription", "params": {...}}`)
//! the `instrument_name` inside `params.data`. Pushes that cannot be routed
//! are not errors; they come back as a [`DispatchOutcome`].

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

/// An unsolicited message from the exchange: any JSON value without an `id`.
pub type MarketDataPush = Value;

/// Callback invoked with the full push payload.
pub type MarketDataCallback = Arc<dyn Fn(&MarketDataPush) + Send + Sync>;

/// What happened to one push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Handed to the subscriber registered for `symbol`.
    Delivered { symbol: String },
    /// Well-formed, but nobody is subscribed to `symbol`.
    NoSubscriber { symbol: String },
    /// No usable symbol in the payload.
    MalformedPush { reason: String },
    /// The subscriber for `symbol` panicked. The registry and the reader
    /// carry on; the subscriber stays registered.
    SubscriberPanicked { symbol: String },
}

impl DispatchOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

/// Resolve the routing symbol of a push.
pub fn push_symbol(push: &Value) -> Result<&str, String> {
    if let Some(symbol) = push.get("symbol") {
        return symbol
            .as_str()
            .ok_or_else(|| format!("'symbol' is not a string: {}", symbol));
    }

    let notification_symbol = push
        .get("params")
        .and_then(|p| p.get("data"))
        .and_then(|d| d.get("instrument_name"))
        .and_then(Value::as_str);

    notification_symbol.ok_or_else(|| "Missing 'symbol'".to_string())
}

/// Symbol → callback map. The last registration for a symbol wins.
#[derive(Default)]
pub struct SubscriberRegistry {
    subscribers: RwLock<HashMap<String, MarketDataCallback>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `symbol`. Returns `true` if it replaced one.
    pub async fn insert(&self, symbol: impl Into<String>, callback: MarketDataCallback) -> bool {
        self.subscribers
            .write()
            .await
            .insert(symbol.into(), callback)
            .is_some()
    }

    pub async fn remove(&self, symbol: &str) -> bool {
        self.subscribers.write().await.remove(symbol).is_some()
    }

    pub async fn contains(&self, symbol: &str) -> bool {
        self.subscribers.read().await.contains_key(symbol)
    }

    pub async fn len(&self) -> usize {
        self.subscribers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.subscribers.read().await.is_empty()
    }

    /// Route `push` to its subscriber.
    ///
    /// The callback runs after the registry lock is released, so a callback
    /// may itself register or remove subscribers. A panic in the callback is
    /// caught and reported as [`DispatchOutcome::SubscriberPanicked`].
    pub async fn dispatch(&self, push: &Value) -> DispatchOutcome {
        let symbol = match push_symbol(push) {
            Ok(symbol) => symbol,
            Err(reason) => return DispatchOutcome::MalformedPush { reason },
        };

        let callback = self.subscribers.read().await.get(symbol).cloned();
        match callback {
            Some(callback) => {
                let symbol = symbol.to_string();
                match panic::catch_unwind(AssertUnwindSafe(|| callback(push))) {
                    Ok(()) => DispatchOutcome::Delivered { symbol },
                    Err(_) => DispatchOutcome::SubscriberPanicked { symbol },
                }
            }
            None => DispatchOutcome::NoSubscriber {
                symbol: symbol.to_string(),
            },
        }
    }
}
