//! Reader task: the only caller of `Transport::recv`.
//!
//! Each inbound message is either a response, handed to the caller waiting
//! on its id, or a push, handed to the subscriber for its symbol.

use std::sync::Arc;

use serde_json::Value;

use super::{ClientEvent, Shared};
use crate::rpc::InboundMessage;

pub(super) async fn run(shared: Arc<Shared>) {
    tracing::debug!("Reader task started");

    let reason = loop {
        match shared.transport.recv().await {
            Ok(Some(message)) => route(&shared, message).await,
            Ok(None) => break "Connection closed".to_string(),
            Err(e) => {
                tracing::error!("Transport receive failed: {}", e);
                break e.to_string();
            }
        }
    };

    shared.connection_lost(reason);
}

async fn route(shared: &Shared, message: Value) {
    match InboundMessage::classify(message) {
        InboundMessage::Response(response) => {
            let id = response.id;
            if !shared.pending.resolve(response) {
                tracing::warn!("No pending request for response id {:?}", id);
                if let Some(id) = id {
                    shared.emit(ClientEvent::UnmatchedResponse { id });
                }
            }
        }
        InboundMessage::Push(push) => {
            shared.on_market_data_received(&push).await;
        }
        InboundMessage::Invalid { raw, reason } => {
            tracing::warn!("Undecodable response: {} ({})", reason, raw);
            shared.emit(ClientEvent::MalformedPush { reason });
        }
    }
}
