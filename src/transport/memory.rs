//! In-process transport: the client on one end, a scripted peer on the other.
//!
//! Useful for driving the client without a network: the peer sees every
//! request the client sends and decides what comes back, and in what order.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};

use crate::error::WsError;
use crate::transport::Transport;

enum Frame {
    Message(Value),
    Close,
    Fail(WsError),
}

/// Client end of an in-process duplex channel.
pub struct MemoryTransport {
    outbound_tx: mpsc::UnboundedSender<Value>,
    inbound_rx: Mutex<mpsc::UnboundedReceiver<Frame>>,
    open: AtomicBool,
    sends: AtomicUsize,
    connects: AtomicUsize,
}

/// Peer end: reads what the client sent, delivers what the client receives.
pub struct MemoryPeer {
    outbound_rx: mpsc::UnboundedReceiver<Value>,
    inbound_tx: mpsc::UnboundedSender<Frame>,
}

impl MemoryTransport {
    /// Create a connected pair. The transport starts closed.
    pub fn pair() -> (Self, MemoryPeer) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        let transport = Self {
            outbound_tx,
            inbound_rx: Mutex::new(inbound_rx),
            open: AtomicBool::new(false),
            sends: AtomicUsize::new(0),
            connects: AtomicUsize::new(0),
        };
        let peer = MemoryPeer {
            outbound_rx,
            inbound_tx,
        };
        (transport, peer)
    }

    /// Number of `send` calls, successful or not.
    pub fn send_count(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }

    /// Number of times the transport went from closed to open.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn connect(&self) -> Result<(), WsError> {
        if !self.open.swap(true, Ordering::SeqCst) {
            self.connects.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn send(&self, message: Value) -> Result<(), WsError> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        if !self.is_open() {
            return Err(WsError::NotConnected);
        }
        self.outbound_tx
            .send(message)
            .map_err(|_| WsError::SendFailed("Peer dropped".into()))
    }

    async fn recv(&self) -> Result<Option<Value>, WsError> {
        let mut rx = self.inbound_rx.lock().await;
        match rx.recv().await {
            Some(Frame::Message(message)) => Ok(Some(message)),
            Some(Frame::Close) | None => {
                self.open.store(false, Ordering::SeqCst);
                Ok(None)
            }
            Some(Frame::Fail(err)) => {
                self.open.store(false, Ordering::SeqCst);
                Err(err)
            }
        }
    }

    async fn close(&self) -> Result<(), WsError> {
        self.open.store(false, Ordering::SeqCst);
        Ok(())
    }
}

impl MemoryPeer {
    /// Next request the client sent. `None` once the transport is dropped.
    pub async fn next_request(&mut self) -> Option<Value> {
        self.outbound_rx.recv().await
    }

    /// A request the client already sent, without waiting.
    pub fn try_next_request(&mut self) -> Option<Value> {
        self.outbound_rx.try_recv().ok()
    }

    /// Deliver an arbitrary message to the client.
    pub fn deliver(&self, message: Value) -> bool {
        self.inbound_tx.send(Frame::Message(message)).is_ok()
    }

    /// Deliver `{"id": id, "result": result}`.
    pub fn respond(&self, id: u64, result: Value) -> bool {
        self.deliver(json!({"jsonrpc": "2.0", "id": id, "result": result}))
    }

    /// Deliver `{"id": id, "error": {"code": code, "message": message}}`.
    pub fn respond_error(&self, id: u64, code: i64, message: &str) -> bool {
        self.deliver(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": code, "message": message}
        }))
    }

    /// Close the connection from the peer side.
    pub fn close(&self) -> bool {
        self.inbound_tx.send(Frame::Close).is_ok()
    }

    /// Make the client's next receive fail with `err`.
    pub fn fail(&self, err: WsError) -> bool {
        self.inbound_tx.send(Frame::Fail(err)).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_send_requires_connect() {
        let (transport, _peer) = MemoryTransport::pair();
        let result = transport.send(json!({"id": 1})).await;
        assert_eq!(result, Err(WsError::NotConnected));
        assert_eq!(transport.send_count(), 1);
    }

    #[tokio::test]
    async fn test_round_trip() {
        let (transport, mut peer) = MemoryTransport::pair();
        transport.connect().await.unwrap();

        transport.send(json!({"id": 1, "method": "public/test"})).await.unwrap();
        let request = peer.next_request().await.unwrap();
        assert_eq!(request["method"], "public/test");

        peer.respond(1, json!({"version": "1.2.26"}));
        let response = transport.recv().await.unwrap().unwrap();
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["version"], "1.2.26");
    }

    #[tokio::test]
    async fn test_connect_is_idempotent() {
        let (transport, _peer) = MemoryTransport::pair();
        assert_ok!(transport.connect().await);
        assert_ok!(transport.connect().await);
        assert_eq!(transport.connect_count(), 1);

        assert_ok!(transport.close().await);
        assert_ok!(transport.close().await);
        assert!(!transport.is_open());

        transport.connect().await.unwrap();
        assert_eq!(transport.connect_count(), 2);
    }

    #[tokio::test]
    async fn test_peer_close_ends_stream() {
        let (transport, peer) = MemoryTransport::pair();
        transport.connect().await.unwrap();
        peer.close();
        assert_eq!(transport.recv().await.unwrap(), None);
        assert!(!transport.is_open());
    }

    #[tokio::test]
    async fn test_peer_fail() {
        let (transport, peer) = MemoryTransport::pair();
        transport.connect().await.unwrap();
        peer.fail(WsError::ReceiveFailed("reset by peer".into()));
        assert_eq!(
            transport.recv().await,
            Err(WsError::ReceiveFailed("reset by peer".into()))
        );
    }

    #[tokio::test]
    async fn test_messages_keep_delivery_order() {
        let (transport, peer) = MemoryTransport::pair();
        transport.connect().await.unwrap();
        for i in 0..5 {
            peer.deliver(json!({"seq": i}));
        }
        for i in 0..5 {
            let msg = transport.recv().await.unwrap().unwrap();
            assert_eq!(msg["seq"], i);
        }
    }
}
