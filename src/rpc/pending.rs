//! Pending-request table: request id → waiting caller.
//!
//! Critical sections are short and never await, so a std mutex guards the
//! table. That lets a dropped caller remove its own entry from `Drop`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use super::{ResponseEnvelope, RpcMethod};

struct PendingEntry {
    method: RpcMethod,
    tx: oneshot::Sender<ResponseEnvelope>,
}

/// Callers register before sending and await their receiver; the reader
/// task resolves entries as responses arrive, in whatever order they arrive.
#[derive(Default)]
pub(crate) struct PendingRequests {
    entries: Mutex<HashMap<u64, PendingEntry>>,
}

impl PendingRequests {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, PendingEntry>> {
        // Entries stay consistent even if a holder panicked.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn register(&self, id: u64, method: RpcMethod) -> oneshot::Receiver<ResponseEnvelope> {
        let (tx, rx) = oneshot::channel();
        if self.lock().insert(id, PendingEntry { method, tx }).is_some() {
            tracing::warn!("Replaced pending entry for request id {}", id);
        }
        rx
    }

    /// Hand a response to its waiting caller.
    ///
    /// Returns `false` when no caller is waiting on that id (late response
    /// after a timeout, or an id this client never issued).
    pub(crate) fn resolve(&self, response: ResponseEnvelope) -> bool {
        let Some(id) = response.id else {
            return false;
        };
        let Some(entry) = self.lock().remove(&id) else {
            return false;
        };

        tracing::debug!("Resolved response for {} (id {})", entry.method, id);
        if entry.tx.send(response).is_err() {
            tracing::debug!("Caller for request id {} stopped waiting", id);
        }
        true
    }

    pub(crate) fn remove(&self, id: u64) -> bool {
        self.lock().remove(&id).is_some()
    }

    /// Run `transition` with the table locked and, if it returns `true`, drop
    /// every entry so their callers observe a closed channel.
    ///
    /// Nothing can register between the transition and the drain. Returns
    /// the number of failed entries, or `None` if `transition` declined.
    pub(crate) fn fail_all_if(&self, transition: impl FnOnce() -> bool) -> Option<usize> {
        let mut entries = self.lock();
        if !transition() {
            return None;
        }
        let count = entries.len();
        entries.clear();
        Some(count)
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }
}

/// Removes its entry when dropped, so a caller that stops waiting (timeout,
/// send failure, or its future being dropped) never leaves one behind.
pub(crate) struct PendingGuard<'a> {
    pending: &'a PendingRequests,
    id: u64,
}

impl<'a> PendingGuard<'a> {
    pub(crate) fn new(pending: &'a PendingRequests, id: u64) -> Self {
        Self { pending, id }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.pending.remove(self.id) {
            tracing::debug!("Released pending entry for request id {}", self.id);
        }
    }
}
