//! Request identifier generation.

use std::sync::atomic::{AtomicU64, Ordering};

/// Per-client request id source.
///
/// Ids start at 1 and only ever increase. The counter belongs to one client
/// instance and survives reconnects, so an id is never reused by that client.
#[derive(Debug)]
pub struct RequestIdGenerator {
    next: AtomicU64,
}

impl RequestIdGenerator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Generates a unique request ID.
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::Relaxed) - 1
    }
}

impl Default for RequestIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_starts_at_one() {
        let ids = RequestIdGenerator::new();
        assert_eq!(ids.issued(), 0);
        assert_eq!(ids.next_id(), 1);
        assert_eq!(ids.next_id(), 2);
        assert_eq!(ids.issued(), 2);
    }

    #[test]
    fn test_instances_are_independent() {
        let a = RequestIdGenerator::new();
        let b = RequestIdGenerator::new();
        a.next_id();
        a.next_id();
        assert_eq!(b.next_id(), 1);
    }

    #[test]
    fn test_concurrent_ids_are_distinct() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 500;

        let ids = Arc::new(RequestIdGenerator::new());
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || (0..PER_THREAD).map(|_| ids.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }

        let total = (THREADS * PER_THREAD) as u64;
        assert_eq!(seen.len() as u64, total);
        assert_eq!(seen.iter().copied().max(), Some(total));
        assert_eq!(seen.iter().copied().min(), Some(1));
    }
}
