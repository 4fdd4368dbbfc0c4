//! Core Router
//!
//! The explicit execution context handed to the dispatcher and the stats
//! path. It knows how many cores exist and which core owns a given key;
//! nothing in the system queries ambient process state for either.

use std::hash::{DefaultHasher, Hash, Hasher};
use tokio::sync::mpsc;
use tracing::warn;

use crate::core::message::CoreRequest;

/// Routes messages to per-core inbound queues.
///
/// Cheap to clone: one clone per connection task.
#[derive(Debug, Clone)]
pub struct CoreRouter {
    inboxes: Vec<mpsc::Sender<CoreRequest>>,
}

impl CoreRouter {
    /// Builds a router over the given per-core senders.
    pub fn new(inboxes: Vec<mpsc::Sender<CoreRequest>>) -> Self {
        debug_assert!(!inboxes.is_empty());
        Self { inboxes }
    }

    /// Number of active cores.
    pub fn core_count(&self) -> usize {
        self.inboxes.len()
    }

    /// The core responsible for the key range containing `key`.
    pub fn owner_of(&self, key: &[u8]) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.inboxes.len()
    }

    /// Sends a request to a core's inbound queue.
    ///
    /// Fire-and-forget from the sender's point of view: the call only
    /// waits for queue capacity, never for execution. Returns `false` if
    /// that core's queue is closed, in which case its completion will
    /// never arrive.
    pub async fn send_to(&self, core: usize, request: CoreRequest) -> bool {
        match self.inboxes[core].send(request).await {
            Ok(()) => true,
            Err(_) => {
                warn!(core, "core inbox closed, dropping request");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router(n: usize) -> CoreRouter {
        let inboxes = (0..n).map(|_| mpsc::channel(4).0).collect();
        CoreRouter::new(inboxes)
    }

    #[test]
    fn test_owner_is_stable_and_in_range() {
        let r = router(4);
        let first = r.owner_of(b"some-key");
        assert!(first < 4);
        assert_eq!(r.owner_of(b"some-key"), first);
    }

    #[test]
    fn test_single_core_owns_everything() {
        let r = router(1);
        assert_eq!(r.owner_of(b"a"), 0);
        assert_eq!(r.owner_of(b"b"), 0);
        assert_eq!(r.core_count(), 1);
    }

    #[test]
    fn test_keys_spread_across_cores() {
        let r = router(8);
        let mut seen = std::collections::HashSet::new();
        for i in 0..256 {
            seen.insert(r.owner_of(format!("key:{}", i).as_bytes()));
        }
        // With 256 keys over 8 cores every core should see traffic
        assert_eq!(seen.len(), 8);
    }
}
