//! Cross-Core Message Types
//!
//! Every value here moves between cores by ownership transfer: a
//! [`CoreRequest`] is moved into the owning core's queue, executed, and
//! answered with a [`Completion`] moved back to the requester over the
//! reply sender embedded in the request. Completion payloads are a closed
//! union ([`OpOutcome`]) so response building matches every kind
//! exhaustively instead of checking runtime tags.

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::stats::StatsSnapshot;
use crate::storage::StoredValue;

/// One unit of storage-engine work, addressed to a key's owning core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOp {
    Get { key: Bytes },
    Set { key: Bytes, value: StoredValue },
    Add { key: Bytes, value: StoredValue },
    Replace { key: Bytes, value: StoredValue },
    Delete { key: Bytes },
    /// Signed delta, already negated for `decr`.
    Counter { key: Bytes, delta: i64 },
}

/// The typed result of one completed sub-operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpOutcome {
    /// Retrieval hit: the key echoed back with its stored value.
    Value { key: Bytes, value: StoredValue },
    /// Retrieval miss, rendered as silence within a `get` reply.
    Miss,
    /// Write accepted.
    Stored,
    /// Write refused (`add` on an existing key, `replace` on a missing one).
    NotStored,
    /// Delete removed the key.
    Deleted,
    /// Delete or counter target missing (or not a number, for counters).
    NotFound,
    /// New counter value after incr/decr.
    Counter(i64),
    /// One core's performance counters, for the stats fan-in.
    Snapshot(StatsSnapshot),
}

/// A completed sub-operation routed back to the originating request.
///
/// `slot` is the dispatch-order index inside the request tracker, so
/// results can be stored in request order even when they arrive out of
/// order.
#[derive(Debug)]
pub struct Completion {
    pub slot: usize,
    pub outcome: OpOutcome,
}

/// A message on a core's inbound queue.
///
/// The embedded `reply` sender is the only route back to the requester;
/// if the requester is gone the send fails and the result is dropped,
/// since nobody is waiting.
#[derive(Debug)]
pub enum CoreRequest {
    /// Execute one storage operation.
    Op {
        op: StorageOp,
        slot: usize,
        reply: mpsc::Sender<Completion>,
    },
    /// Snapshot this core's performance counters.
    Snapshot {
        slot: usize,
        reply: mpsc::Sender<Completion>,
    },
}
