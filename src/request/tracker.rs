//! Request Tracker
//!
//! Correlates the sub-operations of one logical client request. Created
//! when a command is dispatched, owned by the dispatching task, and
//! consumed (moved) exactly once by the response builder. It is never
//! aliased and never retired early.

use crate::core::message::{Completion, OpOutcome};

/// Which response-builder path runs once the tracker completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Multi-key `get`: VALUE lines in dispatch order, then `END`.
    Retrieval,
    /// set/add/replace: `STORED`/`NOT_STORED`.
    Write,
    /// incr/decr: new value or `NOT_FOUND`.
    Counter,
    /// delete: `DELETED`/`NOT_FOUND`.
    Delete,
    /// stats: merged snapshots as `STAT` lines.
    Stats,
}

/// Accounting for one in-flight request.
#[derive(Debug)]
pub struct RequestTracker {
    kind: RequestKind,
    noreply: bool,
    started: usize,
    completed: usize,
    /// Results indexed by dispatch order, not arrival order.
    slots: Vec<Option<OpOutcome>>,
}

impl RequestTracker {
    /// Creates a tracker expecting exactly `started` completions.
    pub fn new(kind: RequestKind, noreply: bool, started: usize) -> Self {
        Self {
            kind,
            noreply,
            started,
            completed: 0,
            slots: (0..started).map(|_| None).collect(),
        }
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    pub fn started(&self) -> usize {
        self.started
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Records one completion into its dispatch-order slot.
    ///
    /// Each slot is filled at most once; `completed` never exceeds
    /// `started`.
    pub fn record(&mut self, completion: Completion) {
        debug_assert!(completion.slot < self.slots.len());
        debug_assert!(self.slots[completion.slot].is_none());
        self.slots[completion.slot] = Some(completion.outcome);
        self.completed += 1;
    }

    /// True once every dispatched sub-operation has reported back.
    pub fn is_complete(&self) -> bool {
        self.completed == self.started
    }

    /// Consumes the tracker at retirement, yielding what the response
    /// builder needs.
    pub fn into_parts(self) -> (RequestKind, bool, Vec<Option<OpOutcome>>) {
        (self.kind, self.noreply, self.slots)
    }
}
