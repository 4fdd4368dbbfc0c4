//! Per-Core Worker Loop
//!
//! Each worker owns a [`Store`] and a [`CoreCounters`] outright and drains
//! its inbound queue one message at a time. Execution is synchronous
//! within the worker; asynchrony exists only between cores. A worker never
//! blocks on another worker.

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::core::message::{Completion, CoreRequest, OpOutcome, StorageOp};
use crate::core::router::CoreRouter;
use crate::stats::CoreCounters;
use crate::storage::Store;

/// Bound on each core's inbound queue; senders wait for capacity beyond
/// this, which is the only backpressure between cores.
pub const INBOX_DEPTH: usize = 1024;

/// Spawns `count` core workers and returns the router addressing them.
pub fn spawn_cores(count: usize) -> CoreRouter {
    assert!(count > 0, "at least one core is required");

    let mut inboxes = Vec::with_capacity(count);
    for core_id in 0..count {
        let (tx, rx) = mpsc::channel(INBOX_DEPTH);
        inboxes.push(tx);
        tokio::spawn(run_core(core_id, rx));
    }
    CoreRouter::new(inboxes)
}

/// The single-threaded loop of one core.
///
/// Exits when every sender (the router and all its clones) is gone.
async fn run_core(core_id: usize, mut inbox: mpsc::Receiver<CoreRequest>) {
    let mut store = Store::new();
    let mut counters = CoreCounters::new();
    debug!(core = core_id, "core worker started");

    while let Some(request) = inbox.recv().await {
        match request {
            CoreRequest::Op { op, slot, reply } => {
                let outcome = execute(&mut store, &mut counters, op);
                trace!(core = core_id, slot, ?outcome, "op executed");
                // Requester may already be gone; nothing to do then.
                let _ = reply.send(Completion { slot, outcome }).await;
            }
            CoreRequest::Snapshot { slot, reply } => {
                let outcome = OpOutcome::Snapshot(counters.snapshot(store.len() as u64));
                let _ = reply.send(Completion { slot, outcome }).await;
            }
        }
    }

    debug!(core = core_id, "core worker stopped");
}

/// Runs one storage operation against this core's store.
fn execute(store: &mut Store, counters: &mut CoreCounters, op: StorageOp) -> OpOutcome {
    match op {
        StorageOp::Get { key } => {
            counters.cmd_get += 1;
            match store.get(&key) {
                Some(value) => {
                    counters.get_hits += 1;
                    OpOutcome::Value {
                        value: value.clone(),
                        key,
                    }
                }
                None => {
                    counters.get_misses += 1;
                    OpOutcome::Miss
                }
            }
        }
        StorageOp::Set { key, value } => {
            counters.cmd_set += 1;
            store.set(key, value);
            OpOutcome::Stored
        }
        StorageOp::Add { key, value } => {
            counters.cmd_set += 1;
            if store.add(key, value) {
                OpOutcome::Stored
            } else {
                OpOutcome::NotStored
            }
        }
        StorageOp::Replace { key, value } => {
            counters.cmd_set += 1;
            if store.replace(key, value) {
                OpOutcome::Stored
            } else {
                OpOutcome::NotStored
            }
        }
        StorageOp::Delete { key } => {
            counters.cmd_delete += 1;
            if store.delete(&key) {
                counters.delete_hits += 1;
                OpOutcome::Deleted
            } else {
                counters.delete_misses += 1;
                OpOutcome::NotFound
            }
        }
        StorageOp::Counter { key, delta } => {
            counters.cmd_counter += 1;
            match store.apply_delta(&key, delta) {
                Some(updated) => OpOutcome::Counter(updated),
                None => OpOutcome::NotFound,
            }
        }
    }
}
