//! Storage Op Dispatcher
//!
//! Translates one parsed [`Command`] into its storage sub-operations,
//! addresses each by the key's owning core, and fans the completions back
//! in. Sends are fire-and-forget: the dispatching task never waits for
//! execution, only for queue capacity. Completions arrive on a per-request
//! channel in whatever order cores answer; the tracker files them by
//! dispatch-order slot.

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::warn;

use crate::core::message::{Completion, CoreRequest, StorageOp};
use crate::core::router::CoreRouter;
use crate::protocol::command::{Command, CounterKind, WriteKind};
use crate::request::response::render;
use crate::request::tracker::{RequestKind, RequestTracker};
use crate::storage::StoredValue;

/// Runs one command end to end: dispatch, fan-in, render.
///
/// Returns the reply bytes (empty for a silent request), or `None` if a
/// sub-operation can never complete because its core is gone. In that
/// case the request is abandoned without a reply.
pub async fn execute_command(cmd: Command, router: &CoreRouter) -> Option<Bytes> {
    let (mut tracker, mut completions) = dispatch(cmd, router).await;

    // Fan-in: nothing reaches the client until the whole logical request
    // is complete.
    while !tracker.is_complete() {
        match completions.recv().await {
            Some(completion) => tracker.record(completion),
            None => {
                warn!(
                    started = tracker.started(),
                    completed = tracker.completed(),
                    "request abandoned: owning core unreachable"
                );
                return None;
            }
        }
    }

    Some(render(tracker))
}

/// Builds and transmits the sub-operations for one command.
///
/// Returns the tracker (sized to the number of ops sent) and the receiver
/// its completions arrive on.
async fn dispatch(
    cmd: Command,
    router: &CoreRouter,
) -> (RequestTracker, mpsc::Receiver<Completion>) {
    match cmd {
        Command::Get { keys } => {
            let (reply, completions) = mpsc::channel(keys.len().max(1));
            let tracker = RequestTracker::new(RequestKind::Retrieval, false, keys.len());
            for (slot, key) in keys.into_iter().enumerate() {
                let core = router.owner_of(&key);
                router
                    .send_to(
                        core,
                        CoreRequest::Op {
                            op: StorageOp::Get { key },
                            slot,
                            reply: reply.clone(),
                        },
                    )
                    .await;
            }
            (tracker, completions)
        }

        Command::Store {
            kind,
            key,
            flags,
            exptime,
            data,
            noreply,
        } => {
            let value = StoredValue::new(data, flags, exptime);
            let op = match kind {
                WriteKind::Set => StorageOp::Set { key, value },
                WriteKind::Add => StorageOp::Add { key, value },
                WriteKind::Replace => StorageOp::Replace { key, value },
            };
            send_single(RequestKind::Write, noreply, op, router).await
        }

        Command::Delete { key, noreply } => {
            send_single(
                RequestKind::Delete,
                noreply,
                StorageOp::Delete { key },
                router,
            )
            .await
        }

        Command::Counter {
            kind,
            key,
            delta,
            noreply,
        } => {
            let delta = match kind {
                CounterKind::Incr => delta,
                CounterKind::Decr => delta.wrapping_neg(),
            };
            send_single(
                RequestKind::Counter,
                noreply,
                StorageOp::Counter { key, delta },
                router,
            )
            .await
        }

        Command::Stats => {
            // Broadcast one snapshot request per active core, the
            // requester's core included.
            let cores = router.core_count();
            let (reply, completions) = mpsc::channel(cores);
            let tracker = RequestTracker::new(RequestKind::Stats, false, cores);
            for slot in 0..cores {
                router
                    .send_to(
                        slot,
                        CoreRequest::Snapshot {
                            slot,
                            reply: reply.clone(),
                        },
                    )
                    .await;
            }
            (tracker, completions)
        }
    }
}

/// Dispatches a single-op request to the key's owning core.
async fn send_single(
    kind: RequestKind,
    noreply: bool,
    op: StorageOp,
    router: &CoreRouter,
) -> (RequestTracker, mpsc::Receiver<Completion>) {
    let (reply, completions) = mpsc::channel(1);
    let tracker = RequestTracker::new(kind, noreply, 1);

    let key = match &op {
        StorageOp::Get { key }
        | StorageOp::Set { key, .. }
        | StorageOp::Add { key, .. }
        | StorageOp::Replace { key, .. }
        | StorageOp::Delete { key }
        | StorageOp::Counter { key, .. } => key,
    };
    let core = router.owner_of(key);

    router
        .send_to(core, CoreRequest::Op { op, slot: 0, reply })
        .await;

    (tracker, completions)
}
