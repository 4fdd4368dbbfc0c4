//! Response Builder
//!
//! Renders a completed request tracker into protocol-correct reply bytes,
//! consuming the tracker in the process; retirement happens exactly once,
//! here. A silent (`noreply`) request takes the same path and renders zero
//! bytes.

use bytes::Bytes;

use crate::core::message::OpOutcome;
use crate::request::tracker::{RequestKind, RequestTracker};
use crate::stats::StatsSnapshot;

/// Upper bound on a non-retrieval reply fragment (status line or counter
/// value). Retrieval and stats output is unbounded and assembled
/// line-by-line.
pub const MAX_INLINE_REPLY: usize = 128;

/// Renders the reply for a completed request, retiring the tracker.
pub fn render(tracker: RequestTracker) -> Bytes {
    debug_assert!(tracker.is_complete());
    let (kind, noreply, slots) = tracker.into_parts();

    let out = match kind {
        RequestKind::Retrieval => render_retrieval(slots),
        RequestKind::Write => {
            if noreply {
                Vec::new()
            } else {
                match single(slots) {
                    OpOutcome::Stored => b"STORED\r\n".to_vec(),
                    _ => b"NOT_STORED\r\n".to_vec(),
                }
            }
        }
        RequestKind::Counter => {
            if noreply {
                Vec::new()
            } else {
                match single(slots) {
                    OpOutcome::Counter(value) => format!("{}\r\n", value).into_bytes(),
                    _ => b"NOT_FOUND\r\n".to_vec(),
                }
            }
        }
        RequestKind::Delete => {
            if noreply {
                Vec::new()
            } else {
                match single(slots) {
                    OpOutcome::Deleted => b"DELETED\r\n".to_vec(),
                    _ => b"NOT_FOUND\r\n".to_vec(),
                }
            }
        }
        RequestKind::Stats => render_stats(slots),
    };

    debug_assert!(
        matches!(kind, RequestKind::Retrieval | RequestKind::Stats) || out.len() <= MAX_INLINE_REPLY
    );
    Bytes::from(out)
}

/// One `VALUE` block per found key, in dispatch order, then `END`.
///
/// Flags are not propagated from storage and always render as `0`.
fn render_retrieval(slots: Vec<Option<OpOutcome>>) -> Vec<u8> {
    let mut out = Vec::new();
    for outcome in slots.into_iter().flatten() {
        match outcome {
            OpOutcome::Value { key, value } => {
                out.extend_from_slice(b"VALUE ");
                out.extend_from_slice(&key);
                out.extend_from_slice(format!(" 0 {}\r\n", value.data.len()).as_bytes());
                out.extend_from_slice(&value.data);
                out.extend_from_slice(b"\r\n");
            }
            // Missing keys are silently omitted.
            OpOutcome::Miss => {}
            other => debug_unexpected(&other),
        }
    }
    out.extend_from_slice(b"END\r\n");
    out
}

/// Merges all per-core snapshots, then renders `STAT` lines.
fn render_stats(slots: Vec<Option<OpOutcome>>) -> Vec<u8> {
    let mut aggregate = StatsSnapshot::new();
    for outcome in slots.into_iter().flatten() {
        match outcome {
            OpOutcome::Snapshot(snapshot) => aggregate.merge(snapshot),
            other => debug_unexpected(&other),
        }
    }
    let mut out = Vec::new();
    aggregate.render_into(&mut out);
    out
}

/// The one result of a single-op request.
fn single(slots: Vec<Option<OpOutcome>>) -> OpOutcome {
    slots
        .into_iter()
        .flatten()
        .next()
        .unwrap_or(OpOutcome::NotFound)
}

/// A completion kind that cannot occur for this tracker kind by
/// construction of the dispatcher.
fn debug_unexpected(outcome: &OpOutcome) {
    debug_assert!(false, "mismatched completion kind: {:?}", outcome);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Completion;
    use crate::stats::CoreCounters;
    use crate::storage::StoredValue;

    fn tracker_with(kind: RequestKind, noreply: bool, outcomes: Vec<OpOutcome>) -> RequestTracker {
        let mut tracker = RequestTracker::new(kind, noreply, outcomes.len());
        for (slot, outcome) in outcomes.into_iter().enumerate() {
            tracker.record(Completion { slot, outcome });
        }
        tracker
    }

    fn value(key: &'static [u8], data: &'static [u8]) -> OpOutcome {
        OpOutcome::Value {
            key: Bytes::from_static(key),
            value: StoredValue::new(Bytes::from_static(data), 99, 0),
        }
    }

    #[test]
    fn test_retrieval_hits_and_misses() {
        let tracker = tracker_with(
            RequestKind::Retrieval,
            false,
            vec![value(b"a", b"xy"), OpOutcome::Miss, value(b"c", b"z")],
        );
        assert_eq!(
            &render(tracker)[..],
            b"VALUE a 0 2\r\nxy\r\nVALUE c 0 1\r\nz\r\nEND\r\n"
        );
    }

    #[test]
    fn test_retrieval_flags_always_render_zero() {
        // StoredValue carries flags 99, the reply still says 0
        let tracker = tracker_with(RequestKind::Retrieval, false, vec![value(b"k", b"v")]);
        assert_eq!(&render(tracker)[..], b"VALUE k 0 1\r\nv\r\nEND\r\n");
    }

    #[test]
    fn test_empty_retrieval_is_just_end() {
        let tracker = tracker_with(RequestKind::Retrieval, false, vec![OpOutcome::Miss]);
        assert_eq!(&render(tracker)[..], b"END\r\n");
    }

    #[test]
    fn test_write_replies() {
        let tracker = tracker_with(RequestKind::Write, false, vec![OpOutcome::Stored]);
        assert_eq!(&render(tracker)[..], b"STORED\r\n");

        let tracker = tracker_with(RequestKind::Write, false, vec![OpOutcome::NotStored]);
        assert_eq!(&render(tracker)[..], b"NOT_STORED\r\n");
    }

    #[test]
    fn test_counter_replies() {
        let tracker = tracker_with(RequestKind::Counter, false, vec![OpOutcome::Counter(-7)]);
        assert_eq!(&render(tracker)[..], b"-7\r\n");

        let tracker = tracker_with(RequestKind::Counter, false, vec![OpOutcome::NotFound]);
        assert_eq!(&render(tracker)[..], b"NOT_FOUND\r\n");
    }

    #[test]
    fn test_delete_replies() {
        let tracker = tracker_with(RequestKind::Delete, false, vec![OpOutcome::Deleted]);
        assert_eq!(&render(tracker)[..], b"DELETED\r\n");

        let tracker = tracker_with(RequestKind::Delete, false, vec![OpOutcome::NotFound]);
        assert_eq!(&render(tracker)[..], b"NOT_FOUND\r\n");
    }

    #[test]
    fn test_noreply_silences_write_counter_delete() {
        for (kind, outcome) in [
            (RequestKind::Write, OpOutcome::Stored),
            (RequestKind::Counter, OpOutcome::Counter(1)),
            (RequestKind::Delete, OpOutcome::Deleted),
        ] {
            let tracker = tracker_with(kind, true, vec![outcome]);
            assert!(render(tracker).is_empty());
        }
    }

    #[test]
    fn test_stats_merge_across_cores() {
        let mut a = CoreCounters::new();
        a.cmd_get = 2;
        let mut b = CoreCounters::new();
        b.cmd_get = 3;

        let tracker = tracker_with(
            RequestKind::Stats,
            false,
            vec![
                OpOutcome::Snapshot(a.snapshot(1)),
                OpOutcome::Snapshot(b.snapshot(4)),
            ],
        );
        let reply = render(tracker);
        let text = std::str::from_utf8(&reply).unwrap();
        assert!(text.contains("STAT cmd_get 5\r\n"));
        assert!(text.contains("STAT curr_items 5\r\n"));
    }
}
