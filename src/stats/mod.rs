//! Per-Core Performance Counters
//!
//! Every core worker keeps a private [`CoreCounters`] it bumps as it
//! executes operations: plain `u64` fields without atomics, because the
//! counters are only ever touched by their owning task. A `stats` command
//! broadcasts one snapshot request per core and merges the snapshots by
//! summation, which is commutative and associative, so arrival order never
//! changes the result.

use std::collections::BTreeMap;

/// Counters maintained by one core worker.
#[derive(Debug, Default, Clone)]
pub struct CoreCounters {
    /// Total retrieval sub-operations executed.
    pub cmd_get: u64,
    /// Total write sub-operations executed (set/add/replace).
    pub cmd_set: u64,
    /// Total delete sub-operations executed.
    pub cmd_delete: u64,
    /// Total counter sub-operations executed (incr/decr).
    pub cmd_counter: u64,
    /// Retrievals that found a value.
    pub get_hits: u64,
    /// Retrievals that missed.
    pub get_misses: u64,
    /// Deletes that removed a value.
    pub delete_hits: u64,
    /// Deletes that missed.
    pub delete_misses: u64,
}

impl CoreCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures this core's counters as an owned snapshot.
    ///
    /// `curr_items` is sampled from the core's store at snapshot time.
    pub fn snapshot(&self, curr_items: u64) -> StatsSnapshot {
        let mut counters = BTreeMap::new();
        counters.insert("cmd_get", self.cmd_get);
        counters.insert("cmd_set", self.cmd_set);
        counters.insert("cmd_delete", self.cmd_delete);
        counters.insert("cmd_counter", self.cmd_counter);
        counters.insert("get_hits", self.get_hits);
        counters.insert("get_misses", self.get_misses);
        counters.insert("delete_hits", self.delete_hits);
        counters.insert("delete_misses", self.delete_misses);
        counters.insert("curr_items", curr_items);
        StatsSnapshot { counters }
    }
}

/// One core's counter values at a point in time.
///
/// Snapshots cross core boundaries by value and are combined with
/// [`StatsSnapshot::merge`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    counters: BTreeMap<&'static str, u64>,
}

impl StatsSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds another core's snapshot into this one by per-name summation.
    pub fn merge(&mut self, other: StatsSnapshot) {
        for (name, value) in other.counters {
            *self.counters.entry(name).or_insert(0) += value;
        }
    }

    /// Looks up a single counter by name.
    pub fn get(&self, name: &str) -> Option<u64> {
        self.counters.get(name).copied()
    }

    /// Renders the aggregate as `STAT <name> <value>\r\n` lines.
    ///
    /// Stats output has no explicit terminator line, unlike retrieval.
    pub fn render_into(&self, out: &mut Vec<u8>) {
        for (name, value) in &self.counters {
            out.extend_from_slice(b"STAT ");
            out.extend_from_slice(name.as_bytes());
            out.push(b' ');
            out.extend_from_slice(value.to_string().as_bytes());
            out.extend_from_slice(b"\r\n");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_captures_counters() {
        let mut counters = CoreCounters::new();
        counters.cmd_get = 3;
        counters.get_hits = 2;
        counters.get_misses = 1;

        let snap = counters.snapshot(7);
        assert_eq!(snap.get("cmd_get"), Some(3));
        assert_eq!(snap.get("get_hits"), Some(2));
        assert_eq!(snap.get("curr_items"), Some(7));
    }

    #[test]
    fn test_merge_sums_per_name() {
        let mut a = CoreCounters::new();
        a.cmd_set = 10;
        let mut b = CoreCounters::new();
        b.cmd_set = 5;
        b.cmd_get = 1;

        let mut merged = a.snapshot(2);
        merged.merge(b.snapshot(3));

        assert_eq!(merged.get("cmd_set"), Some(15));
        assert_eq!(merged.get("cmd_get"), Some(1));
        assert_eq!(merged.get("curr_items"), Some(5));
    }

    #[test]
    fn test_merge_is_order_independent() {
        let mut a = CoreCounters::new();
        a.cmd_get = 4;
        let mut b = CoreCounters::new();
        b.cmd_get = 9;

        let mut ab = a.snapshot(0);
        ab.merge(b.snapshot(0));
        let mut ba = b.snapshot(0);
        ba.merge(a.snapshot(0));

        assert_eq!(ab, ba);
    }

    #[test]
    fn test_render_stat_lines() {
        let counters = CoreCounters::new();
        let snap = counters.snapshot(0);

        let mut out = Vec::new();
        snap.render_into(&mut out);
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("STAT "));
        assert!(text.contains("STAT cmd_get 0\r\n"));
        assert!(text.ends_with("\r\n"));
        // No END terminator on the stats path
        assert!(!text.contains("END"));
    }
}
