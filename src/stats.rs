//! Agent-wide self-metrics (spec §4.6): counters about the agent itself,
//! independent from the [`crate::registry::Registry`] lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Monotonic counters and tracked-metric gauges describing the agent's own
/// throughput. Protected by a dedicated lock, separate from the registry's,
/// so Query reads of Stats never contend with metric ingestion.
#[derive(Debug, Default)]
pub struct Stats {
    received: AtomicU64,
    parsed: AtomicU64,
    aggregated: AtomicU64,
    dropped: AtomicU64,
    time_spent_parsing_ns: AtomicU64,
    time_spent_aggregating_ns: AtomicU64,
    tracked: Mutex<TrackedCounts>,
}

/// The three per-kind "how many metrics of this kind exist" gauges.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrackedCounts {
    /// Number of committed Counter metrics.
    pub counters: u64,
    /// Number of committed Gauge metrics.
    pub gauges: u64,
    /// Number of committed Duration metrics.
    pub durations: u64,
}

impl TrackedCounts {
    /// Total across all three kinds.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.counters + self.gauges + self.durations
    }
}

/// A read-only snapshot of every Stats field, for the debug dump and for
/// the seven self-metric fetches (spec §6).
#[derive(Debug, Clone, Copy)]
pub struct StatsSnapshot {
    /// Datagrams/lines seen by the aggregator loop.
    pub received: u64,
    /// Lines that parsed successfully.
    pub parsed: u64,
    /// Samples successfully committed to the registry.
    pub aggregated: u64,
    /// Lines rejected at any stage (parse or registry).
    pub dropped: u64,
    /// Cumulative wall-time spent parsing, in nanoseconds.
    pub time_spent_parsing_ns: u64,
    /// Cumulative wall-time spent in `Registry::submit`, in nanoseconds.
    pub time_spent_aggregating_ns: u64,
    /// Per-kind tracked-metric counts.
    pub tracked: TrackedCounts,
}

impl Stats {
    /// Creates a fresh, all-zero Stats.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments `received` by one (spec §4.3 step 1).
    pub fn incr_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments `parsed` by one.
    pub fn incr_parsed(&self) {
        self.parsed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments `aggregated` by one.
    pub fn incr_aggregated(&self) {
        self.aggregated.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments `dropped` by one.
    pub fn incr_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds `ns` to the cumulative parsing-time counter.
    pub fn add_parsing_ns(&self, ns: u64) {
        self.time_spent_parsing_ns.fetch_add(ns, Ordering::Relaxed);
    }

    /// Adds `ns` to the cumulative aggregating-time counter.
    pub fn add_aggregating_ns(&self, ns: u64) {
        self.time_spent_aggregating_ns
            .fetch_add(ns, Ordering::Relaxed);
    }

    /// Replaces the tracked-metric gauges (spec §4.6 `reset(tracked)`).
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned by a prior panicking
    /// holder, which this crate's `deny(clippy::panic)` lint otherwise
    /// forbids introducing elsewhere.
    pub fn reset_tracked(&self, tracked: TrackedCounts) {
        #[allow(clippy::unwrap_used)]
        let mut guard = self.tracked.lock().unwrap();
        *guard = tracked;
    }

    /// Takes a consistent snapshot of every field.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        #[allow(clippy::unwrap_used)]
        let tracked = *self.tracked.lock().unwrap();
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            parsed: self.parsed.load(Ordering::Relaxed),
            aggregated: self.aggregated.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            time_spent_parsing_ns: self.time_spent_parsing_ns.load(Ordering::Relaxed),
            time_spent_aggregating_ns: self.time_spent_aggregating_ns.load(Ordering::Relaxed),
            tracked,
        }
    }

    /// Renders the snapshot as the "aggregated stats" block appended to a
    /// debug dump (spec §6).
    #[must_use]
    pub fn render_debug_block(&self) -> String {
        let s = self.snapshot();
        format!(
            "received={}\nparsed={}\naggregated={}\ndropped={}\ntime_spent_parsing_ns={}\ntime_spent_aggregating_ns={}\nmetrics_tracked.counter={}\nmetrics_tracked.gauge={}\nmetrics_tracked.duration={}\nmetrics_tracked.total={}\n",
            s.received,
            s.parsed,
            s.aggregated,
            s.dropped,
            s.time_spent_parsing_ns,
            s.time_spent_aggregating_ns,
            s.tracked.counters,
            s.tracked.gauges,
            s.tracked.durations,
            s.tracked.total(),
        )
    }
}
