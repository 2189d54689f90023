//! Aggregator loop (spec §4.3): the single consumer that drains parsed
//! samples, submits them to the Registry, and updates Stats. Also honors
//! debug-dump requests under the same registry lock (spec §4.3, §6).

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam::channel::Receiver;
use tracing::{info, warn};

use crate::registry::{Registry, SubmitReject};
use crate::stats::{Stats, TrackedCounts};
use crate::wire::{Kind, ParseOutcome, RejectReason as WireReject};

use super::channel::ParsedMessage;

/// Number of drops logged verbosely before the logger quiets down (spec
/// §7), unless `verbose == 2`.
const QUIET_THRESHOLD: u64 = 1000;

/// Why one line was dropped, unifying the wire-level and registry-level
/// taxonomies (spec §4.8) for a single log call site.
#[derive(Debug, Clone, Copy)]
enum DropReason {
    Unparseable,
    Blocked,
    BadValue,
    KindMismatch,
}

impl From<WireReject> for DropReason {
    fn from(value: WireReject) -> Self {
        match value {
            WireReject::Unparseable => Self::Unparseable,
        }
    }
}

impl From<SubmitReject> for DropReason {
    fn from(value: SubmitReject) -> Self {
        match value {
            SubmitReject::Blocked => Self::Blocked,
            SubmitReject::BadValue => Self::BadValue,
            SubmitReject::KindMismatch => Self::KindMismatch,
        }
    }
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unparseable => "Unparseable",
            Self::Blocked => "Blocked",
            Self::BadValue => "BadValue",
            Self::KindMismatch => "KindMismatch",
        };
        write!(f, "{s}")
    }
}

/// A process-wide flag a signal handler (out of scope for this crate)
/// would set to request a debug dump; polled once per loop iteration
/// (spec §5 "Suspension points").
pub type DebugDumpFlag = Arc<AtomicBool>;

/// Cooperative exit flag, set once the shutdown sentinel has been
/// observed by an earlier stage or an external caller wants to stop the
/// loop without waiting for a sentinel datagram (e.g. in tests).
pub type ExitFlag = Arc<AtomicBool>;

fn log_drop(verbose: u8, quiet_count: &AtomicU64, line_repr: &str, reason: DropReason) {
    let n = quiet_count.fetch_add(1, Ordering::Relaxed) + 1;
    if verbose >= 2 || n <= QUIET_THRESHOLD {
        warn!(reason = %reason, line = line_repr, "dropped line");
    } else if n == QUIET_THRESHOLD + 1 {
        warn!("quiet threshold reached, further drops will not be logged individually");
    }
}

fn tracked_counts(registry: &Registry) -> TrackedCounts {
    let mut counts = TrackedCounts::default();
    for (_, info) in registry.enumerate() {
        match info.kind {
            Kind::Counter => counts.counters += 1,
            Kind::Gauge => counts.gauges += 1,
            Kind::Duration => counts.durations += 1,
        }
    }
    counts
}

fn write_debug_dump(registry: &Registry, stats: &Stats, path: &Path) {
    let mut text = registry.render_debug_dump();
    text.push_str(&stats.render_debug_block());
    if let Err(e) = fs::write(path, text) {
        warn!(error = %e, path = %path.display(), "failed to write debug dump");
    } else {
        info!(path = %path.display(), "wrote debug dump");
    }
}

/// Runs the aggregator loop until the shutdown sentinel, updating
/// `registry` and `stats` for every message received on `parsed_rx`.
///
/// `verbose` and `debug_dump_path` come from [`crate::config::Config`].
/// `debug_dump_requested` is checked once per iteration; when set, the
/// registry and stats are dumped to `debug_dump_path` and the flag is
/// cleared, under the same registry lock per spec §4.3.
pub fn run(
    parsed_rx: &Receiver<ParsedMessage>,
    registry: &Registry,
    stats: &Stats,
    verbose: u8,
    debug_dump_path: &Path,
    debug_dump_requested: &DebugDumpFlag,
) {
    let quiet_count = AtomicU64::new(0);

    loop {
        if debug_dump_requested.swap(false, Ordering::Relaxed) {
            write_debug_dump(registry, stats, debug_dump_path);
        }

        let msg = match parsed_rx.recv() {
            Ok(msg) => msg,
            Err(_) => return, // channel closed without a sentinel; nothing more to do
        };

        match msg {
            ParsedMessage::Outcome { outcome, elapsed_ns } => {
                stats.incr_received();
                match outcome {
                    ParseOutcome::Parsed(sample) => {
                        stats.add_parsing_ns(elapsed_ns);
                        let start = Instant::now();
                        let result = registry.submit(&sample);
                        let aggregating_ns =
                            u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX);
                        stats.add_aggregating_ns(aggregating_ns);
                        match result {
                            Ok(()) => {
                                stats.incr_parsed();
                                stats.incr_aggregated();
                                stats.reset_tracked(tracked_counts(registry));
                            }
                            Err(reject) => {
                                stats.incr_dropped();
                                log_drop(verbose, &quiet_count, &sample.name, reject.into());
                            }
                        }
                    }
                    ParseOutcome::Dropped(reason) => {
                        stats.add_parsing_ns(elapsed_ns);
                        stats.incr_dropped();
                        log_drop(verbose, &quiet_count, "<unparseable>", reason.into());
                    }
                }
            }
            ParsedMessage::Shutdown => return,
        }
    }
}
