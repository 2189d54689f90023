//! Wire-format types shared by both parser implementations.
//!
//! <https://docs.datadoghq.com/developers/dogstatsd/datagram_shell/?tab=metrics>
//! (this agent speaks a close relative of that line protocol; see spec §4.2
//! for the exact grammar this crate accepts).

pub mod parser;
pub mod state_machine;
pub mod table;

use std::sync::Arc;

pub use parser::{LineParser, ParseOutcome, RejectReason};
pub use state_machine::StateMachineParser;
pub use table::TableParser;

/// Canonical tags strings longer than this are rejected (spec §4.2).
pub const MAX_CANONICAL_TAGS_BYTES: usize = 4096;

/// Reserved self-metric names that may never be created as user metrics.
pub const RESERVED_NAMES: &[&str] = &[
    "pmda.received",
    "pmda.parsed",
    "pmda.aggregated",
    "pmda.dropped",
    "pmda.metrics_tracked",
    "pmda.time_spent_aggregating",
    "pmda.time_spent_parsing",
];

/// Reserved prefix covering the settings self-metrics (`pmda.settings.*`).
pub const RESERVED_PREFIX: &str = "pmda.settings.";

/// True if `name` falls in the block-list (spec §3 invariant I4, §6).
#[must_use]
pub fn is_blocked(name: &str) -> bool {
    RESERVED_NAMES.contains(&name) || name.starts_with(RESERVED_PREFIX)
}

/// The three metric kinds. Immutable once a metric is created (invariant I3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Monotonically accumulating total.
    Counter,
    /// Point-in-time value, settable or adjustable.
    Gauge,
    /// Distribution of observed magnitudes.
    Duration,
}

/// Distinguishes an unsigned "set X" value from a signed "±Δ" adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    /// No leading `+`/`-`: an absolute value.
    None,
    /// Leading `+`.
    Plus,
    /// Leading `-`.
    Minus,
}

/// One parsed line, ready for aggregation. Discarded once submitted to the
/// registry.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Metric name.
    pub name: String,
    /// Metric kind.
    pub kind: Kind,
    /// The numeric magnitude, sign stripped (see `sign`).
    pub value: f64,
    /// Whether `value` was prefixed with `+`/`-`, or bare.
    pub sign: Sign,
    /// Canonical tags string (spec §4.2), or `None` if the line carried no
    /// tags at all.
    pub tags: Option<Arc<str>>,
}

/// A metric or tag name/key/value character: letter, digit, `.`, or `_`.
#[must_use]
pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '_'
}

/// First-character rule for metric names: must be a letter.
#[must_use]
pub fn is_name_start_char(c: char) -> bool {
    c.is_ascii_alphabetic()
}

/// Validates a metric name per spec §3: non-empty, starts with a letter,
/// remaining chars are letter/digit/`.`/`_`.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if is_name_start_char(c) => {}
        _ => return false,
    }
    chars.all(is_word_char)
}

/// Validates a tag key or value: letter/digit/`.`/`_` only, non-empty.
#[must_use]
pub fn is_valid_tag_component(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_word_char)
}

/// Builds the canonical tags string from an ordered list of `(key, value)`
/// pairs (spec §3 I5, §4.2): sort by key ascending, right-most value wins on
/// duplicate keys, render as `{"k1":"v1",...}`.
///
/// Returns `None` (not `Some("")`) if `pairs` is empty, matching "tags may
/// be absent" in the data model. Returns `Err(())` if the canonical form
/// would exceed [`MAX_CANONICAL_TAGS_BYTES`].
///
/// # Errors
/// Returns `Err(())` if the canonicalized form exceeds the byte cap.
pub fn canonicalize_tags(pairs: &[(String, String)]) -> Result<Option<Arc<str>>, ()> {
    if pairs.is_empty() {
        return Ok(None);
    }

    // Right-most duplicate wins: keep the last occurrence of each key.
    let mut by_key: Vec<(&str, &str)> = Vec::with_capacity(pairs.len());
    for (k, v) in pairs {
        if let Some(existing) = by_key.iter_mut().find(|(ek, _)| *ek == k.as_str()) {
            existing.1 = v.as_str();
        } else {
            by_key.push((k.as_str(), v.as_str()));
        }
    }
    by_key.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let mut out = String::from("{");
    for (i, (k, v)) in by_key.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push('"');
        out.push_str(k);
        out.push_str("\":\"");
        out.push_str(v);
        out.push('"');
        if out.len() > MAX_CANONICAL_TAGS_BYTES {
            return Err(());
        }
    }
    out.push('}');

    if out.len() > MAX_CANONICAL_TAGS_BYTES {
        return Err(());
    }

    Ok(Some(Arc::from(out)))
}
