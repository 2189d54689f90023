//! Messages passed between pipeline stages (spec §4.1, §4.2, §5).
//!
//! Each channel carries a dedicated shutdown variant rather than closing
//! the channel outright: spec §5 requires every stage to forward the
//! sentinel once before exiting, which needs a message both stages can
//! recognize and re-send.

use crate::wire::ParseOutcome;

/// Datagram payload handed from the Listener to the Parser.
#[derive(Debug)]
pub enum RawMessage {
    /// One UDP datagram's bytes, already copied into an owned buffer.
    Datagram(Vec<u8>),
    /// The `PMDASTATSD_EXIT` sentinel was received; forward and exit.
    Shutdown,
}

/// One line's parse result, handed from the Parser to the Aggregator.
#[derive(Debug)]
pub enum ParsedMessage {
    /// A line was attempted; `elapsed_ns` is wall-time spent parsing it.
    Outcome {
        /// The parse result.
        outcome: ParseOutcome,
        /// Nanoseconds spent producing `outcome`.
        elapsed_ns: u64,
    },
    /// Forwarded shutdown sentinel.
    Shutdown,
}

/// Exact payload that triggers clean shutdown (spec §6).
pub const SHUTDOWN_SENTINEL: &[u8] = b"PMDASTATSD_EXIT";
