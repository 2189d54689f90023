//! Agent-wide settings, shared by the listener, parser, aggregator and query
//! surface.
//!
//! Loading these from a config file or CLI arguments is out of scope for
//! this crate (see spec §1); `Config` is the plain settings struct every
//! in-scope component reads from, in the same shape the original agent's
//! config reader would have produced.

/// Selects which [`crate::wire::LineParser`] implementation the parser
/// stage uses. Both implementations accept the same language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
    /// Hand-written character-by-character state machine.
    StateMachine,
    /// Table-driven recognizer built from a precomputed transition table.
    Table,
}

/// Selects the duration value engine used by every `Duration`-kind metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationAggregationKind {
    /// Unordered multiset of doubles, sorted lazily on read.
    Exact,
    /// HDR histogram covering 1 microsecond to 3600 seconds at 3 significant digits.
    Hdr,
}

/// Agent-wide configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum UDP datagram size accepted by the listener. A datagram that
    /// fills this buffer exactly is discarded as possibly truncated.
    pub max_udp_packet_size: u16,
    /// Depth of the bounded raw-bytes channel between listener and parser.
    pub max_unprocessed_packets: usize,
    /// Verbosity level (0..2). At 2, every dropped line is logged; below
    /// that, logging quiets after 1000 drops.
    pub verbose: u8,
    /// Path component for the debug dump file (joined with `$PCP_LOG_DIR`
    /// by whatever external process owns log placement).
    pub debug_output_filename: String,
    /// UDP port the listener binds.
    pub port: u16,
    /// Parser implementation to use.
    pub parser_kind: ParserKind,
    /// Duration value engine to use.
    pub duration_aggregation: DurationAggregationKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_udp_packet_size: 1472,
            max_unprocessed_packets: 2048,
            verbose: 0,
            debug_output_filename: "statsd_agent".to_string(),
            port: 8125,
            parser_kind: ParserKind::StateMachine,
            duration_aggregation: DurationAggregationKind::Exact,
        }
    }
}
