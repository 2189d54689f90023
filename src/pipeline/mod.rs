//! Wires the Listener, Parser and Aggregator stages together behind
//! bounded channels (spec §5). The UDP socket reader and process/signal
//! glue around these threads are out of scope (spec §1); this module
//! owns only the three in-scope stage bodies and the join handles to
//! stop them.

pub mod aggregator_loop;
pub mod channel;
pub mod listener;
pub mod parser_task;

use std::net::UdpSocket;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam::channel::bounded;

use crate::config::Config;
use crate::error::AgentResult;
use crate::registry::Registry;
use crate::stats::Stats;
use crate::wire::{LineParser, StateMachineParser, TableParser};

pub use aggregator_loop::DebugDumpFlag;
pub use channel::{ParsedMessage, RawMessage, SHUTDOWN_SENTINEL};

/// Join handles and control flags for a running pipeline, returned by
/// [`spawn`]. Dropping this does not stop the pipeline; send the
/// shutdown sentinel or call [`PipelineHandles::join`].
pub struct PipelineHandles {
    listener: JoinHandle<AgentResult<()>>,
    parser: JoinHandle<()>,
    aggregator: JoinHandle<()>,
    /// Flag a signal handler would set to request a debug dump.
    pub debug_dump_requested: DebugDumpFlag,
}

impl PipelineHandles {
    /// Blocks until all three stages have exited (normally after the
    /// shutdown sentinel propagates through every channel).
    ///
    /// # Errors
    /// Returns the listener's [`crate::error::AgentError`] if its thread
    /// exited with one.
    pub fn join(self) -> AgentResult<()> {
        let listener_result = self.listener.join().unwrap_or(Ok(()));
        let _ = self.parser.join();
        let _ = self.aggregator.join();
        listener_result
    }
}

fn build_parser(config: &Config) -> Box<dyn LineParser + Send + Sync> {
    match config.parser_kind {
        crate::config::ParserKind::StateMachine => Box::new(StateMachineParser::new()),
        crate::config::ParserKind::Table => Box::new(TableParser::new()),
    }
}

/// Binds the UDP listener socket and spawns the Listener, Parser and
/// Aggregator threads, returning their handles.
///
/// # Errors
/// Returns an [`crate::error::AgentError`] if the UDP socket cannot be
/// bound.
pub fn spawn(
    config: &Config,
    registry: Arc<Registry>,
    stats: Arc<Stats>,
) -> AgentResult<PipelineHandles> {
    let socket = UdpSocket::bind(("0.0.0.0", config.port))?;
    let (raw_tx, raw_rx) = bounded(config.max_unprocessed_packets);
    let (parsed_tx, parsed_rx) = bounded(config.max_unprocessed_packets);

    let max_udp_packet_size = config.max_udp_packet_size;
    let listener = std::thread::spawn(move || listener::run(&socket, &raw_tx, max_udp_packet_size));

    let parser = build_parser(config);
    let parser_handle = std::thread::spawn(move || parser_task::run(&raw_rx, &parsed_tx, parser.as_ref()));

    let verbose = config.verbose;
    let debug_dump_path = PathBuf::from(&config.debug_output_filename);
    let debug_dump_requested: DebugDumpFlag = Arc::new(AtomicBool::new(false));
    let debug_dump_requested_for_loop = debug_dump_requested.clone();
    let aggregator_handle = std::thread::spawn(move || {
        aggregator_loop::run(
            &parsed_rx,
            &registry,
            &stats,
            verbose,
            &debug_dump_path,
            &debug_dump_requested_for_loop,
        );
    });

    Ok(PipelineHandles {
        listener,
        parser: parser_handle,
        aggregator: aggregator_handle,
        debug_dump_requested,
    })
}
