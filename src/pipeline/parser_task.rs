//! Parser task (spec §4.2): drains the raw-bytes channel, splits each
//! datagram into lines, and times each line's parse.

use std::time::Instant;

use crossbeam::channel::{Receiver, Sender};

use crate::wire::{LineParser, ParseOutcome};

use super::channel::{ParsedMessage, RawMessage};

/// Consumes `raw_rx` until shutdown, running `parser` over every
/// newline-delimited line of every datagram and forwarding
/// `(outcome, elapsed_ns)` to `parsed_tx`.
///
/// An empty trailing line (the datagram ends in `\n`) is tolerated and
/// produces no message (spec §6).
pub fn run(raw_rx: &Receiver<RawMessage>, parsed_tx: &Sender<ParsedMessage>, parser: &dyn LineParser) {
    for msg in raw_rx.iter() {
        match msg {
            RawMessage::Datagram(bytes) => {
                let text = String::from_utf8_lossy(&bytes);
                for line in text.split('\n') {
                    if line.is_empty() {
                        continue;
                    }
                    let start = Instant::now();
                    let outcome = match parser.parse_line(line) {
                        Ok(sample) => ParseOutcome::Parsed(sample),
                        Err(reason) => ParseOutcome::Dropped(reason),
                    };
                    let elapsed_ns = u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX);
                    if parsed_tx
                        .send(ParsedMessage::Outcome { outcome, elapsed_ns })
                        .is_err()
                    {
                        return;
                    }
                }
            }
            RawMessage::Shutdown => {
                let _ = parsed_tx.send(ParsedMessage::Shutdown);
                return;
            }
        }
    }
}
