//! UDP listener task (spec §4.1). Only the message contract to the Parser
//! is in scope; socket setup lives here since this crate owns the
//! listener thread, but the surrounding process/signal glue does not.

use std::net::UdpSocket;

use crossbeam::channel::Sender;
use tracing::{debug, warn};

use crate::error::AgentResult;

use super::channel::{RawMessage, SHUTDOWN_SENTINEL};

/// Reads datagrams from `socket` and forwards them to `raw_tx` until the
/// shutdown sentinel arrives or the socket errors out.
///
/// A datagram that fills the receive buffer exactly is discarded as
/// possibly truncated (spec §4.1); everything else is copied into an
/// owned buffer and enqueued, blocking (not dropping) when the channel is
/// full.
///
/// # Errors
/// Returns an [`crate::error::AgentError::Io`] if `recv_from` fails for a
/// reason other than a transient interruption.
pub fn run(socket: &UdpSocket, raw_tx: &Sender<RawMessage>, max_udp_packet_size: u16) -> AgentResult<()> {
    let mut buf = vec![0_u8; max_udp_packet_size as usize];

    loop {
        let (len, _src) = match socket.recv_from(&mut buf) {
            Ok(v) => v,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };

        if len == buf.len() {
            warn!(len, "datagram filled receive buffer, discarding as possibly truncated");
            continue;
        }

        let payload = &buf[..len];
        if payload == SHUTDOWN_SENTINEL {
            debug!("listener received shutdown sentinel");
            // `send` may itself block if the channel is full; that's fine,
            // shutdown is not meant to jump the queue.
            if raw_tx.send(RawMessage::Shutdown).is_err() {
                return Ok(());
            }
            return Ok(());
        }

        if raw_tx.send(RawMessage::Datagram(payload.to_vec())).is_err() {
            // Receiver gone: downstream has already shut down.
            return Ok(());
        }
    }
}
