//! Knock-port listeners.
//!
//! One accept loop per monitored port. A knock carries no payload: the
//! connection is accepted, the peer address is taken, and the stream is
//! dropped on the spot. The observed (address, port) pair then feeds the
//! sequencer.

use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::PortRange;
use crate::knock::sequencer::KnockSequencer;
use crate::net;

/// Bind every port in `range` on `bind_host` and spawn an accept loop for
/// each successful bind. Returns how many listeners came up.
///
/// A port that fails to bind is skipped with a warning and the rest of the
/// range still comes up; the caller decides whether zero is acceptable. The
/// spawned loops run for the process lifetime.
pub async fn spawn_knock_listeners(
    bind_host: &str,
    range: PortRange,
    sequencer: Arc<KnockSequencer>,
) -> usize {
    let mut bound = 0;
    for port in range.iter() {
        match net::bind(bind_host, port).await {
            Ok(listener) => {
                bound += 1;
                let sequencer = Arc::clone(&sequencer);
                tokio::spawn(accept_knocks(listener, port, sequencer));
            }
            Err(e) => {
                tracing::warn!(port, error = %e, "Knock port unavailable, skipping");
            }
        }
    }
    tracing::info!(
        bound,
        range_start = range.start,
        range_end = range.end,
        "Monitoring ports for knock sequences"
    );
    bound
}

/// Accept loop for a single knock port.
async fn accept_knocks(listener: TcpListener, port: u16, sequencer: Arc<KnockSequencer>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                // The connection attempt is the whole signal; close before
                // the client can send a byte.
                drop(stream);
                sequencer.handle_knock(peer.ip(), port);
            }
            Err(e) => {
                tracing::warn!(port, error = %e, "Error accepting knock connection");
            }
        }
    }
}
