//! The knock sequence state machine.
//!
//! # Transitions
//!
//! ```text
//! knock on the expected port  → progress + 1; completing the sequence
//!                                issues a grant and wraps progress to 0
//! knock on any other port     → progress 0 and the grant, if any, is
//!                                revoked
//! ```
//!
//! There is no timeout between knocks and no partial credit: a client that
//! trips mid-sequence redoes the whole walk. Expiry is lazy; nothing here
//! reaps lapsed grants, the gate simply stops admitting them.

use std::net::IpAddr;
use std::time::{Duration, Instant};

use crate::knock::state::ClientStateStore;
use crate::observability::metrics;

/// Decides how each observed knock moves a client through the sequence.
///
/// Handling is synchronous. All per-client bookkeeping happens inside one
/// atomic update of the shared table, so knock listeners on different ports
/// can feed the same sequencer without extra locking.
pub struct KnockSequencer {
    sequence: Vec<u16>,
    grant_duration: Duration,
    store: ClientStateStore,
}

impl KnockSequencer {
    /// Build a sequencer over `store`. `sequence` must be non-empty and
    /// duplicate-free, which config validation guarantees.
    pub fn new(sequence: Vec<u16>, grant_duration: Duration, store: ClientStateStore) -> Self {
        Self {
            sequence,
            grant_duration,
            store,
        }
    }

    /// The configured knock sequence, in order.
    pub fn sequence(&self) -> &[u16] {
        &self.sequence
    }

    /// Feed one observed knock into the state machine.
    pub fn handle_knock(&self, client: IpAddr, port: u16) {
        self.store.update(client, |state| {
            // progress stays below sequence.len() between updates, so the
            // index never goes out of bounds.
            let expected = self.sequence[state.progress];
            if port == expected {
                state.progress += 1;
                metrics::record_knock("advance");
                if state.progress == self.sequence.len() {
                    state.progress = 0;
                    state.grant_expires_at = Some(Instant::now() + self.grant_duration);
                    metrics::record_grant();
                    tracing::info!(
                        client = %client,
                        grant_secs = self.grant_duration.as_secs(),
                        "Knock sequence complete, access granted"
                    );
                } else {
                    tracing::debug!(
                        client = %client,
                        port,
                        step = state.progress,
                        of = self.sequence.len(),
                        "Knock matched"
                    );
                }
            } else {
                let had_live_grant = state.has_grant_at(Instant::now());
                state.progress = 0;
                state.grant_expires_at = None;
                metrics::record_knock("reset");
                if had_live_grant {
                    tracing::info!(client = %client, port, "Out-of-sequence knock, grant revoked");
                } else {
                    tracing::debug!(client = %client, port, "Out-of-sequence knock, progress reset");
                }
            }
        });
        metrics::record_tracked_clients(self.store.count());
    }
}
