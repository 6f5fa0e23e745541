//! Per-client knock state and the shared table it lives in.

use dashmap::DashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;

/// Knock progress and grant for a single client address.
///
/// The zero value (`progress` 0, no grant) is the state of a client that has
/// never knocked, so absent table entries and fresh entries behave the same.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientState {
    /// Index of the next sequence port this client must hit.
    pub progress: usize,
    /// When the current grant lapses. `None` means no grant.
    pub grant_expires_at: Option<Instant>,
}

impl ClientState {
    /// Whether the grant is live at `now`.
    ///
    /// The bound is exclusive: a check at exactly `grant_expires_at` is
    /// already denied.
    pub fn has_grant_at(&self, now: Instant) -> bool {
        matches!(self.grant_expires_at, Some(expires_at) if now < expires_at)
    }
}

/// Thread-safe table of per-client knock state, shared between the knock
/// listeners (writers) and the access gate (reader).
///
/// Cloning is cheap and yields a handle to the same table. Entries are
/// created on first knock and kept for the process lifetime; `count` and
/// `grant_summary` expose the growth.
#[derive(Clone, Default)]
pub struct ClientStateStore {
    clients: Arc<DashMap<IpAddr, ClientState>>,
}

impl ClientStateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            clients: Arc::new(DashMap::new()),
        }
    }

    /// Snapshot the state for `client`, if the address was ever seen.
    pub fn get(&self, client: IpAddr) -> Option<ClientState> {
        self.clients.get(&client).map(|entry| *entry.value())
    }

    /// Apply `f` to the state for `client`, materializing the zero state
    /// first if the address is new.
    ///
    /// The closure runs under the entry lock, so concurrent updates for the
    /// same address serialize instead of interleaving. `f` must not block.
    pub fn update<F>(&self, client: IpAddr, f: F)
    where
        F: FnOnce(&mut ClientState),
    {
        let mut entry = self.clients.entry(client).or_default();
        f(entry.value_mut());
    }

    /// Number of client addresses currently tracked.
    pub fn count(&self) -> usize {
        self.clients.len()
    }

    /// Count of (clients holding a live grant, clients tracked).
    pub fn grant_summary(&self) -> (usize, usize) {
        let now = Instant::now();
        let active = self
            .clients
            .iter()
            .filter(|entry| entry.value().has_grant_at(now))
            .count();
        (active, self.clients.len())
    }
}
