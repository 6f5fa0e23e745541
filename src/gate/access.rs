//! Admission check for the protected service.

use std::net::IpAddr;
use std::time::Instant;

use crate::knock::state::ClientStateStore;

/// Read-only gate deciding whether a client may reach the protected service.
///
/// The gate shares the client table with the knock sequencer but never writes
/// to it: checking does not create entries, refresh grants, or touch knock
/// progress.
#[derive(Clone)]
pub struct AccessGate {
    store: ClientStateStore,
}

impl AccessGate {
    pub fn new(store: ClientStateStore) -> Self {
        Self { store }
    }

    /// True iff `client` holds a grant that is still live right now.
    ///
    /// An unknown address is denied. The expiry set at grant time is final;
    /// repeated admissions do not stretch it.
    pub fn is_allowed(&self, client: IpAddr) -> bool {
        self.store
            .get(client)
            .map_or(false, |state| state.has_grant_at(Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn client(last_octet: u8) -> IpAddr {
        IpAddr::from([203, 0, 113, last_octet])
    }

    #[test]
    fn unknown_address_is_denied_without_materializing() {
        let store = ClientStateStore::new();
        let gate = AccessGate::new(store.clone());

        assert!(!gate.is_allowed(client(1)));
        assert_eq!(store.count(), 0, "a denied check must not create state");
    }

    #[test]
    fn live_grant_is_allowed() {
        let store = ClientStateStore::new();
        store.update(client(2), |state| {
            state.grant_expires_at = Some(Instant::now() + Duration::from_secs(60));
        });

        let gate = AccessGate::new(store);
        assert!(gate.is_allowed(client(2)));
    }

    #[test]
    fn lapsed_grant_is_denied() {
        let store = ClientStateStore::new();
        // Expires the moment it is written; the check happens strictly after.
        store.update(client(3), |state| {
            state.grant_expires_at = Some(Instant::now());
        });

        let gate = AccessGate::new(store);
        assert!(!gate.is_allowed(client(3)));
    }

    #[test]
    fn mid_sequence_progress_alone_is_denied() {
        let store = ClientStateStore::new();
        store.update(client(4), |state| state.progress = 2);

        let gate = AccessGate::new(store);
        assert!(!gate.is_allowed(client(4)));
    }

    #[test]
    fn checks_never_refresh_the_grant() {
        let store = ClientStateStore::new();
        let expires_at = Instant::now() + Duration::from_secs(60);
        store.update(client(5), |state| {
            state.grant_expires_at = Some(expires_at);
        });

        let gate = AccessGate::new(store.clone());
        assert!(gate.is_allowed(client(5)));
        assert!(gate.is_allowed(client(5)));

        let state = store.get(client(5)).unwrap();
        assert_eq!(state.grant_expires_at, Some(expires_at));
        assert_eq!(state.progress, 0);
    }
}
