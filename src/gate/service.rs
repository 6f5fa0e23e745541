//! Protected-service listener.
//!
//! # Responsibilities
//! - Bind the protected port
//! - Gate every accepted connection on the client's grant
//! - Enforce max_connections limit via semaphore
//! - Hand allowed connections to the handler without stalling accept
//! - Close denied connections silently
//!
//! The handler is an injected collaborator; anything that takes an accepted
//! stream can sit behind the gate. [`default_handler`] answers with a fixed
//! minimal HTTP response.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Semaphore};

use crate::config::{ListenerConfig, ServiceConfig};
use crate::gate::access::AccessGate;
use crate::net::{self, ListenerError};
use crate::observability::metrics;

/// The gated TCP surface in front of the protected service.
///
/// Uses a semaphore to enforce `max_connections`. When the limit is reached,
/// accepting pauses until a slot frees up.
pub struct ProtectedService {
    listener: TcpListener,
    gate: AccessGate,
    connection_limit: Arc<Semaphore>,
}

impl ProtectedService {
    /// Bind the protected port. A failure here leaves knock monitoring
    /// untouched; the caller decides whether to carry on without the
    /// service surface.
    pub async fn bind(
        service: &ServiceConfig,
        listener_config: &ListenerConfig,
        gate: AccessGate,
    ) -> Result<Self, ListenerError> {
        let listener = net::bind(&listener_config.bind_host, service.port).await?;
        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

        tracing::info!(
            address = %local_addr,
            max_connections = listener_config.max_connections,
            "Protected service listening"
        );

        Ok(Self {
            listener,
            gate,
            connection_limit: Arc::new(Semaphore::new(listener_config.max_connections)),
        })
    }

    /// The local address this service is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown` fires.
    ///
    /// Allowed connections run `handler` on their own task while the loop
    /// keeps accepting; denied connections are dropped without a byte, which
    /// is all an unauthorized prober ever learns.
    pub async fn serve<F, Fut>(self, handler: F, mut shutdown: broadcast::Receiver<()>)
    where
        F: Fn(TcpStream, SocketAddr) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler = Arc::new(handler);
        loop {
            // Acquire permit first (backpressure)
            let permit = self
                .connection_limit
                .clone()
                .acquire_owned()
                .await
                .expect("Semaphore closed unexpectedly");

            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Protected service stopped accepting");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let client = peer.ip();
                        if self.gate.is_allowed(client) {
                            tracing::info!(client = %client, "Service connection allowed");
                            metrics::record_service_decision(true);
                            let handler = Arc::clone(&handler);
                            tokio::spawn(async move {
                                handler(stream, peer).await;
                                drop(permit);
                            });
                        } else {
                            tracing::debug!(client = %client, "Service connection denied");
                            metrics::record_service_decision(false);
                            // Dropping the stream closes it with no response;
                            // the permit frees with this iteration.
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Error accepting service connection");
                    }
                },
            }
        }
    }
}

/// Reference handler: a fixed minimal HTTP response for any admitted
/// connection, enough for curl or a browser hitting the port with a GET.
pub async fn default_handler(mut stream: TcpStream, peer: SocketAddr) {
    const RESPONSE: &str = "HTTP/1.1 200 OK\r\n\
        Content-Type: text/plain; charset=utf-8\r\n\
        Content-Length: 20\r\n\
        \r\n\
        Welcome to the API!\n";

    if let Err(e) = stream.write_all(RESPONSE.as_bytes()).await {
        tracing::warn!(client = %peer.ip(), error = %e, "Error writing service response");
    }
    let _ = stream.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knock::state::ClientStateStore;
    use std::net::IpAddr;
    use std::time::{Duration, Instant};
    use tokio::io::AsyncReadExt;

    async fn serve_on_ephemeral_port(
        store: ClientStateStore,
    ) -> (SocketAddr, broadcast::Sender<()>) {
        let service = ProtectedService::bind(
            &ServiceConfig { port: 0 },
            &ListenerConfig {
                bind_host: "127.0.0.1".to_string(),
                max_connections: 16,
            },
            AccessGate::new(store),
        )
        .await
        .unwrap();
        let addr = service.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        tokio::spawn(service.serve(default_handler, shutdown_rx));
        (addr, shutdown_tx)
    }

    fn grant_loopback(store: &ClientStateStore) {
        let loopback: IpAddr = "127.0.0.1".parse().unwrap();
        store.update(loopback, |state| {
            state.grant_expires_at = Some(Instant::now() + Duration::from_secs(60));
        });
    }

    #[tokio::test]
    async fn granted_client_gets_the_response() {
        let store = ClientStateStore::new();
        grant_loopback(&store);
        let (addr, _shutdown) = serve_on_ephemeral_port(store).await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();

        let text = String::from_utf8(response).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.ends_with("\r\n\r\nWelcome to the API!\n"));
    }

    #[tokio::test]
    async fn ungranted_client_is_closed_without_a_byte() {
        let store = ClientStateStore::new();
        let (addr, _shutdown) = serve_on_ephemeral_port(store).await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        let mut response = Vec::new();
        let read = stream.read_to_end(&mut response).await.unwrap();
        assert_eq!(read, 0, "denied connection must close silently");
    }

    #[tokio::test]
    async fn shutdown_stops_accepting() {
        let store = ClientStateStore::new();
        grant_loopback(&store);
        let (addr, shutdown) = serve_on_ephemeral_port(store).await;

        shutdown.send(()).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        // The listener is dropped once the loop exits.
        assert!(TcpStream::connect(addr).await.is_err());
    }
}
