//! Shared utilities for integration and load testing.
//!
//! Each test composes the daemon out of the library pieces the same way
//! `main` does, on its own block of loopback ports. Tests within one binary
//! run concurrently, so port blocks must never overlap.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::net::{TcpSocket, TcpStream};

use portcullis::config::{PortRange, PortcullisConfig};
use portcullis::gate::{default_handler, AccessGate, ProtectedService};
use portcullis::knock::{spawn_knock_listeners, ClientStateStore, KnockSequencer};
use portcullis::lifecycle::Shutdown;

/// Build a loopback config over one test's port block.
pub fn test_config(
    range: (u16, u16),
    sequence: &[u16],
    service_port: u16,
    grant_secs: u64,
) -> PortcullisConfig {
    let mut config = PortcullisConfig::default();
    config.listener.bind_host = "127.0.0.1".to_string();
    config.knock.port_range = PortRange {
        start: range.0,
        end: range.1,
    };
    config.knock.sequence = sequence.to_vec();
    config.knock.grant_secs = grant_secs;
    config.service.port = service_port;
    config
}

/// Start the daemon: knock listeners plus the gated protected service.
///
/// All binds complete before this returns, so callers can knock right away.
/// Returns the shutdown handle and the number of knock ports bound.
pub async fn start_daemon(config: &PortcullisConfig) -> (Shutdown, usize) {
    let store = ClientStateStore::new();
    let sequencer = Arc::new(KnockSequencer::new(
        config.knock.sequence.clone(),
        Duration::from_secs(config.knock.grant_secs),
        store.clone(),
    ));
    let bound =
        spawn_knock_listeners(&config.listener.bind_host, config.knock.port_range, sequencer).await;

    let shutdown = Shutdown::new();
    let gate = AccessGate::new(store);
    let service = ProtectedService::bind(&config.service, &config.listener, gate)
        .await
        .expect("protected service must bind");
    tokio::spawn(service.serve(default_handler, shutdown.subscribe()));

    (shutdown, bound)
}

/// One knock: connect and drop. The trailing sleep lets the daemon register
/// this knock before the caller sends the next one.
pub async fn knock(port: u16) {
    let stream = TcpStream::connect(("127.0.0.1", port))
        .await
        .expect("knock port must accept");
    drop(stream);
    tokio::time::sleep(Duration::from_millis(50)).await;
}

/// Knock the whole sequence, in order.
pub async fn knock_sequence(ports: &[u16]) {
    for &port in ports {
        knock(port).await;
    }
}

/// Knock from a specific loopback source address (e.g. 127.0.0.2).
#[allow(dead_code)]
pub async fn knock_from(source: IpAddr, port: u16) {
    let stream = connect_from(source, port)
        .await
        .expect("knock port must accept");
    drop(stream);
    tokio::time::sleep(Duration::from_millis(50)).await;
}

/// Connect to 127.0.0.1:`port` with the given loopback source address.
#[allow(dead_code)]
pub async fn connect_from(source: IpAddr, port: u16) -> std::io::Result<TcpStream> {
    let socket = TcpSocket::new_v4()?;
    socket.bind(SocketAddr::new(source, 0))?;
    let dest: SocketAddr = format!("127.0.0.1:{}", port).parse().unwrap();
    socket.connect(dest).await
}

/// Read whatever the protected service sends until it closes.
/// A denied connection yields zero bytes.
#[allow(dead_code)]
pub async fn fetch_raw(port: u16) -> Vec<u8> {
    let mut stream = TcpStream::connect(("127.0.0.1", port))
        .await
        .expect("service port must accept");
    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .await
        .expect("read until close");
    response
}

/// Like [`fetch_raw`] but from a specific loopback source address.
#[allow(dead_code)]
pub async fn fetch_raw_from(source: IpAddr, port: u16) -> Vec<u8> {
    let mut stream = connect_from(source, port)
        .await
        .expect("service port must accept");
    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .await
        .expect("read until close");
    response
}
