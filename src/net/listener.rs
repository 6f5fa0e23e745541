//! TCP bind plumbing shared by the knock listeners and the protected service.
//!
//! # Responsibilities
//! - Turn a configured host + port into a bound `TcpListener`
//! - Distinguish bind failures from accept failures for callers
//!
//! Binding is deliberately separate from accepting: callers decide per port
//! whether a bind failure disables that listener (knock ports) or the whole
//! surface (nothing here is fatal to the process either way).

use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// Failed to bind to address.
    Bind(std::io::Error),
    /// Failed to accept connection.
    Accept(std::io::Error),
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Bind(e) => write!(f, "Failed to bind: {}", e),
            ListenerError::Accept(e) => write!(f, "Failed to accept: {}", e),
        }
    }
}

impl std::error::Error for ListenerError {}

/// Bind a TCP listener on `host:port`.
///
/// `host` must be an IP address ("0.0.0.0" to listen on all local
/// addresses). A malformed host surfaces as `ListenerError::Bind` with
/// `InvalidInput`, same as any other unusable address.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener, ListenerError> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| ListenerError::Bind(std::io::Error::new(std::io::ErrorKind::InvalidInput, e)))?;

    let listener = TcpListener::bind(addr).await.map_err(ListenerError::Bind)?;

    let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;
    tracing::debug!(address = %local_addr, "Listener bound");

    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bind_ephemeral_port() {
        let listener = bind("127.0.0.1", 0).await.unwrap();
        let addr = listener.local_addr().unwrap();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn bind_occupied_port_is_bind_error() {
        let first = bind("127.0.0.1", 0).await.unwrap();
        let port = first.local_addr().unwrap().port();

        match bind("127.0.0.1", port).await {
            Err(ListenerError::Bind(_)) => {}
            Err(other) => panic!("expected bind error, got {}", other),
            Ok(_) => panic!("expected bind error, got listener"),
        }
    }

    #[tokio::test]
    async fn bind_malformed_host_is_bind_error() {
        match bind("not-an-ip", 0).await {
            Err(ListenerError::Bind(e)) => {
                assert_eq!(e.kind(), std::io::ErrorKind::InvalidInput);
            }
            Err(other) => panic!("expected bind error, got {}", other),
            Ok(_) => panic!("expected bind error, got listener"),
        }
    }
}
