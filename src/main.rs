//! Portcullis: a TCP port-knocking daemon.
//!
//! Connecting to a configured sequence of monitored ports, in order, earns a
//! client a time-bounded grant to reach the protected service. Everyone else
//! gets an immediate silent close.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌──────────────────────────────────────────────────┐
//!                              │                   PORTCULLIS                      │
//!                              │                                                   │
//!     knock: connect to        │  ┌──────────┐      ┌───────────┐                 │
//!     45010, 45030, 45020      │  │  knock   │─────▶│   knock   │                 │
//!     ─────────────────────────┼─▶│listeners │      │ sequencer │                 │
//!                              │  │(per port)│      └─────┬─────┘                 │
//!                              │  └──────────┘            │ advance /             │
//!                              │                          ▼ grant / reset         │
//!                              │                  ┌───────────────┐               │
//!                              │                  │ client state  │               │
//!                              │                  │    store      │               │
//!                              │                  └───────┬───────┘               │
//!                              │                          │ read-only             │
//!     fetch: connect to        │  ┌──────────┐      ┌─────▼─────┐                 │
//!     the protected port       │  │protected │─────▶│  access   │                 │
//!     ─────────────────────────┼─▶│ service  │      │   gate    │                 │
//!     ◀── response | close ────┼──│ listener │◀─────│           │                 │
//!                              │  └──────────┘      └───────────┘                 │
//!                              │                                                   │
//!                              │  ┌─────────────────────────────────────────────┐ │
//!                              │  │            Cross-Cutting Concerns            │ │
//!                              │  │  ┌────────┐ ┌─────────────┐ ┌────────────┐  │ │
//!                              │  │  │ config │ │observability│ │ lifecycle  │  │ │
//!                              │  │  └────────┘ └─────────────┘ └────────────┘  │ │
//!                              │  └─────────────────────────────────────────────┘ │
//!                              └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use portcullis::config::{load_config, PortcullisConfig};
use portcullis::gate::{default_handler, AccessGate, ProtectedService};
use portcullis::knock::{spawn_knock_listeners, ClientStateStore, KnockSequencer};
use portcullis::lifecycle::{shutdown_signal, Shutdown};
use portcullis::observability::{logging, metrics};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "portcullis", version, about = "TCP port-knocking daemon")]
struct Args {
    /// Path to a TOML config file. Built-in defaults apply when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init("portcullis=info");

    let args = Args::parse();
    tracing::info!("portcullis v0.1.0 starting");

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => PortcullisConfig::default(),
    };

    tracing::info!(
        sequence = ?config.knock.sequence,
        range_start = config.knock.port_range.start,
        range_end = config.knock.port_range.end,
        grant_secs = config.knock.grant_secs,
        service_port = config.service.port,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let store = ClientStateStore::new();
    let sequencer = Arc::new(KnockSequencer::new(
        config.knock.sequence.clone(),
        Duration::from_secs(config.knock.grant_secs),
        store.clone(),
    ));

    let bound =
        spawn_knock_listeners(&config.listener.bind_host, config.knock.port_range, sequencer).await;
    if bound == 0 {
        tracing::error!("No knock port could be bound; no sequence can ever complete");
    }

    let shutdown = Shutdown::new();
    let gate = AccessGate::new(store.clone());
    let service_task = match ProtectedService::bind(&config.service, &config.listener, gate).await {
        Ok(service) => Some(tokio::spawn(
            service.serve(default_handler, shutdown.subscribe()),
        )),
        Err(e) => {
            // Knock monitoring still runs; the grants just have nothing to
            // open until the port frees up and the daemon restarts.
            tracing::error!(port = config.service.port, error = %e, "Protected service disabled");
            None
        }
    };

    shutdown_signal().await;
    shutdown.trigger();
    if let Some(task) = service_task {
        let _ = task.await;
    }

    let (active_grants, tracked_clients) = store.grant_summary();
    tracing::info!(active_grants, tracked_clients, "Shutdown complete");
    Ok(())
}
