//! Knock client for the portcullis daemon.
//!
//! A knock is nothing but a TCP connect, so anything from `nc -z` up can
//! send one; this client adds ordered delivery with a pause between knocks,
//! per-knock outcome reporting, and a follow-up fetch of the protected
//! service.

use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::time::timeout;

#[derive(Parser)]
#[command(name = "knock-cli")]
#[command(about = "Knock client for the portcullis daemon", long_about = None)]
struct Cli {
    /// Host running the daemon.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Per-connection timeout in milliseconds.
    #[arg(long, default_value_t = 1000)]
    timeout_ms: u64,

    /// Pause between knocks in milliseconds, giving the daemon time to
    /// register each knock before the next arrives.
    #[arg(long, default_value_t = 100)]
    delay_ms: u64,

    /// Emit knock results as JSON.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a knock sequence, in order
    Knock {
        /// Ports to knock, comma-separated, in sequence order
        #[arg(value_delimiter = ',', required = true)]
        ports: Vec<u16>,
    },
    /// Fetch the protected service once
    Check {
        /// Protected service port
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Knock, then fetch the protected service
    Open {
        /// Ports to knock, comma-separated, in sequence order
        #[arg(value_delimiter = ',', required = true)]
        ports: Vec<u16>,
        /// Protected service port
        #[arg(long, default_value_t = 8080)]
        service_port: u16,
    },
}

#[derive(Serialize)]
struct KnockReport {
    host: String,
    knocks: Vec<KnockResult>,
}

#[derive(Serialize)]
struct KnockResult {
    port: u16,
    outcome: &'static str,
    detail: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let conn_timeout = Duration::from_millis(cli.timeout_ms);
    let delay = Duration::from_millis(cli.delay_ms);

    match &cli.command {
        Commands::Knock { ports } => {
            let report = send_knocks(&cli.host, ports, conn_timeout, delay).await;
            print_report(&report, cli.json)?;
        }
        Commands::Check { port } => {
            check_service(&cli.host, *port).await?;
        }
        Commands::Open { ports, service_port } => {
            let report = send_knocks(&cli.host, ports, conn_timeout, delay).await;
            print_report(&report, cli.json)?;
            // Let the daemon register the final knock before fetching.
            tokio::time::sleep(delay).await;
            check_service(&cli.host, *service_port).await?;
        }
    }

    Ok(())
}

/// Connect to each port in order; the connection attempt is the knock.
///
/// A refused or timed-out connect still reaches the caller's report instead
/// of aborting the walk: the daemon may simply not monitor that port, and
/// the remaining knocks are still worth sending.
async fn send_knocks(
    host: &str,
    ports: &[u16],
    conn_timeout: Duration,
    delay: Duration,
) -> KnockReport {
    let mut knocks = Vec::with_capacity(ports.len());

    for (i, &port) in ports.iter().enumerate() {
        let result = match timeout(conn_timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(stream)) => {
                // The daemon closes the moment it accepts; nothing to read.
                drop(stream);
                KnockResult {
                    port,
                    outcome: "delivered",
                    detail: "connect accepted".to_string(),
                }
            }
            Ok(Err(err)) if err.kind() == std::io::ErrorKind::ConnectionRefused => KnockResult {
                port,
                outcome: "refused",
                detail: "no listener on port".to_string(),
            },
            Ok(Err(err)) => KnockResult {
                port,
                outcome: "error",
                detail: err.to_string(),
            },
            Err(_) => KnockResult {
                port,
                outcome: "timeout",
                detail: format!("no answer within {}ms", conn_timeout.as_millis()),
            },
        };
        knocks.push(result);

        if i + 1 < ports.len() {
            tokio::time::sleep(delay).await;
        }
    }

    KnockReport {
        host: host.to_string(),
        knocks,
    }
}

fn print_report(report: &KnockReport, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    for knock in &report.knocks {
        println!("{:>5}/tcp  {:<9}  {}", knock.port, knock.outcome, knock.detail);
    }
    Ok(())
}

/// Fetch the protected service once and print what came back.
///
/// A denied client sees the daemon close the socket before any response,
/// which surfaces here as a request error and a non-zero exit.
async fn check_service(host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let url = format!("http://{}:{}/", host, port);
    let client = reqwest::Client::builder().no_proxy().build()?;

    let res = match client.get(&url).send().await {
        Ok(res) => res,
        Err(e) => {
            eprintln!("{} -> no response (denied, or service down): {}", url, e);
            return Err(e.into());
        }
    };

    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    println!("{} -> {}", url, status);
    if !body.is_empty() {
        print!("{}", body);
    }
    if !status.is_success() {
        return Err(format!("service answered {}", status).into());
    }
    Ok(())
}
