//! # Example: ping
//!
//! Logs every delivery through the built-in [`LogWriter`], with slow-match
//! warnings and metric traces visible via `RUST_LOG`.
//!
//! ## Run
//! ```bash
//! RUST_LOG=evbroker=trace cargo run --example ping --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use evbroker::subscribers::LogWriter;
use evbroker::{Broker, BrokerConfig, BusTransport, MatchStats, Metadata, spawn_subscriber};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let stats = Arc::new(MatchStats::new());
    let bus = BusTransport::new(64);
    let mut remote = bus.subscribe();

    let broker = Broker::builder(BrokerConfig {
        max_history: 16,
        ..BrokerConfig::default()
    })
    .with_metrics(stats.clone())
    .with_transport(Arc::new(bus))
    .build();

    let logger = spawn_subscriber(Arc::new(LogWriter::new()));
    broker.subscribe_pattern("demo.*", logger.subscriber()).await?;

    let pinger = broker.publisher("pinger");
    for n in 0..3 {
        pinger.emit("demo.ping", json!({ "n": n }), Metadata::new())?;
    }
    pinger.emit("other.ping", json!({}), Metadata::new())?;

    for _ in 0..4 {
        let ev = tokio::time::timeout(Duration::from_secs(1), remote.recv()).await??;
        println!("[remote] {} {}", ev.kind, ev.id);
    }

    logger.stop().await;
    broker.shutdown().await;
    println!("stats: {:?}", stats.snapshot());
    Ok(())
}
