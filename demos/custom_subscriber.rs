//! # Example: custom_subscriber
//!
//! Demonstrates a worker-driven subscriber and automatic cleanup.
//!
//! Shows how to:
//! - Implement the [`Subscribe`] trait.
//! - Attach it to exact and wildcard subscriptions.
//! - Stop it and watch the broker reap its subscriptions.
//!
//! ## Flow
//! ```text
//! spawn_subscriber(Console) ──► SubscriberHandle
//!     ├─► broker.subscribe("order.created", sub)
//!     ├─► broker.subscribe_pattern("order.*", sub)
//!     ├─► publisher.emit(...)  ──► Console.on_event()  (x2 for order.created)
//!     └─► handle.stop()        ──► inbox dropped ──► reaper removes both entries
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example custom_subscriber
//! ```

use std::sync::Arc;
use std::time::Duration;

use evbroker::{Broker, BrokerConfig, Event, Metadata, Subscribe, spawn_subscriber};
use serde_json::json;

/// A console subscriber that prints what it receives.
/// In real life, you could update a read model, ship logs, or trigger alerts.
struct Console;

#[async_trait::async_trait]
impl Subscribe for Console {
    async fn on_event(&self, ev: &Event) {
        println!(
            "[console] {:<16} id={} source={} data={}",
            ev.kind,
            ev.id,
            ev.source.as_deref().unwrap_or("<anon>"),
            ev.data
        );
    }

    fn name(&self) -> &'static str {
        "console"
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let broker = Broker::new(BrokerConfig::default());
    let console = spawn_subscriber(Arc::new(Console));

    broker.subscribe("order.created", console.subscriber()).await?;
    broker.subscribe_pattern("order.*", console.subscriber()).await?;

    let shop = broker.publisher("shop");
    shop.emit("order.created", json!({"order": 1}), Metadata::new())?;
    shop.emit("order.shipped", json!({"order": 1}), Metadata::new())?;
    shop.emit("user.login", json!({"user": "ann"}), Metadata::new())?;

    tokio::time::sleep(Duration::from_millis(100)).await;
    println!("before stop: {:?}", broker.snapshot().await?);

    console.stop().await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    println!("after stop:  {:?}", broker.snapshot().await?);

    let history = broker.get_history(10).await;
    println!("history: {:?}", history.iter().map(|e| e.kind.as_str()).collect::<Vec<_>>());

    broker.shutdown().await;
    Ok(())
}
