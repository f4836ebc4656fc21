use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use evbroker::{
    Broker, BrokerConfig, BrokerError, BusTransport, Event, IndexSnapshot, Inbox, MatchStats,
    Metadata, Subscribe, SubscriberId, Transport, TransportError, spawn_subscriber, subscribers,
};
use serde_json::{Value, json};

fn broker_with_history(max_history: usize) -> Broker {
    Broker::new(BrokerConfig {
        max_history,
        ..BrokerConfig::default()
    })
}

fn emit(broker: &Broker, kind: &str) -> String {
    broker
        .emit(kind, Value::Null, Metadata::new())
        .expect("broker open")
}

/// Round-trips through the broker loop; every request queued before is applied.
async fn barrier(broker: &Broker) -> IndexSnapshot {
    broker.snapshot().await.expect("broker open")
}

fn drain(inbox: &mut Inbox) -> Vec<Arc<Event>> {
    let mut out = Vec::new();
    while let Some(ev) = inbox.try_recv() {
        out.push(ev);
    }
    out
}

async fn wait_reaped(broker: &Broker, id: SubscriberId) -> IndexSnapshot {
    for _ in 0..200 {
        let snap = barrier(broker).await;
        if !snap.contains(id) {
            return snap;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("subscriber {id} was not reaped");
}

#[tokio::test]
async fn catch_all_patterns_receive_every_type() {
    let broker = broker_with_history(10);
    let (star, mut star_inbox) = subscribers::channel();
    let (double, mut double_inbox) = subscribers::channel();
    broker.subscribe_pattern("*", &star).await.unwrap();
    broker.subscribe_pattern("**", &double).await.unwrap();

    for kind in ["a", "demo.ping", "", "x.y.z"] {
        emit(&broker, kind);
    }
    barrier(&broker).await;

    assert_eq!(drain(&mut star_inbox).len(), 4);
    assert_eq!(drain(&mut double_inbox).len(), 4);
}

#[tokio::test]
async fn exact_subscription_delivers_once_and_duplicates_deliver_twice() {
    let broker = broker_with_history(10);
    let (once, mut once_inbox) = subscribers::channel();
    let (twice, mut twice_inbox) = subscribers::channel();

    broker.subscribe("demo.ping", &once).await.unwrap();
    broker.subscribe("demo.ping", &twice).await.unwrap();
    broker.subscribe("demo.ping", &twice).await.unwrap();

    let id = emit(&broker, "demo.ping");
    emit(&broker, "demo.pong");
    let snap = barrier(&broker).await;

    let got = drain(&mut once_inbox);
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].id, id);
    assert_eq!(drain(&mut twice_inbox).len(), 2);
    assert_eq!(snap.exact.get("demo.ping").map(Vec::len), Some(3));
    assert_eq!(snap.watches, 3);
}

#[tokio::test]
async fn exact_and_pattern_subscriptions_both_deliver() {
    let broker = broker_with_history(10);
    let (sub, mut inbox) = subscribers::channel();
    broker.subscribe("demo.ping", &sub).await.unwrap();
    broker.subscribe_pattern("demo.*", &sub).await.unwrap();

    emit(&broker, "demo.ping");
    barrier(&broker).await;

    assert_eq!(drain(&mut inbox).len(), 2);
}

#[tokio::test]
async fn pattern_matching_through_the_broker() {
    let broker = broker_with_history(10);
    let (demo, mut demo_inbox) = subscribers::channel();
    let (other, mut other_inbox) = subscribers::channel();
    let (affix, mut affix_inbox) = subscribers::channel();
    broker.subscribe_pattern("demo.*", &demo).await.unwrap();
    broker.subscribe_pattern("other.*", &other).await.unwrap();
    broker.subscribe_pattern("foo.*bar", &affix).await.unwrap();

    emit(&broker, "demo.ping");
    emit(&broker, "foobar");
    barrier(&broker).await;

    let demo_got = drain(&mut demo_inbox);
    assert_eq!(demo_got.len(), 1);
    assert_eq!(demo_got[0].kind, "demo.ping");
    assert!(drain(&mut other_inbox).is_empty());
    let affix_got = drain(&mut affix_inbox);
    assert_eq!(affix_got.len(), 1);
    assert_eq!(affix_got[0].kind, "foobar");
}

#[tokio::test]
async fn trailing_star_pattern_drops_one_dot() {
    let broker = broker_with_history(10);
    let (sub, mut inbox) = subscribers::channel();
    broker.subscribe_pattern("foo.*", &sub).await.unwrap();

    emit(&broker, "foobar");
    emit(&broker, "foo.bar");
    emit(&broker, "fob");
    barrier(&broker).await;

    let kinds: Vec<String> = drain(&mut inbox).iter().map(|e| e.kind.clone()).collect();
    assert_eq!(kinds, ["foobar", "foo.bar"]);
}

#[tokio::test]
async fn publishing_one_event_twice_yields_distinct_ids() {
    let broker = broker_with_history(10);
    let mut ev = Event::new("order.created", json!({"order": 1})).with_metadata("k", json!(1));
    ev.timestamp = std::time::UNIX_EPOCH;

    let first = broker.publish(ev.clone()).unwrap();
    let second = broker.publish(ev.clone()).unwrap();
    let third = broker.publisher("shop").publish(ev.clone()).unwrap();
    barrier(&broker).await;

    let history = broker.get_history(10).await;
    let ids: Vec<&str> = history.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, [first.as_str(), second.as_str(), third.as_str()]);
    assert_ne!(first, second);
    assert_ne!(second, third);
    assert!(!ids.contains(&ev.id.as_str()));
    for stored in &history {
        assert!(stored.timestamp > std::time::UNIX_EPOCH);
        assert_eq!(stored.kind, "order.created");
        assert_eq!(stored.metadata.get("k"), Some(&json!(1)));
    }
    assert_eq!(history[2].source.as_deref(), Some("shop"));
}

#[tokio::test]
async fn history_keeps_the_newest_events() {
    let broker = broker_with_history(3);
    let ids: Vec<String> = (1..=5).map(|n| emit(&broker, &format!("e{n}"))).collect();
    barrier(&broker).await;

    let history = broker.get_history(10).await;
    let got: Vec<&str> = history.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(got, ids[2..].iter().map(String::as_str).collect::<Vec<_>>());

    let kinds: Vec<&str> = history.iter().map(|e| e.kind.as_str()).collect();
    assert_eq!(kinds, ["e3", "e4", "e5"]);

    assert_eq!(broker.get_history(2).await.len(), 2);
    assert_eq!(broker.get_history(2).await[0].kind, "e4");
}

#[tokio::test]
async fn history_reads_are_idempotent() {
    let broker = broker_with_history(10);
    for n in 0..4 {
        emit(&broker, &format!("t{n}"));
    }
    barrier(&broker).await;

    let first = broker.get_history(3).await;
    let second = broker.get_history(3).await;
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}

#[tokio::test]
async fn zero_history_keeps_nothing() {
    let broker = broker_with_history(0);
    emit(&broker, "t");
    let snap = barrier(&broker).await;
    assert!(broker.get_history(10).await.is_empty());
    assert_eq!(snap.history_len, 0);
}

#[tokio::test]
async fn terminated_subscriber_is_reaped_from_both_indexes() {
    let broker = broker_with_history(10);
    let (gone, gone_inbox) = subscribers::channel();
    let (stays, mut stays_inbox) = subscribers::channel();

    broker.subscribe("demo.ping", &gone).await.unwrap();
    broker.subscribe("demo.pong", &gone).await.unwrap();
    broker.subscribe_pattern("demo.*", &gone).await.unwrap();
    broker.subscribe_pattern("demo.*", &stays).await.unwrap();

    drop(gone_inbox);
    let snap = wait_reaped(&broker, gone.id()).await;

    assert!(!snap.exact.contains_key("demo.ping"));
    assert!(!snap.exact.contains_key("demo.pong"));
    assert_eq!(snap.patterns.get("demo.*"), Some(&vec![stays.id()]));
    assert_eq!(snap.watches, 1);

    emit(&broker, "demo.ping");
    barrier(&broker).await;
    assert_eq!(drain(&mut stays_inbox).len(), 1);
}

struct Counter(Arc<AtomicUsize>);

#[async_trait]
impl Subscribe for Counter {
    async fn on_event(&self, _event: &Event) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn stopped_worker_receives_nothing_further() {
    let broker = broker_with_history(10);
    let count = Arc::new(AtomicUsize::new(0));
    let worker = spawn_subscriber(Arc::new(Counter(count.clone())));
    let id = worker.id();

    broker.subscribe("tick", worker.subscriber()).await.unwrap();
    broker.subscribe_pattern("ti*", worker.subscriber()).await.unwrap();
    emit(&broker, "tick");

    for _ in 0..200 {
        if count.load(Ordering::SeqCst) == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(count.load(Ordering::SeqCst), 2);

    worker.stop().await;
    let snap = wait_reaped(&broker, id).await;
    assert!(snap.is_empty());

    emit(&broker, "tick");
    barrier(&broker).await;
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn subscribing_a_dead_subscriber_is_reaped() {
    let broker = broker_with_history(10);
    let (sub, inbox) = subscribers::channel();
    drop(inbox);

    broker.subscribe("t", &sub).await.unwrap();
    let snap = wait_reaped(&broker, sub.id()).await;
    assert_eq!(snap.watches, 0);
}

#[tokio::test]
async fn unsubscribe_removes_every_entry_for_that_key() {
    let broker = broker_with_history(10);
    let (sub, mut inbox) = subscribers::channel();
    let (other, _other_inbox) = subscribers::channel();

    broker.subscribe("t", &sub).await.unwrap();
    broker.subscribe("t", &sub).await.unwrap();
    broker.subscribe("t", &other).await.unwrap();
    broker.subscribe_pattern("t*", &sub).await.unwrap();

    assert_eq!(broker.unsubscribe("t", &sub).await.unwrap(), 2);
    assert_eq!(broker.unsubscribe("t", &sub).await.unwrap(), 0);
    assert_eq!(broker.unsubscribe("unknown", &sub).await.unwrap(), 0);
    assert_eq!(broker.unsubscribe_pattern("nope*", &sub).await.unwrap(), 0);

    let snap = barrier(&broker).await;
    assert_eq!(snap.exact.get("t"), Some(&vec![other.id()]));
    assert_eq!(snap.watches, 2);

    emit(&broker, "t");
    barrier(&broker).await;
    assert_eq!(drain(&mut inbox).len(), 1, "only the pattern entry is left");

    assert_eq!(broker.unsubscribe_pattern("t*", &sub).await.unwrap(), 1);
    let snap = barrier(&broker).await;
    assert!(snap.patterns.is_empty());
    assert_eq!(snap.watches, 1);
}

#[tokio::test]
async fn publisher_stamps_source_and_metadata() {
    let broker = broker_with_history(10);
    let (sub, mut inbox) = subscribers::channel();
    broker.subscribe("order.created", &sub).await.unwrap();

    let mut meta = Metadata::new();
    meta.insert("tenant".into(), json!("acme"));
    let id = broker
        .publisher("shop")
        .emit("order.created", json!({"order": 7}), meta)
        .unwrap();

    let ev = tokio::time::timeout(Duration::from_secs(1), inbox.recv())
        .await
        .expect("delivery")
        .expect("inbox open");
    assert_eq!(ev.id, id);
    assert_eq!(ev.source.as_deref(), Some("shop"));
    assert_eq!(ev.data, json!({"order": 7}));
    assert_eq!(ev.metadata.get("tenant"), Some(&json!("acme")));
}

#[tokio::test]
async fn every_pattern_evaluation_is_measured() {
    let stats = Arc::new(MatchStats::new());
    let broker = Broker::builder(BrokerConfig::default())
        .with_metrics(stats.clone())
        .build();
    let (sub, _inbox) = subscribers::channel();
    broker.subscribe_pattern("a.*", &sub).await.unwrap();
    broker.subscribe_pattern("b.*", &sub).await.unwrap();
    broker.subscribe_pattern("b.*", &sub).await.unwrap();
    broker.subscribe("a.x", &sub).await.unwrap();

    emit(&broker, "a.x");
    emit(&broker, "c.x");
    barrier(&broker).await;

    let snap = stats.snapshot();
    assert_eq!(snap.evaluations, 4, "two pattern keys per emit");
    assert_eq!(snap.matches, 1);
    assert_eq!(snap.dispatched, 2);
    assert_eq!(snap.deliveries, 2);
}

#[tokio::test]
async fn transport_receives_a_copy_of_every_event() {
    let bus = BusTransport::new(16);
    let mut remote = bus.subscribe();
    let broker = Broker::builder(BrokerConfig::default())
        .with_transport(Arc::new(bus))
        .build();

    let a = emit(&broker, "no.subscribers");
    let b = emit(&broker, "still.none");

    for expected in [a, b] {
        let ev = tokio::time::timeout(Duration::from_secs(1), remote.recv())
            .await
            .expect("forwarded")
            .expect("bus open");
        assert_eq!(ev.id, expected);
    }
}

struct Broken {
    calls: AtomicUsize,
}

#[async_trait]
impl Transport for Broken {
    async fn forward(&self, _event: Arc<Event>) -> Result<(), TransportError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n % 2 == 0 {
            Err(TransportError::Unavailable {
                reason: "link down".into(),
            })
        } else {
            panic!("transport bug");
        }
    }
}

#[tokio::test]
async fn transport_failures_do_not_reach_the_broker() {
    let transport = Arc::new(Broken {
        calls: AtomicUsize::new(0),
    });
    let broker = Broker::builder(BrokerConfig::default())
        .with_transport(transport.clone())
        .build();
    let (sub, mut inbox) = subscribers::channel();
    broker.subscribe("t", &sub).await.unwrap();

    for _ in 0..4 {
        emit(&broker, "t");
    }
    barrier(&broker).await;
    assert_eq!(drain(&mut inbox).len(), 4);

    broker.shutdown().await;
    assert_eq!(transport.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn concurrent_emitters_are_all_recorded() {
    let broker = broker_with_history(1000);
    let (sub, mut inbox) = subscribers::channel();
    broker.subscribe_pattern("load.*", &sub).await.unwrap();

    let mut tasks = Vec::new();
    for worker in 0..8 {
        let broker = broker.clone();
        tasks.push(tokio::spawn(async move {
            for n in 0..25 {
                broker
                    .emit(format!("load.{worker}"), json!(n), Metadata::new())
                    .expect("broker open");
            }
        }));
    }
    for t in tasks {
        t.await.expect("emitter");
    }

    let snap = barrier(&broker).await;
    assert_eq!(snap.history_len, 200);
    assert_eq!(drain(&mut inbox).len(), 200);
}

#[tokio::test]
async fn shutdown_closes_every_handle() {
    let broker = broker_with_history(10);
    let clone = broker.clone();
    let (sub, _inbox) = subscribers::channel();
    broker.subscribe("t", &sub).await.unwrap();
    emit(&broker, "t");

    broker.shutdown().await;

    assert!(clone.is_closed());
    assert_eq!(
        clone.emit("t", Value::Null, Metadata::new()),
        Err(BrokerError::Closed)
    );
    assert_eq!(clone.subscribe("t", &sub).await, Err(BrokerError::Closed));
    assert_eq!(clone.snapshot().await, Err(BrokerError::Closed));
    assert!(clone.get_history(10).await.is_empty());

    // Idempotent.
    clone.shutdown().await;
}
