//! Integration tests for the dispatch flow.
//!
//! Each test wires a real broker, queue and dispatcher in-process and
//! exercises the inbound-topic → classify → tick → worker-topic contract.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::time::timeout;

use agent_dispatch::broker::Broker;
use agent_dispatch::config::DispatcherConfig;
use agent_dispatch::dispatch::dispatcher::{self, Dispatcher};
use agent_dispatch::dispatch::queue::PendingQueue;
use agent_dispatch::worker::{LogHandler, spawn_worker};

/// Maximum time any receive is allowed to take before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Build a dispatcher over a fresh broker and queue.
fn make_dispatcher(batch_size: usize) -> Arc<Dispatcher> {
    let config = DispatcherConfig {
        batch_size,
        ..DispatcherConfig::default()
    };
    Arc::new(Dispatcher::new(config, Broker::new(), PendingQueue::new()))
}

/// Publish a raw task event on the inbound topic.
async fn publish_event(dispatcher: &Dispatcher, event: Value) {
    dispatcher
        .broker()
        .publish(dispatcher.inbound_topic(), event)
        .await
        .expect("inbound topic should have the ingest subscriber");
}

async fn recv(rx: &mut tokio::sync::broadcast::Receiver<Value>) -> Value {
    timeout(TEST_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for message")
        .expect("channel closed")
}

/// Let spawned loops catch up.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(30)).await;
}

#[tokio::test]
async fn payment_and_design_route_to_their_workers() {
    let dispatcher = make_dispatcher(5);
    let mut finance_rx = dispatcher
        .broker()
        .subscribe("agents/finance-worker/tasks/new")
        .await;
    let mut design_rx = dispatcher
        .broker()
        .subscribe("agents/design-worker/tasks/new")
        .await;

    let _ingest = dispatcher::spawn_ingest_loop(Arc::clone(&dispatcher));
    settle().await;

    publish_event(
        &dispatcher,
        json!({"type": "payment_received", "payload": {}, "priority": "high"}),
    )
    .await;
    publish_event(
        &dispatcher,
        json!({"type": "design_request", "payload": {}, "priority": "medium"}),
    )
    .await;
    settle().await;

    assert_eq!(dispatcher.tick().await, 2);

    let payment = recv(&mut finance_rx).await;
    assert_eq!(payment["kind"], "financial");
    assert_eq!(payment["target_worker"], "finance-worker");
    assert_eq!(payment["priority"], "high");
    assert_eq!(payment["status"], "dispatched");

    let design = recv(&mut design_rx).await;
    assert_eq!(design["kind"], "design");
    assert_eq!(design["target_worker"], "design-worker");
}

#[tokio::test]
async fn six_low_tasks_drain_over_two_ticks() {
    let dispatcher = make_dispatcher(5);
    let mut general_rx = dispatcher
        .broker()
        .subscribe("agents/general-worker/tasks/new")
        .await;

    for i in 0..6 {
        dispatcher
            .ingest_event(agent_dispatch::dispatch::TaskEvent {
                event_type: "unclassified".into(),
                payload: json!({"n": i}),
                priority: Some("low".into()),
            })
            .await
            .unwrap();
    }

    assert_eq!(dispatcher.tick().await, 5);
    assert_eq!(dispatcher.queue().len().await, 1);
    for _ in 0..5 {
        recv(&mut general_rx).await;
    }
    assert!(general_rx.try_recv().is_err());

    assert_eq!(dispatcher.tick().await, 1);
    let last = recv(&mut general_rx).await;
    assert_eq!(last["payload"]["n"], 5);
    assert!(dispatcher.queue().is_empty().await);
}

#[tokio::test]
async fn missing_priority_defaults_to_medium_general() {
    let dispatcher = make_dispatcher(5);
    let mut general_rx = dispatcher
        .broker()
        .subscribe("agents/general-worker/tasks/new")
        .await;

    let _ingest = dispatcher::spawn_ingest_loop(Arc::clone(&dispatcher));
    settle().await;

    publish_event(&dispatcher, json!({"type": "unknown_event"})).await;
    settle().await;
    dispatcher.tick().await;

    let record = recv(&mut general_rx).await;
    assert_eq!(record["kind"], "general");
    assert_eq!(record["target_worker"], "general-worker");
    assert_eq!(record["priority"], "medium");
}

#[tokio::test]
async fn dispatch_order_follows_priority() {
    // Three same-category tasks submitted low, high, medium must come off
    // the topic as high, medium, low.
    let dispatcher = make_dispatcher(5);
    let mut general_rx = dispatcher
        .broker()
        .subscribe("agents/general-worker/tasks/new")
        .await;

    for priority in ["low", "high", "medium"] {
        dispatcher
            .ingest_event(agent_dispatch::dispatch::TaskEvent {
                event_type: "unclassified".into(),
                payload: json!({}),
                priority: Some(priority.into()),
            })
            .await
            .unwrap();
    }

    assert_eq!(dispatcher.tick().await, 3);

    for expected in ["high", "medium", "low"] {
        let record = recv(&mut general_rx).await;
        assert_eq!(record["priority"], expected);
    }
}

#[tokio::test]
async fn equal_priority_preserves_submission_order() {
    let dispatcher = make_dispatcher(5);
    let mut general_rx = dispatcher
        .broker()
        .subscribe("agents/general-worker/tasks/new")
        .await;

    for i in 0..4 {
        dispatcher
            .ingest_event(agent_dispatch::dispatch::TaskEvent {
                event_type: "unclassified".into(),
                payload: json!({"seq": i}),
                priority: Some("medium".into()),
            })
            .await
            .unwrap();
    }

    dispatcher.tick().await;

    for expected in 0..4 {
        let record = recv(&mut general_rx).await;
        assert_eq!(record["payload"]["seq"], expected);
    }
}

#[tokio::test]
async fn worker_reports_completion_on_status_topic() {
    let dispatcher = make_dispatcher(5);
    let broker = Arc::clone(dispatcher.broker());

    let mut status_rx = broker.subscribe("agents/finance-worker/status").await;
    let _worker = spawn_worker(Arc::clone(&broker), "finance-worker", Arc::new(LogHandler));
    let _ingest = dispatcher::spawn_ingest_loop(Arc::clone(&dispatcher));
    settle().await;

    publish_event(
        &dispatcher,
        json!({"type": "invoice_due", "payload": {"invoice": "INV-9"}}),
    )
    .await;
    settle().await;
    dispatcher.tick().await;

    let notice = recv(&mut status_rx).await;
    assert_eq!(notice["worker"], "finance-worker");
    assert_eq!(notice["success"], true);
    assert!(notice["task_id"].is_string());
}

#[tokio::test]
async fn tick_loop_drains_on_interval() {
    let config = DispatcherConfig {
        tick_interval: Duration::from_millis(50),
        batch_size: 5,
        ..DispatcherConfig::default()
    };
    let dispatcher = Arc::new(Dispatcher::new(config, Broker::new(), PendingQueue::new()));
    let mut general_rx = dispatcher
        .broker()
        .subscribe("agents/general-worker/tasks/new")
        .await;

    let _ticker = dispatcher::spawn_tick_loop(Arc::clone(&dispatcher));

    dispatcher
        .ingest_event(agent_dispatch::dispatch::TaskEvent {
            event_type: "unclassified".into(),
            payload: json!({}),
            priority: None,
        })
        .await
        .unwrap();

    let record = recv(&mut general_rx).await;
    assert_eq!(record["status"], "dispatched");
    assert!(dispatcher.queue().is_empty().await);
}
