use std::sync::Arc;

use agent_dispatch::broker::Broker;
use agent_dispatch::config::DispatcherConfig;
use agent_dispatch::dispatch::dispatcher::{self, Dispatcher};
use agent_dispatch::dispatch::queue::PendingQueue;
use agent_dispatch::worker::{self, LogHandler, TaskHandler};

/// Default worker queues, one per classification category.
const DEFAULT_WORKERS: &[&str] = &[
    "finance-worker",
    "design-worker",
    "support-worker",
    "marketing-worker",
    "general-worker",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = DispatcherConfig::from_env();

    eprintln!("📬 Agent Dispatch v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Inbound topic: {}", config.inbound_topic);
    eprintln!(
        "   Tick: every {}s, batch size {}",
        config.tick_interval.as_secs(),
        config.batch_size
    );
    eprintln!("   Workers: {}\n", DEFAULT_WORKERS.join(", "));

    let broker = Broker::with_capacity(config.topic_capacity);
    let queue = PendingQueue::new();
    let dispatcher = Arc::new(Dispatcher::new(
        config,
        Arc::clone(&broker),
        Arc::clone(&queue),
    ));

    // Workers subscribe before any dispatch can happen
    let handler: Arc<dyn TaskHandler> = Arc::new(LogHandler);
    for name in DEFAULT_WORKERS {
        worker::spawn_worker(Arc::clone(&broker), name, Arc::clone(&handler));
    }

    let _ingest = dispatcher::spawn_ingest_loop(Arc::clone(&dispatcher));
    let _ticker = dispatcher::spawn_tick_loop(Arc::clone(&dispatcher));

    // Run until interrupted; pending tasks are discarded on shutdown.
    tokio::signal::ctrl_c().await?;

    let status = queue.status_summary().await;
    tracing::info!(
        pending = status.pending,
        submitted = status.submitted_total,
        "Shutting down, discarding pending tasks"
    );

    Ok(())
}
