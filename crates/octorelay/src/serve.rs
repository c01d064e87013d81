// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `octorelay serve` implementation.
//!
//! Opens the database, picks the broker backend, starts one consumer per
//! enabled handler, the Telegram poller, the garbage collector and the
//! webhook listener, then waits for a shutdown signal.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use octorelay_config::model::QueueBackend;
use octorelay_config::OctorelayConfig;
use octorelay_core::{Broker, ChatApi, RelayError, RelayStore};
use octorelay_pipeline::{registrations, GarbageCollector, RelayContext, RelaySettings};
use octorelay_queue::{Dispatcher, MemoryBroker, QueueClient};
use octorelay_storage::{Database, SqliteBroker, SqliteStore};
use octorelay_telegram::updates::spawn_polling;
use octorelay_telegram::TelegramChat;

use crate::{ingress, shutdown};

/// Runs the relay until SIGINT or SIGTERM.
pub async fn run_serve(config: OctorelayConfig) -> Result<(), RelayError> {
    init_tracing(&config.relay.log_level);

    info!("starting octorelay serve");

    let db = Database::from_config(&config.storage).await?;
    info!(path = %config.storage.database_path, "database ready");

    let broker: Arc<dyn Broker> = match config.queue.backend {
        QueueBackend::Sqlite => Arc::new(SqliteBroker::from_config(db.clone(), &config.queue)),
        QueueBackend::Memory => {
            warn!("using the in-memory broker, queued work is lost on restart");
            Arc::new(MemoryBroker::with_delivery_timeout(
                config.queue.max_attempts,
                Duration::from_secs(config.queue.delivery_timeout_secs),
            ))
        }
    };
    let store: Arc<dyn RelayStore> = Arc::new(SqliteStore::new(db.clone()));
    let telegram = TelegramChat::new(&config.telegram)?;
    let chat: Arc<dyn ChatApi> = Arc::new(telegram.clone());
    let queue = QueueClient::new(
        broker.clone(),
        Duration::from_millis(config.queue.poll_interval_ms),
    );
    let ctx = RelayContext::new(
        store.clone(),
        chat,
        queue.clone(),
        RelaySettings::from_config(&config),
    );

    let cancel = shutdown::install_signal_handler();

    let mut dispatcher = Dispatcher::new(queue.clone(), cancel.child_token());
    dispatcher.register_all(registrations(&ctx, &config));
    dispatcher.start();

    let poller = if config.telegram.polling {
        Some(spawn_polling(
            telegram.bot().clone(),
            queue.clone(),
            cancel.child_token(),
        ))
    } else {
        info!("telegram polling disabled");
        None
    };

    let collector = if config.gc.enabled {
        let gc = GarbageCollector::new(
            store,
            broker,
            config.gc.clone(),
            config.queue.claim_ttl_secs,
        );
        Some(gc.spawn(cancel.child_token()))
    } else {
        info!("garbage collector disabled");
        None
    };

    let listener = match ingress::spawn(&config.ingress, queue, cancel.child_token()).await {
        Ok(listener) => listener,
        Err(e) => {
            cancel.cancel();
            dispatcher.shutdown().await;
            return Err(e);
        }
    };

    cancel.cancelled().await;
    info!("shutting down");

    let tasks = [
        ("webhook listener", Some(listener)),
        ("telegram poller", poller),
        ("garbage collector", collector),
    ];
    for (name, task) in tasks {
        if let Some(task) = task
            && let Err(e) = task.await
        {
            warn!(task = name, error = %e, "task ended abnormally");
        }
    }
    dispatcher.shutdown().await;
    drop(ctx);
    db.close().await?;

    info!("octorelay serve shutdown complete");
    Ok(())
}

const LOG_TARGETS: &[&str] = &[
    "octorelay",
    "octorelay_config",
    "octorelay_pipeline",
    "octorelay_queue",
    "octorelay_storage",
    "octorelay_telegram",
];

/// Initializes the tracing subscriber. `RUST_LOG` overrides `log_level`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directives: Vec<String> = LOG_TARGETS
            .iter()
            .map(|target| format!("{target}={log_level}"))
            .chain(std::iter::once("warn".to_string()))
            .collect();
        EnvFilter::new(directives.join(","))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

