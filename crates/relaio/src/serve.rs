// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `relaio serve` command implementation.
//!
//! Constructs every service once (store, codec, cache, limiter, rooms,
//! orchestrator), wires the Telegram bridge when credentials are present,
//! starts the gateway, and waits for ctrl-c. Shutdown is signalled to the
//! polling worker and ingestion loop through a cancellation token;
//! in-flight delivery retries are best-effort.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use relaio_cache::MessageCache;
use relaio_config::RelaioConfig;
use relaio_core::RelaioError;
use relaio_gateway::{GatewayState, RoomRegistry, auth::AuthConfig, start_server};
use relaio_limiter::RateLimiter;
use relaio_relay::{BridgeHandle, DeliveryEngine, Relay, spawn_report_notifier};
use relaio_storage::Store;
use relaio_telegram::{TelegramBridge, polling::spawn_polling};

/// Run the relay server until ctrl-c.
pub async fn run_serve(config: RelaioConfig) -> Result<(), RelaioError> {
    init_tracing(&config.relay.log_level);
    info!("starting relaio serve");

    let store = Store::open(&config.storage).await?;
    // The storage key is derived exactly once per process.
    let codec = Arc::new(relaio_crypto::codec_from_config(&config.crypto)?);
    let cache = Arc::new(MessageCache::new(
        config.cache.capacity,
        Duration::from_secs(config.cache.ttl_secs),
    ));
    let limiter = Arc::new(RateLimiter::new());
    let rooms = Arc::new(RoomRegistry::new());
    let cancel = CancellationToken::new();

    let mut relay = Relay::new(
        store.clone(),
        codec,
        cache,
        limiter,
        rooms.clone(),
    );

    // Telegram is optional: without credentials the relay runs web-only.
    let mut updates_rx = None;
    if config.telegram.bot_token.is_some() {
        let bridge = TelegramBridge::new(config.telegram.clone())?;
        let admin_chat_id = config.telegram.admin_chat_id.clone().ok_or_else(|| {
            RelaioError::Config("telegram.admin_chat_id is required for the bridge".into())
        })?;

        let engine = Arc::new(DeliveryEngine::new(
            Arc::new(bridge.transport()),
            store.clone(),
            Duration::from_millis(config.relay.delivery_base_delay_ms),
            config.relay.delivery_max_attempts,
        ));
        let (report_tx, report_rx) = mpsc::channel(64);
        spawn_report_notifier(report_rx, rooms.clone());

        relay = relay.with_bridge(BridgeHandle {
            engine,
            admin_chat_id,
            report_tx,
        });

        let (tx, rx) = mpsc::channel(128);
        spawn_polling(
            bridge.bot().clone(),
            tx,
            Duration::from_secs(config.telegram.reconnect_secs),
            cancel.child_token(),
        );
        updates_rx = Some(rx);
        info!("telegram bridge enabled");
    } else {
        info!("telegram bridge disabled (no bot token)");
    }

    let relay = Arc::new(relay);

    // Ingestion loop: external updates flow to the orchestrator over the
    // channel; a polling failure over there never blocks this path.
    if let Some(mut rx) = updates_rx.take() {
        let relay = relay.clone();
        let cancel = cancel.child_token();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    update = rx.recv() => {
                        let Some(update) = update else { break };
                        if let Err(e) = relay.on_external_update(&update).await {
                            error!(error = %e, chat_id = %update.chat_id, "external update rejected");
                        }
                    }
                }
            }
            info!("external ingestion loop stopped");
        });
    }

    let state = GatewayState {
        relay: relay.clone(),
        rooms,
        auth: AuthConfig {
            admin_token: config.server.admin_token.clone(),
        },
    };

    tokio::select! {
        result = start_server(&config.server.host, config.server.port, state) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    cancel.cancel();
    if let Err(e) = store.close().await {
        warn!(error = %e, "storage close failed during shutdown");
    }
    Ok(())
}

/// Initialize the tracing subscriber from the configured log level.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
