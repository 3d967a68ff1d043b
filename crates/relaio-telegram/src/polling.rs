// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-polling worker for the Telegram bridge.
//!
//! Runs on its own task so a Telegram connectivity failure can never
//! block live-channel handling. Mapped updates flow to the orchestrator
//! over an mpsc channel; the worker itself never touches storage or the
//! live channel. On dispatcher exit the worker waits a fixed reconnect
//! interval and rebuilds the dispatcher, until the cancellation token
//! fires.

use std::time::Duration;

use teloxide::prelude::*;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use relaio_core::types::ExternalUpdate;

use crate::update;

/// Spawn the polling worker.
///
/// Shutdown is purely cancellation-driven: cancel the token and the
/// worker winds down at the next loop boundary.
pub fn spawn_polling(
    bot: Bot,
    updates_tx: mpsc::Sender<ExternalUpdate>,
    reconnect: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if cancel.is_cancelled() {
                break;
            }

            info!("starting telegram long polling");
            let tx = updates_tx.clone();
            let handler = Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
                let tx = tx.clone();
                async move {
                    match update::map_message(&bot, &msg).await {
                        Ok(Some(mapped)) => {
                            if tx.send(mapped).await.is_err() {
                                warn!("ingestion channel closed, dropping update");
                            }
                        }
                        Ok(None) => {
                            debug!(msg_id = msg.id.0, "unsupported update skipped");
                        }
                        Err(e) => {
                            error!(error = %e, "failed to map telegram update");
                        }
                    }
                    respond(())
                }
            });

            let mut dispatcher = Dispatcher::builder(bot.clone(), handler)
                .default_handler(|_| async {}) // Silently ignore non-message updates.
                .build();

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("telegram polling cancelled");
                    break;
                }
                _ = dispatcher.dispatch() => {
                    warn!(
                        reconnect_secs = reconnect.as_secs(),
                        "telegram polling stopped, reconnecting"
                    );
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(reconnect) => {}
            }
        }
        info!("telegram polling worker stopped");
    })
}
