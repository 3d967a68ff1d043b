// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound delivery engine for the bridge channel.
//!
//! Delivery never blocks the relay pipeline: [`spawn_delivery`] runs
//! [`DeliveryEngine::send_with_retry`] as a background task and pushes a
//! [`DeliveryReport`] into an mpsc channel. A notifier task
//! ([`spawn_report_notifier`]) owns the publisher handle and turns failed
//! reports into thread-scoped `bridge_delivery_failed` events -- no
//! completion callbacks closing over live-channel state.
//!
//! Local persistence is authoritative: a delivery failure is surfaced as a
//! notification and nothing is rolled back or re-persisted.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use relaio_core::traits::{BotTransport, LivePublisher};
use relaio_core::types::{BridgeMessageRef, FanoutEvent, ThreadId};
use relaio_core::RelaioError;
use relaio_storage::Store;

/// Retries sends against the bridge transport with exponential backoff.
pub struct DeliveryEngine {
    transport: Arc<dyn BotTransport>,
    store: Store,
    base_delay: Duration,
    max_attempts: u32,
}

impl DeliveryEngine {
    pub fn new(
        transport: Arc<dyn BotTransport>,
        store: Store,
        base_delay: Duration,
        max_attempts: u32,
    ) -> Self {
        Self {
            transport,
            store,
            base_delay,
            max_attempts,
        }
    }

    /// Attempt a send, retrying on failure.
    ///
    /// A server-mandated `retry_after` is honored exactly; otherwise the
    /// wait is `base · 2^attempt` plus 0.2-0.8 s of jitter. On success
    /// with a thread id, a bridge link is recorded so future replies
    /// resolve back to the thread; a link-insert failure only logs.
    pub async fn send_with_retry(
        &self,
        chat_id: &str,
        text: &str,
        thread_id: Option<&ThreadId>,
    ) -> Result<BridgeMessageRef, RelaioError> {
        let mut last_err: Option<RelaioError> = None;

        for attempt in 0..self.max_attempts {
            match self.transport.send_text(chat_id, text).await {
                Ok(msg_ref) => {
                    if let Some(tid) = thread_id
                        && let Err(e) = self
                            .store
                            .insert_bridge_link(tid, &msg_ref.chat_id, msg_ref.message_id)
                            .await
                    {
                        warn!(error = %e, thread_id = %tid, "bridge link insert failed");
                    }
                    info!(
                        chat_id = %msg_ref.chat_id,
                        message_id = msg_ref.message_id,
                        attempt = attempt + 1,
                        "bridge send succeeded"
                    );
                    return Ok(msg_ref);
                }
                Err(err) => {
                    let wait = match &err {
                        RelaioError::Transport {
                            retry_after: Some(mandated),
                            ..
                        } => *mandated,
                        _ => backoff_delay(self.base_delay, attempt),
                    };
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        wait_ms = wait.as_millis() as u64,
                        error = %err,
                        "bridge send attempt failed"
                    );
                    last_err = Some(err);
                    if attempt + 1 < self.max_attempts {
                        tokio::time::sleep(wait).await;
                    }
                }
            }
        }

        Err(RelaioError::Delivery {
            attempts: self.max_attempts,
            last: last_err
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown transport error".to_string()),
        })
    }

}

/// `base · 2^attempt` plus 0.2-0.8 s of random jitter.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let jitter = rand::thread_rng().gen_range(0.2..0.8);
    base * 2u32.pow(attempt) + Duration::from_secs_f64(jitter)
}

/// Outcome of one background delivery, observed asynchronously.
#[derive(Debug)]
pub struct DeliveryReport {
    pub thread_id: Option<ThreadId>,
    pub result: Result<BridgeMessageRef, RelaioError>,
}

/// Dispatch a delivery without blocking the caller.
pub fn spawn_delivery(
    engine: Arc<DeliveryEngine>,
    report_tx: mpsc::Sender<DeliveryReport>,
    chat_id: String,
    text: String,
    thread_id: Option<ThreadId>,
) {
    tokio::spawn(async move {
        let result = engine
            .send_with_retry(&chat_id, &text, thread_id.as_ref())
            .await;
        if report_tx
            .send(DeliveryReport { thread_id, result })
            .await
            .is_err()
        {
            debug!("delivery report channel closed, dropping report");
        }
    });
}

/// Consume delivery reports, logging successes and notifying the affected
/// thread's subscribers on failure.
pub fn spawn_report_notifier(
    mut report_rx: mpsc::Receiver<DeliveryReport>,
    publisher: Arc<dyn LivePublisher>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(report) = report_rx.recv().await {
            match report.result {
                Ok(msg_ref) => {
                    debug!(
                        chat_id = %msg_ref.chat_id,
                        message_id = msg_ref.message_id,
                        "delivery report: success"
                    );
                }
                Err(err) => {
                    error!(error = %err, "bridge delivery abandoned");
                    if let Some(thread_id) = report.thread_id {
                        let event = FanoutEvent::BridgeDeliveryFailed {
                            thread_id: thread_id.clone(),
                            reason: err.to_string(),
                        };
                        publisher.emit_to_thread(&thread_id, &event).await;
                    }
                }
            }
        }
    })
}
