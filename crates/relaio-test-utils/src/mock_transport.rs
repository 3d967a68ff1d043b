// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock bot transport with scripted failures and captured sends.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use relaio_core::RelaioError;
use relaio_core::traits::BotTransport;
use relaio_core::types::BridgeMessageRef;

/// A message captured by [`MockTransport::send_text`].
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub chat_id: String,
    pub text: String,
}

/// A mock [`BotTransport`] for deterministic testing.
///
/// Failures are scripted up front with [`MockTransport::queue_failure`];
/// each send consumes one scripted failure before succeeding. Successful
/// sends are captured and assigned increasing external message ids.
#[derive(Default)]
pub struct MockTransport {
    failures: Mutex<VecDeque<Option<Duration>>>,
    sent: Mutex<Vec<SentMessage>>,
    next_id: AtomicI64,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script one failing attempt, optionally carrying a server-mandated
    /// retry-after duration.
    pub async fn queue_failure(&self, retry_after: Option<Duration>) {
        self.failures.lock().await.push_back(retry_after);
    }

    /// Script `n` plain failures.
    pub async fn queue_failures(&self, n: usize) {
        for _ in 0..n {
            self.queue_failure(None).await;
        }
    }

    /// All successfully sent messages, in order.
    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl BotTransport for MockTransport {
    async fn send_text(
        &self,
        chat_id: &str,
        text: &str,
    ) -> Result<BridgeMessageRef, RelaioError> {
        if let Some(retry_after) = self.failures.lock().await.pop_front() {
            return Err(RelaioError::Transport {
                message: "injected transport failure".to_string(),
                retry_after,
            });
        }

        let message_id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.sent.lock().await.push(SentMessage {
            chat_id: chat_id.to_string(),
            text: text.to_string(),
        });
        Ok(BridgeMessageRef {
            chat_id: chat_id.to_string(),
            message_id,
        })
    }
}
