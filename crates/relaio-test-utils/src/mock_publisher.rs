// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock live publisher that records every fanned-out event.

use async_trait::async_trait;
use tokio::sync::Mutex;

use relaio_core::traits::publisher::{ADMIN_ROOM, LivePublisher};
use relaio_core::types::{FanoutEvent, ThreadId};

/// One recorded emission.
#[derive(Debug, Clone)]
pub struct RecordedEvent {
    /// Thread id for room emits, or [`ADMIN_ROOM`].
    pub room: String,
    /// The wire event name (serde tag).
    pub event: String,
    /// The serialized envelope.
    pub payload: serde_json::Value,
    /// Excluded subscriber for admin echoes.
    pub excluded: Option<String>,
}

/// A [`LivePublisher`] double that captures emissions for assertions.
#[derive(Default)]
pub struct MockPublisher {
    events: Mutex<Vec<RecordedEvent>>,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().await.clone()
    }

    /// Events emitted to one room, in order.
    pub async fn events_for_room(&self, room: &str) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .await
            .iter()
            .filter(|e| e.room == room)
            .cloned()
            .collect()
    }

    /// Count of events with the given wire name, across all rooms.
    pub async fn count_named(&self, event: &str) -> usize {
        self.events
            .lock()
            .await
            .iter()
            .filter(|e| e.event == event)
            .count()
    }

    pub async fn clear(&self) {
        self.events.lock().await.clear();
    }

    async fn record(&self, room: String, event: &FanoutEvent, excluded: Option<&str>) {
        let payload = serde_json::to_value(event).unwrap_or(serde_json::Value::Null);
        self.events.lock().await.push(RecordedEvent {
            room,
            event: event.name().to_string(),
            payload,
            excluded: excluded.map(|s| s.to_string()),
        });
    }
}

#[async_trait]
impl LivePublisher for MockPublisher {
    async fn emit_to_thread(&self, thread_id: &ThreadId, event: &FanoutEvent) {
        self.record(thread_id.to_string(), event, None).await;
    }

    async fn emit_to_admins(&self, event: &FanoutEvent, exclude: Option<&str>) {
        self.record(ADMIN_ROOM.to_string(), event, exclude).await;
    }
}
