// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Room registry: the concrete [`LivePublisher`].
//!
//! Rooms are named by thread id, plus the fixed admin broadcast room.
//! Each subscriber is an mpsc sender feeding one WebSocket connection;
//! senders that went away are dropped during emission.

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;

use relaio_core::traits::publisher::{ADMIN_ROOM, LivePublisher};
use relaio_core::types::{FanoutEvent, ThreadId};

/// Maps room name → subscriber id → outbound sender.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: DashMap<String, DashMap<String, mpsc::Sender<String>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a connection to a room.
    pub fn join(&self, room: &str, subscriber_id: &str, tx: mpsc::Sender<String>) {
        self.rooms
            .entry(room.to_string())
            .or_default()
            .insert(subscriber_id.to_string(), tx);
        debug!(room, subscriber_id, "subscriber joined room");
    }

    /// Remove a connection from one room.
    pub fn leave(&self, room: &str, subscriber_id: &str) {
        if let Some(subscribers) = self.rooms.get(room) {
            subscribers.remove(subscriber_id);
        }
    }

    /// Remove a connection from every room (socket closed).
    pub fn leave_all(&self, subscriber_id: &str) {
        for room in self.rooms.iter() {
            room.value().remove(subscriber_id);
        }
    }

    /// Subscriber count for a room.
    pub fn room_size(&self, room: &str) -> usize {
        self.rooms.get(room).map(|r| r.len()).unwrap_or(0)
    }

    async fn emit(&self, room: &str, event: &FanoutEvent, exclude: Option<&str>) {
        let Ok(payload) = serde_json::to_string(event) else {
            debug!(event = event.name(), "failed to serialize fanout event");
            return;
        };

        let Some(subscribers) = self.rooms.get(room) else {
            return;
        };

        let targets: Vec<(String, mpsc::Sender<String>)> = subscribers
            .iter()
            .filter(|entry| exclude != Some(entry.key().as_str()))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        drop(subscribers);

        let mut dead = Vec::new();
        for (id, tx) in targets {
            if tx.send(payload.clone()).await.is_err() {
                dead.push(id);
            }
        }

        if !dead.is_empty()
            && let Some(subscribers) = self.rooms.get(room)
        {
            for id in dead {
                subscribers.remove(&id);
                debug!(room, subscriber_id = %id, "dropped dead subscriber");
            }
        }
    }
}

#[async_trait]
impl LivePublisher for RoomRegistry {
    async fn emit_to_thread(&self, thread_id: &ThreadId, event: &FanoutEvent) {
        self.emit(thread_id.as_str(), event, None).await;
    }

    async fn emit_to_admins(&self, event: &FanoutEvent, exclude: Option<&str>) {
        self.emit(ADMIN_ROOM, event, exclude).await;
    }
}
