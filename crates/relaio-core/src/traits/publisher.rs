// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live-channel fan-out port.

use async_trait::async_trait;

use crate::types::{FanoutEvent, ThreadId};

/// Room name every connected admin socket joins.
pub const ADMIN_ROOM: &str = "admin";

/// Fan-out sink for live subscribers.
///
/// Emission is best-effort: subscribers that disconnected mid-flight are
/// dropped by the implementation, never surfaced to the relay pipeline.
#[async_trait]
pub trait LivePublisher: Send + Sync {
    /// Deliver an event to every subscriber of one thread's room.
    async fn emit_to_thread(&self, thread_id: &ThreadId, event: &FanoutEvent);

    /// Deliver an event to the admin broadcast room, optionally excluding
    /// one subscriber (the admin whose own message is being echoed).
    async fn emit_to_admins(&self, event: &FanoutEvent, exclude: Option<&str>);
}
