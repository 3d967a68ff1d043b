// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Relaio relay components.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a conversation thread.
///
/// Immutable once assigned; generated as a UUID v4 at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub String);

impl ThreadId {
    /// Generate a fresh thread id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a stored message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which channel a message originated from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Visitor,
    Admin,
    Bridge,
}

/// Payload kind of a message.
///
/// Only `Text` payloads pass through the crypto codec; the other kinds
/// store a plain file locator plus an optional caption.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Image,
    Audio,
    File,
}

/// A conversation thread spanning visitor, admin, and bridge participants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: ThreadId,
    pub display_name: String,
    pub created_at: String,
    pub last_activity_at: String,
}

/// A stored message with its text payload already decrypted for display.
///
/// This is the shape handed to live subscribers and REST clients; the
/// encrypted-at-rest representation never leaves the storage crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageView {
    pub id: MessageId,
    pub thread_id: ThreadId,
    pub origin: Origin,
    pub kind: MessageKind,
    pub text: String,
    pub file_locator: String,
    pub created_at: String,
}

/// An inbound update mapped from the external bot channel.
#[derive(Debug, Clone)]
pub struct ExternalUpdate {
    /// External chat identity the update arrived from.
    pub chat_id: String,
    /// The external message id, unique within the chat.
    pub message_id: i64,
    /// Set when the sender replied to a previously bridged message.
    pub reply_to_message_id: Option<i64>,
    pub kind: MessageKind,
    /// Message text, or the caption for media kinds.
    pub text: String,
    /// Storage locator for media kinds; empty for text.
    pub file_locator: String,
}

/// Reference to a message on the external bot channel, recorded as a
/// bridge link so future replies can be resolved back to a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeMessageRef {
    pub chat_id: String,
    pub message_id: i64,
}

/// Outcome of relaying one inbound external update.
#[derive(Debug, Clone)]
pub enum RelayOutcome {
    /// The message was persisted and fanned out.
    Delivered(MessageView),
    /// A redelivery of an already-processed external message; absorbed
    /// with no side effects beyond a log entry.
    Duplicate,
}

impl RelayOutcome {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, RelayOutcome::Duplicate)
    }
}

/// Events fanned out to live subscribers.
///
/// Serialized as `{"event": "...", "data": {...}}` envelopes on the
/// WebSocket wire; the event vocabulary matches what the admin panel and
/// visitor widget listen for.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum FanoutEvent {
    /// A visitor message, delivered to the admin broadcast room.
    MessageFromVisitor { message: MessageView },
    /// An admin message, delivered to the thread room (and echoed to the
    /// other admins).
    MessageFromAdmin { message: MessageView },
    /// A bridged Telegram message, delivered to the admin room and the
    /// thread room.
    MessageFromBridge { message: MessageView },
    /// Preview notification for the admin panel's thread list.
    NewMessageNotification {
        thread_id: ThreadId,
        display_name: String,
        message_preview: String,
        timestamp: String,
    },
    /// A per-message failure reported back to the originating sender.
    MessageError { kind: String, message: String },
    /// Heartbeat signal surfaced to the admin room.
    VisitorOnline { thread_id: ThreadId },
    /// Outbound bridge delivery exhausted its retries; the message itself
    /// stays persisted and visible.
    BridgeDeliveryFailed { thread_id: ThreadId, reason: String },
    /// Session join acknowledgement carrying the assigned thread id.
    Joined { thread_id: ThreadId },
    /// A rejoin referenced a thread that no longer exists.
    RejoinFailed { thread_id: ThreadId, message: String },
}

impl FanoutEvent {
    /// The wire name of this event (the serde tag).
    pub fn name(&self) -> &'static str {
        match self {
            FanoutEvent::MessageFromVisitor { .. } => "message_from_visitor",
            FanoutEvent::MessageFromAdmin { .. } => "message_from_admin",
            FanoutEvent::MessageFromBridge { .. } => "message_from_bridge",
            FanoutEvent::NewMessageNotification { .. } => "new_message_notification",
            FanoutEvent::MessageError { .. } => "message_error",
            FanoutEvent::VisitorOnline { .. } => "visitor_online",
            FanoutEvent::BridgeDeliveryFailed { .. } => "bridge_delivery_failed",
            FanoutEvent::Joined { .. } => "joined",
            FanoutEvent::RejoinFailed { .. } => "rejoin_failed",
        }
    }
}
