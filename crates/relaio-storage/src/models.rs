// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for the relay schema.

use relaio_core::types::{MessageId, MessageKind, Origin, ThreadId};

/// A message row as stored: `content` holds the ciphertext token for text
/// kinds, or the plaintext caption for media kinds.
#[derive(Debug, Clone)]
pub struct MessageRecord {
    pub id: MessageId,
    pub thread_id: ThreadId,
    pub origin: Origin,
    pub kind: MessageKind,
    pub content: String,
    pub file_locator: String,
    pub created_at: String,
}

/// A thread joined with its most recent message, for the admin panel's
/// thread list. `last_message` is still ciphertext for text kinds.
#[derive(Debug, Clone)]
pub struct ThreadSummary {
    pub id: ThreadId,
    pub display_name: String,
    pub created_at: String,
    pub last_activity_at: String,
    pub last_message: Option<String>,
    pub last_message_kind: Option<MessageKind>,
    pub last_message_time: Option<String>,
}
