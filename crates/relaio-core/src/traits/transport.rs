// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound transport port for the external bot channel.

use async_trait::async_trait;

use crate::error::RelaioError;
use crate::types::BridgeMessageRef;

/// A single-attempt sender against the external bot API.
///
/// Implementations perform exactly one send per call; retry and backoff
/// live in the delivery engine, which interprets
/// [`RelaioError::Transport`]'s `retry_after` field when the API mandates
/// a wait.
#[async_trait]
pub trait BotTransport: Send + Sync {
    /// Send a plain text message to the given external chat.
    ///
    /// On success returns the reference under which the message is known
    /// on the external channel, so a bridge link can be recorded.
    async fn send_text(&self, chat_id: &str, text: &str)
    -> Result<BridgeMessageRef, RelaioError>;
}
