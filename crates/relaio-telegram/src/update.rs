// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping from Telegram messages to channel-agnostic external updates.
//!
//! Text arrives inline; media kinds are resolved through `getFile` so the
//! stored locator is the Telegram file path. Unsupported message types
//! (stickers, locations, ...) map to `None` and are ignored upstream.

use teloxide::prelude::*;
use teloxide::types::FileMeta;
use tracing::debug;

use relaio_core::RelaioError;
use relaio_core::types::{ExternalUpdate, MessageKind};

/// Convert one Telegram message into an [`ExternalUpdate`].
///
/// Returns `Ok(None)` for message types the relay does not handle.
pub async fn map_message(bot: &Bot, msg: &Message) -> Result<Option<ExternalUpdate>, RelaioError> {
    let chat_id = msg.chat.id.0.to_string();
    let message_id = i64::from(msg.id.0);
    let reply_to_message_id = msg.reply_to_message().map(|m| i64::from(m.id.0));

    let (kind, text, file_locator) = if let Some(text) = msg.text() {
        (MessageKind::Text, text.trim().to_string(), String::new())
    } else if let Some(photos) = msg.photo() {
        // Telegram provides multiple sizes; the last one is the largest.
        let largest = photos.last().ok_or_else(|| RelaioError::Channel {
            message: "photo array is empty".into(),
            source: None,
        })?;
        let locator = file_locator(bot, &largest.file).await?;
        let caption = msg.caption().unwrap_or("").to_string();
        (MessageKind::Image, caption, locator)
    } else if let Some(audio) = msg.audio() {
        let locator = file_locator(bot, &audio.file).await?;
        let caption = msg.caption().unwrap_or("").to_string();
        (MessageKind::Audio, caption, locator)
    } else if let Some(voice) = msg.voice() {
        let locator = file_locator(bot, &voice.file).await?;
        let caption = msg.caption().unwrap_or("").to_string();
        (MessageKind::Audio, caption, locator)
    } else if let Some(doc) = msg.document() {
        let locator = file_locator(bot, &doc.file).await?;
        let caption = msg
            .caption()
            .map(|c| c.to_string())
            .or_else(|| doc.file_name.clone())
            .unwrap_or_else(|| "File".to_string());
        (MessageKind::File, caption, locator)
    } else {
        debug!(msg_id = msg.id.0, "ignoring unsupported message type");
        return Ok(None);
    };

    Ok(Some(ExternalUpdate {
        chat_id,
        message_id,
        reply_to_message_id,
        kind,
        text,
        file_locator,
    }))
}

/// Resolve a file's Telegram-side path via `getFile`.
async fn file_locator(bot: &Bot, file: &FileMeta) -> Result<String, RelaioError> {
    let resolved = bot
        .get_file(file.id.clone())
        .await
        .map_err(|e| RelaioError::Channel {
            message: format!("failed to get file info: {e}"),
            source: Some(Box::new(e)),
        })?;
    Ok(resolved.path)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a private-chat message from JSON, matching the Bot API shape.
    fn make_text_message(chat_id: i64, message_id: i32, text: &str) -> Message {
        let json = serde_json::json!({
            "message_id": message_id,
            "date": 1700000000i64,
            "chat": {
                "id": chat_id,
                "type": "private",
                "first_name": "Test",
            },
            "from": {
                "id": 999,
                "is_bot": false,
                "first_name": "Test",
            },
            "text": text,
        });
        serde_json::from_value(json).expect("failed to deserialize mock message")
    }

    fn make_reply_message(chat_id: i64, message_id: i32, reply_to: i32, text: &str) -> Message {
        let json = serde_json::json!({
            "message_id": message_id,
            "date": 1700000000i64,
            "chat": {
                "id": chat_id,
                "type": "private",
                "first_name": "Test",
            },
            "from": {
                "id": 999,
                "is_bot": false,
                "first_name": "Test",
            },
            "reply_to_message": {
                "message_id": reply_to,
                "date": 1699999999i64,
                "chat": {
                    "id": chat_id,
                    "type": "private",
                    "first_name": "Test",
                },
                "text": "the original",
            },
            "text": text,
        });
        serde_json::from_value(json).expect("failed to deserialize mock reply")
    }

    #[tokio::test]
    async fn text_message_maps_inline() {
        let bot = Bot::new("test:token");
        let msg = make_text_message(777, 5, "  hello there  ");

        let update = map_message(&bot, &msg).await.unwrap().unwrap();
        assert_eq!(update.chat_id, "777");
        assert_eq!(update.message_id, 5);
        assert_eq!(update.kind, MessageKind::Text);
        assert_eq!(update.text, "hello there");
        assert!(update.file_locator.is_empty());
        assert!(update.reply_to_message_id.is_none());
    }

    #[tokio::test]
    async fn reply_reference_is_carried() {
        let bot = Bot::new("test:token");
        let msg = make_reply_message(777, 6, 3, "replying");

        let update = map_message(&bot, &msg).await.unwrap().unwrap();
        assert_eq!(update.reply_to_message_id, Some(3));
        assert_eq!(update.message_id, 6);
    }

    #[tokio::test]
    async fn unsupported_message_maps_to_none() {
        let bot = Bot::new("test:token");
        // A service message: no text, photo, audio, voice or document.
        let json = serde_json::json!({
            "message_id": 9,
            "date": 1700000000i64,
            "chat": {
                "id": 777,
                "type": "private",
                "first_name": "Test",
            },
            "new_chat_title": "renamed",
        });
        let msg: Message = serde_json::from_value(json).unwrap();

        let update = map_message(&bot, &msg).await.unwrap();
        assert!(update.is_none());
    }
}
