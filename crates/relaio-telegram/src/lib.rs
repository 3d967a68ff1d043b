// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram bridge for the Relaio message relay.
//!
//! Implements the [`BotTransport`] port over the Telegram Bot API via
//! teloxide, and runs the long-polling worker that maps inbound updates
//! into channel-agnostic [`ExternalUpdate`]s for the orchestrator.

pub mod polling;
pub mod update;

use std::time::Duration;

use async_trait::async_trait;
use teloxide::RequestError;
use teloxide::prelude::*;
use teloxide::types::{ChatId, Recipient};

use relaio_config::model::TelegramConfig;
use relaio_core::RelaioError;
use relaio_core::traits::BotTransport;
use relaio_core::types::BridgeMessageRef;

/// Telegram connection handle: validates credentials once and hands out
/// the transport and polling worker.
pub struct TelegramBridge {
    bot: Bot,
    config: TelegramConfig,
}

impl TelegramBridge {
    /// Requires `config.bot_token` to be set and non-empty.
    pub fn new(config: TelegramConfig) -> Result<Self, RelaioError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            RelaioError::Config("telegram.bot_token is required for the bridge".into())
        })?;
        if token.is_empty() {
            return Err(RelaioError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let bot = Bot::new(token);
        Ok(Self { bot, config })
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    pub fn config(&self) -> &TelegramConfig {
        &self.config
    }

    /// The single-attempt send transport handed to the delivery engine.
    pub fn transport(&self) -> TelegramTransport {
        TelegramTransport {
            bot: self.bot.clone(),
        }
    }
}

/// [`BotTransport`] implementation over teloxide's `sendMessage`.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

#[async_trait]
impl BotTransport for TelegramTransport {
    async fn send_text(
        &self,
        chat_id: &str,
        text: &str,
    ) -> Result<BridgeMessageRef, RelaioError> {
        let chat = chat_id
            .parse::<i64>()
            .map(ChatId)
            .map_err(|e| RelaioError::Transport {
                message: format!("invalid chat_id `{chat_id}`: {e}"),
                retry_after: None,
            })?;

        match self.bot.send_message(Recipient::Id(chat), text).await {
            Ok(sent) => Ok(BridgeMessageRef {
                chat_id: sent.chat.id.0.to_string(),
                message_id: i64::from(sent.id.0),
            }),
            Err(err) => {
                // Telegram flood control mandates an exact wait; surface it
                // so the delivery engine honors it instead of backing off.
                let retry_after = match &err {
                    RequestError::RetryAfter(secs) => {
                        Some(Duration::from_secs(u64::from(secs.seconds())))
                    }
                    _ => None,
                };
                Err(RelaioError::Transport {
                    message: format!("telegram send failed: {err}"),
                    retry_after,
                })
            }
        }
    }
}
