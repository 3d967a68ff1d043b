// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes. Collects all violations rather than failing fast.

use crate::diagnostic::ConfigError;
use crate::model::RelaioConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// A missing Telegram section is valid (the bridge is simply disabled);
/// a bot token WITHOUT an admin chat id is not, because visitor messages
/// would have nowhere to go.
pub fn validate_config(config: &RelaioConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.server.host.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    }

    if config.server.port == 0 {
        errors.push(ConfigError::Validation {
            message: "server.port must not be 0".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if !(-12..=14).contains(&config.storage.utc_offset_hours) {
        errors.push(ConfigError::Validation {
            message: format!(
                "storage.utc_offset_hours must be within -12..=14, got {}",
                config.storage.utc_offset_hours
            ),
        });
    }

    if config.crypto.secret.len() < 16 {
        errors.push(ConfigError::Validation {
            message: "crypto.secret must be at least 16 characters".to_string(),
        });
    }

    if config.crypto.kdf_memory_cost < 8192 {
        errors.push(ConfigError::Validation {
            message: format!(
                "crypto.kdf_memory_cost must be at least 8192 KiB, got {}",
                config.crypto.kdf_memory_cost
            ),
        });
    }

    if config.crypto.kdf_iterations < 1 {
        errors.push(ConfigError::Validation {
            message: "crypto.kdf_iterations must be at least 1".to_string(),
        });
    }

    if config.crypto.kdf_parallelism < 1 {
        errors.push(ConfigError::Validation {
            message: "crypto.kdf_parallelism must be at least 1".to_string(),
        });
    }

    if let Some(token) = &config.telegram.bot_token {
        if token.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: "telegram.bot_token must not be empty when set".to_string(),
            });
        }
        if config.telegram.admin_chat_id.is_none() {
            errors.push(ConfigError::Validation {
                message: "telegram.admin_chat_id is required when telegram.bot_token is set"
                    .to_string(),
            });
        }
    }

    if config.cache.capacity == 0 {
        errors.push(ConfigError::Validation {
            message: "cache.capacity must be at least 1".to_string(),
        });
    }

    if config.relay.delivery_max_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "relay.delivery_max_attempts must be at least 1".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
