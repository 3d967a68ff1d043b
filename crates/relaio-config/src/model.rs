// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Relaio message relay.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Relaio configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RelaioConfig {
    /// Gateway HTTP/WebSocket server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// SQLite persistence settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// At-rest encryption settings.
    #[serde(default)]
    pub crypto: CryptoConfig,

    /// Telegram bridge settings. Leaving `bot_token` unset disables
    /// bridging; the rest of the relay keeps running.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Read-cache bounds.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Relay pipeline settings (logging, delivery retries).
    #[serde(default)]
    pub relay: RelayConfig,
}

/// Gateway HTTP/WebSocket server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Static bearer token guarding admin surfaces (thread listing,
    /// history, purge, admin socket join). `None` leaves them open, for
    /// development only.
    #[serde(default)]
    pub admin_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            admin_token: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

/// SQLite persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Fixed UTC offset, in hours, applied to stored timestamps.
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i8,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            utc_offset_hours: default_utc_offset_hours(),
        }
    }
}

fn default_database_path() -> String {
    "data/relaio.db".to_string()
}

fn default_utc_offset_hours() -> i8 {
    3
}

/// At-rest encryption configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CryptoConfig {
    /// Shared secret the storage key is derived from. The derivation is
    /// deterministic, so changing the secret invalidates all previously
    /// stored ciphertext.
    #[serde(default = "default_secret")]
    pub secret: String,

    /// Argon2id memory cost in KiB.
    #[serde(default = "default_kdf_memory_cost")]
    pub kdf_memory_cost: u32,

    /// Argon2id iteration count.
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Argon2id lane count.
    #[serde(default = "default_kdf_parallelism")]
    pub kdf_parallelism: u32,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            secret: default_secret(),
            kdf_memory_cost: default_kdf_memory_cost(),
            kdf_iterations: default_kdf_iterations(),
            kdf_parallelism: default_kdf_parallelism(),
        }
    }
}

fn default_secret() -> String {
    "change-this-development-secret".to_string()
}

fn default_kdf_memory_cost() -> u32 {
    65536
}

fn default_kdf_iterations() -> u32 {
    3
}

fn default_kdf_parallelism() -> u32 {
    1
}

/// Telegram bridge configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. `None` disables the bridge.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Chat the bot forwards visitor messages to (the admin's chat).
    #[serde(default)]
    pub admin_chat_id: Option<String>,

    /// Seconds to wait before reconnecting after a polling failure.
    #[serde(default = "default_reconnect_secs")]
    pub reconnect_secs: u64,
}

fn default_reconnect_secs() -> u64 {
    30
}

/// Read-cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Maximum number of cached pages across all threads.
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// Entry time-to-live in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_cache_capacity() -> usize {
    1000
}

fn default_cache_ttl_secs() -> u64 {
    300
}

/// Relay pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Maximum delivery attempts per bridged message.
    #[serde(default = "default_max_attempts")]
    pub delivery_max_attempts: u32,

    /// Base backoff delay in milliseconds (doubled per attempt).
    #[serde(default = "default_base_delay_ms")]
    pub delivery_base_delay_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            delivery_max_attempts: default_max_attempts(),
            delivery_base_delay_ms: default_base_delay_ms(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    750
}
