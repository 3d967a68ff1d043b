// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./relaio.toml` > `~/.config/relaio/relaio.toml`
//! > `/etc/relaio/relaio.toml` with environment variable overrides via the
//! `RELAIO_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::RelaioConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/relaio/relaio.toml` (system-wide)
/// 3. `~/.config/relaio/relaio.toml` (user XDG config)
/// 4. `./relaio.toml` (local directory)
/// 5. `RELAIO_*` environment variables
pub fn load_config() -> Result<RelaioConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RelaioConfig::default()))
        .merge(Toml::file("/etc/relaio/relaio.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("relaio/relaio.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("relaio.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<RelaioConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RelaioConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<RelaioConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RelaioConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `RELAIO_TELEGRAM_BOT_TOKEN` must map to
/// `telegram.bot_token`, not `telegram.bot.token`.
fn env_provider() -> Env {
    Env::prefixed("RELAIO_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("crypto_", "crypto.", 1)
            .replacen("telegram_", "telegram.", 1)
            .replacen("cache_", "cache.", 1)
            .replacen("relay_", "relay.", 1);
        mapped.into()
    })
}
