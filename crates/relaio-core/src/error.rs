// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Relaio message relay.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across all Relaio components.
///
/// A redelivered Telegram update is deliberately NOT represented here: the
/// orchestrator absorbs duplicates as [`crate::types::RelayOutcome::Duplicate`]
/// after logging, so callers never see them as failures.
#[derive(Debug, Error)]
pub enum RelaioError {
    /// Configuration errors (invalid TOML, out-of-range values). Fatal at
    /// startup for the features that depend on the offending section.
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed or missing fields on an inbound event, rejected at the
    /// boundary before thread resolution.
    #[error("validation error: {0}")]
    Validation(String),

    /// The sender exceeded its sliding-window budget for this operation
    /// class. Reported to the sender only.
    #[error("rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// An admin or visitor message referenced a thread id that does not
    /// exist. Never silently creates a thread.
    #[error("thread not found: {0}")]
    ThreadNotFound(String),

    /// Stored ciphertext could not be opened (corrupted data or a key
    /// mismatch). Read paths substitute a redacted placeholder instead of
    /// failing the whole page.
    #[error("decryption failed: {0}")]
    Decrypt(String),

    /// Key derivation or encryption failure.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Persistence failure. Fatal for the single message being relayed;
    /// the process keeps serving other events.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A single send attempt against the bridge transport failed.
    /// `retry_after` carries a server-mandated wait when the API provided
    /// one (e.g. Telegram flood control).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        retry_after: Option<Duration>,
    },

    /// All retry attempts against the bridge transport were exhausted.
    /// Non-fatal: the locally persisted message stays visible.
    #[error("delivery failed after {attempts} attempts: {last}")]
    Delivery { attempts: u32, last: String },

    /// Live-channel plumbing errors (socket accept, bind, closed channels).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelaioError {
    /// Shorthand for wrapping an arbitrary error as a storage failure.
    pub fn storage<E: std::error::Error + Send + Sync + 'static>(source: E) -> Self {
        Self::Storage {
            source: Box::new(source),
        }
    }
}
