// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! At-rest encryption for text message payloads.
//!
//! The storage key is derived once at process start from the configured
//! shared secret ([`kdf::derive_key`]) and wrapped in a [`codec::MessageCodec`]
//! that turns plaintext into self-contained ciphertext tokens. Non-text
//! payloads (image/audio/file locators) never pass through this crate.

pub mod codec;
pub mod kdf;

pub use codec::MessageCodec;
pub use kdf::derive_key;

use relaio_config::model::CryptoConfig;
use relaio_core::RelaioError;

/// Build the message codec from the crypto config section.
///
/// Executed once during startup wiring; the derived key lives for the
/// process lifetime.
pub fn codec_from_config(config: &CryptoConfig) -> Result<MessageCodec, RelaioError> {
    let key = kdf::derive_key(
        config.secret.as_bytes(),
        config.kdf_memory_cost,
        config.kdf_iterations,
        config.kdf_parallelism,
    )?;
    Ok(MessageCodec::new(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> CryptoConfig {
        CryptoConfig {
            secret: "a-test-secret-of-decent-length".into(),
            // Low cost keeps tests fast.
            kdf_memory_cost: 8192,
            kdf_iterations: 1,
            kdf_parallelism: 1,
        }
    }

    #[test]
    fn codec_from_config_round_trips() {
        let codec = codec_from_config(&test_config()).unwrap();
        let token = codec.encrypt("merhaba").unwrap();
        assert_eq!(codec.decrypt(&token).unwrap(), "merhaba");
    }

    #[test]
    fn same_secret_decrypts_across_instances() {
        // Salt derivation is deterministic, so a restart with the same
        // secret must still open previously stored ciphertext.
        let first = codec_from_config(&test_config()).unwrap();
        let second = codec_from_config(&test_config()).unwrap();

        let token = first.encrypt("persisted across restarts").unwrap();
        assert_eq!(second.decrypt(&token).unwrap(), "persisted across restarts");
    }

    #[test]
    fn different_secret_fails_to_decrypt() {
        let first = codec_from_config(&test_config()).unwrap();
        let mut other = test_config();
        other.secret = "a-completely-different-secret".into();
        let second = codec_from_config(&other).unwrap();

        let token = first.encrypt("locked").unwrap();
        assert!(second.decrypt(&token).is_err());
    }
}
