// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tempdir-backed store and codec fixtures.

use std::sync::Arc;

use relaio_config::model::{CryptoConfig, StorageConfig};
use relaio_crypto::MessageCodec;
use relaio_storage::Store;

/// Crypto config with fast KDF parameters for tests.
pub fn test_crypto_config() -> CryptoConfig {
    CryptoConfig {
        secret: "relaio-test-secret-0123456789".to_string(),
        kdf_memory_cost: 8192,
        kdf_iterations: 1,
        kdf_parallelism: 1,
    }
}

/// A codec derived from the fast test config.
pub fn test_codec() -> Arc<MessageCodec> {
    Arc::new(
        relaio_crypto::codec_from_config(&test_crypto_config())
            .expect("test crypto config is valid"),
    )
}

/// A migrated store in a fresh tempdir. Keep the `TempDir` alive for the
/// duration of the test.
pub async fn test_store() -> (Store, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = StorageConfig {
        database_path: dir
            .path()
            .join("relaio-test.db")
            .to_str()
            .expect("utf-8 tempdir path")
            .to_string(),
        utc_offset_hours: 3,
    };
    let store = Store::open(&config).await.expect("open test store");
    (store, dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn harness_store_opens_and_codec_round_trips() {
        let (store, _dir) = test_store().await;
        assert_eq!(store.count_messages().await.unwrap(), 0);

        let codec = test_codec();
        let token = codec.encrypt("fixture").unwrap();
        assert_eq!(codec.decrypt(&token).unwrap(), "fixture");
    }
}
