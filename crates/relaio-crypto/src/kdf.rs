// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argon2id key derivation from the configured shared secret.
//!
//! The salt is derived deterministically from the secret itself (SHA-256
//! with a domain separator, truncated to 16 bytes). A random per-run salt
//! would invalidate every previously stored ciphertext on restart, so salt
//! determinism is a hard requirement here: one deployment, one key.

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use relaio_core::RelaioError;

/// Domain separator mixed into the salt derivation.
const SALT_DOMAIN: &[u8] = b"relaio.storage.salt.v1";

/// Derive the 32-byte storage key from the shared secret using Argon2id.
///
/// The returned key is wrapped in [`Zeroizing`] for automatic memory
/// zeroing on drop.
pub fn derive_key(
    secret: &[u8],
    memory_cost: u32,
    iterations: u32,
    parallelism: u32,
) -> Result<Zeroizing<[u8; 32]>, RelaioError> {
    let salt = derive_salt(secret);

    let params = argon2::Params::new(memory_cost, iterations, parallelism, Some(32))
        .map_err(|e| RelaioError::Crypto(format!("invalid Argon2id parameters: {e}")))?;

    let argon2 = argon2::Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let mut output = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(secret, &salt, output.as_mut())
        .map_err(|e| RelaioError::Crypto(format!("Argon2id key derivation failed: {e}")))?;

    Ok(output)
}

/// Derive the 16-byte salt deterministically from the secret.
fn derive_salt(secret: &[u8]) -> [u8; 16] {
    let mut hasher = Sha256::new();
    hasher.update(SALT_DOMAIN);
    hasher.update(secret);
    let digest = hasher.finalize();

    let mut salt = [0u8; 16];
    salt.copy_from_slice(&digest[..16]);
    salt
}
