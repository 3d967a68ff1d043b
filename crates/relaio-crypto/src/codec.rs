// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM text codec producing self-contained ciphertext tokens.
//!
//! Every call to [`MessageCodec::encrypt`] generates a fresh random 96-bit
//! nonce via the system CSPRNG; the token layout is
//! `base64url(nonce ‖ ciphertext ‖ tag)`. Nonce reuse would be catastrophic
//! for GCM security.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

use relaio_core::RelaioError;

/// Nonce length in bytes (96 bits, the GCM standard).
const NONCE_LEN: usize = 12;

/// Symmetric codec for text payloads.
///
/// Holds the derived storage key for the process lifetime. Encryption and
/// decryption are pure transformations with no other side effects.
pub struct MessageCodec {
    key: Zeroizing<[u8; 32]>,
}

impl MessageCodec {
    /// Wrap an already-derived 32-byte key.
    pub fn new(key: Zeroizing<[u8; 32]>) -> Self {
        Self { key }
    }

    /// Encrypt a plaintext string into a ciphertext token.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, RelaioError> {
        let unbound = UnboundKey::new(&AES_256_GCM, self.key.as_ref())
            .map_err(|_| RelaioError::Crypto("failed to create AES-256-GCM key".to_string()))?;
        let less_safe = LessSafeKey::new(unbound);

        let rng = SystemRandom::new();
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rng.fill(&mut nonce_bytes)
            .map_err(|_| RelaioError::Crypto("failed to generate random nonce".to_string()))?;

        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        // Seal in place: the buffer is extended with the authentication tag.
        let mut in_out = plaintext.as_bytes().to_vec();
        less_safe
            .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| RelaioError::Crypto("AES-256-GCM encryption failed".to_string()))?;

        let mut token = Vec::with_capacity(NONCE_LEN + in_out.len());
        token.extend_from_slice(&nonce_bytes);
        token.extend_from_slice(&in_out);

        Ok(URL_SAFE_NO_PAD.encode(token))
    }

    /// Decrypt a ciphertext token back into the plaintext string.
    ///
    /// Fails with [`RelaioError::Decrypt`] on malformed tokens, tampered
    /// data, or a key mismatch.
    pub fn decrypt(&self, token: &str) -> Result<String, RelaioError> {
        let raw = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| RelaioError::Decrypt(format!("invalid base64 token: {e}")))?;

        if raw.len() < NONCE_LEN + AES_256_GCM.tag_len() {
            return Err(RelaioError::Decrypt("token too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);
        let mut nonce_arr = [0u8; NONCE_LEN];
        nonce_arr.copy_from_slice(nonce_bytes);

        let unbound = UnboundKey::new(&AES_256_GCM, self.key.as_ref())
            .map_err(|_| RelaioError::Crypto("failed to create AES-256-GCM key".to_string()))?;
        let less_safe = LessSafeKey::new(unbound);

        let nonce = Nonce::assume_unique_for_key(nonce_arr);

        let mut in_out = ciphertext.to_vec();
        let plaintext = less_safe
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| {
                RelaioError::Decrypt("wrong key or corrupted ciphertext".to_string())
            })?;

        String::from_utf8(plaintext.to_vec())
            .map_err(|e| RelaioError::Decrypt(format!("plaintext is not valid UTF-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_codec() -> MessageCodec {
        MessageCodec::new(Zeroizing::new([7u8; 32]))
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let codec = test_codec();
        for plaintext in ["hello", "", "çok güzel bir mesaj 🚀", "a".repeat(4096).as_str()] {
            let token = codec.encrypt(plaintext).unwrap();
            assert_eq!(codec.decrypt(&token).unwrap(), plaintext);
        }
    }

    #[test]
    fn encrypt_produces_different_tokens_for_same_plaintext() {
        let codec = test_codec();
        let t1 = codec.encrypt("same input twice").unwrap();
        let t2 = codec.encrypt("same input twice").unwrap();
        // Random nonces must differ.
        assert_ne!(t1, t2);
    }

    #[test]
    fn decrypt_with_wrong_key_fails() {
        let codec = test_codec();
        let other = MessageCodec::new(Zeroizing::new([8u8; 32]));

        let token = codec.encrypt("secret data").unwrap();
        assert!(matches!(
            other.decrypt(&token),
            Err(RelaioError::Decrypt(_))
        ));
    }

    #[test]
    fn tampered_token_fails_decryption() {
        let codec = test_codec();
        let token = codec.encrypt("do not tamper").unwrap();

        let mut raw = URL_SAFE_NO_PAD.decode(&token).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let tampered = URL_SAFE_NO_PAD.encode(raw);

        assert!(codec.decrypt(&tampered).is_err());
    }

    #[test]
    fn garbage_input_fails_decryption() {
        let codec = test_codec();
        assert!(codec.decrypt("not base64 at all!!!").is_err());
        assert!(codec.decrypt("c2hvcnQ").is_err());
    }
}
