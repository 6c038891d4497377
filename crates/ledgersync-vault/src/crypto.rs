//! AES-256-GCM token encryption.
//!
//! Ciphertext is serialized as `iv:tag:data` where each part is lowercase
//! hex. The IV is 16 random bytes per call and the 16-byte GCM tag is stored
//! separately from the ciphertext body, matching the stored-token format the
//! rest of the system expects.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{VaultError, VaultResult};

/// AES-256-GCM with a 16-byte nonce (the stored-token IV size).
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// IV length in bytes.
const IV_LEN: usize = 16;

/// GCM authentication tag length in bytes.
const TAG_LEN: usize = 16;

/// Symmetric cipher for token storage.
///
/// The key lives outside the token records (loaded from the environment by
/// the binary) and never touches the database.
#[derive(Clone)]
pub struct TokenCipher {
    key: [u8; 32],
}

impl std::fmt::Debug for TokenCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCipher").finish_non_exhaustive()
    }
}

impl TokenCipher {
    /// Create a cipher from a 64-character hex key (32 bytes).
    pub fn from_hex_key(hex_key: &str) -> VaultResult<Self> {
        let bytes = hex::decode(hex_key.trim())
            .map_err(|e| VaultError::InvalidKey(format!("not valid hex: {e}")))?;
        let key: [u8; 32] = bytes
            .try_into()
            .map_err(|_| VaultError::InvalidKey("expected 32 bytes (64 hex chars)".to_string()))?;
        Ok(Self { key })
    }

    /// Encrypt a plaintext token, returning the `iv:tag:data` hex triplet.
    pub fn encrypt(&self, plaintext: &str) -> VaultResult<String> {
        let cipher = Aes256Gcm16::new_from_slice(&self.key)
            .map_err(|e| VaultError::Encryption(e.to_string()))?;

        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let sealed = cipher
            .encrypt(Nonce::from_slice(&iv), plaintext.as_bytes())
            .map_err(|e| VaultError::Encryption(e.to_string()))?;

        // The AEAD output is ciphertext || tag; the stored format keeps them
        // as separate hex fields.
        let (data, tag) = sealed.split_at(sealed.len() - TAG_LEN);

        Ok(format!(
            "{}:{}:{}",
            hex::encode(iv),
            hex::encode(tag),
            hex::encode(data)
        ))
    }

    /// Decrypt an `iv:tag:data` hex triplet back to the plaintext token.
    pub fn decrypt(&self, stored: &str) -> VaultResult<String> {
        let parts: Vec<&str> = stored.split(':').collect();
        let [iv_hex, tag_hex, data_hex] = parts.as_slice() else {
            return Err(VaultError::Decryption(
                "expected iv:tag:data triplet".to_string(),
            ));
        };

        let iv = hex::decode(iv_hex)
            .map_err(|e| VaultError::Decryption(format!("bad iv hex: {e}")))?;
        let tag = hex::decode(tag_hex)
            .map_err(|e| VaultError::Decryption(format!("bad tag hex: {e}")))?;
        let data = hex::decode(data_hex)
            .map_err(|e| VaultError::Decryption(format!("bad data hex: {e}")))?;

        if iv.len() != IV_LEN {
            return Err(VaultError::Decryption(format!(
                "bad iv length: expected {IV_LEN}, got {}",
                iv.len()
            )));
        }

        let cipher = Aes256Gcm16::new_from_slice(&self.key)
            .map_err(|e| VaultError::Decryption(e.to_string()))?;

        let mut sealed = data;
        sealed.extend_from_slice(&tag);

        let plaintext = cipher
            .decrypt(Nonce::from_slice(&iv), sealed.as_slice())
            .map_err(|_| VaultError::Decryption("authentication failed".to_string()))?;

        String::from_utf8(plaintext).map_err(|e| VaultError::Decryption(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cipher() -> TokenCipher {
        TokenCipher::from_hex_key(&"ab".repeat(32)).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let cipher = test_cipher();
        let stored = cipher.encrypt("secret123").unwrap();
        assert_eq!(cipher.decrypt(&stored).unwrap(), "secret123");
    }

    #[test]
    fn test_triplet_shape() {
        let cipher = test_cipher();
        let stored = cipher.encrypt("secret123").unwrap();
        let parts: Vec<&str> = stored.split(':').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), IV_LEN * 2);
        assert_eq!(parts[1].len(), TAG_LEN * 2);
    }

    #[test]
    fn test_unique_iv_per_call() {
        let cipher = test_cipher();
        let a = cipher.encrypt("secret123").unwrap();
        let b = cipher.encrypt("secret123").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_corrupted_ciphertext_rejected() {
        let cipher = test_cipher();
        let stored = cipher.encrypt("secret123").unwrap();

        // Flip one hex character in the data portion.
        let (prefix, data) = stored.rsplit_once(':').unwrap();
        let mut chars: Vec<char> = data.chars().collect();
        chars[0] = if chars[0] == '0' { '1' } else { '0' };
        let corrupted = format!("{prefix}:{}", chars.into_iter().collect::<String>());

        assert!(matches!(
            cipher.decrypt(&corrupted),
            Err(VaultError::Decryption(_))
        ));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let cipher = test_cipher();
        let other = TokenCipher::from_hex_key(&"cd".repeat(32)).unwrap();
        let stored = cipher.encrypt("secret123").unwrap();
        assert!(other.decrypt(&stored).is_err());
    }

    #[test]
    fn test_bad_key_length_rejected() {
        assert!(matches!(
            TokenCipher::from_hex_key("abcd"),
            Err(VaultError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_malformed_triplet_rejected() {
        let cipher = test_cipher();
        assert!(cipher.decrypt("not-a-triplet").is_err());
        assert!(cipher.decrypt("aa:bb").is_err());
    }
}
