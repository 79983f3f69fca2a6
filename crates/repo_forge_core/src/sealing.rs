//! Sealed-box encryption of secret values.
//!
//! Secrets uploaded to the remote platform must be encrypted client-side
//! against the repository's public key. The sealed-box construction uses a
//! fresh ephemeral keypair per message, so sealing the same plaintext twice
//! produces different ciphertexts; only the platform's private key can open
//! them, and the sealing side cannot verify the result.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use crypto_box::PublicKey;
use rand_core::OsRng;

#[cfg(test)]
#[path = "sealing_tests.rs"]
mod tests;

/// Errors produced while sealing a secret value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SealError {
    /// The recipient public key was not valid base64.
    #[error("recipient public key is not valid base64: {0}")]
    InvalidKeyEncoding(String),

    /// The decoded public key had the wrong length.
    #[error("recipient public key must decode to 32 bytes, got {length}")]
    InvalidKeyLength { length: usize },

    /// The underlying primitive failed to encrypt.
    #[error("sealed-box encryption failed")]
    Encryption,
}

/// Seals `plaintext` against a base64-encoded X25519 recipient public key,
/// returning the ciphertext as base64.
pub async fn seal(recipient_public_key_base64: &str, plaintext: &str) -> Result<String, SealError> {
    let key_bytes = BASE64
        .decode(recipient_public_key_base64.trim())
        .map_err(|e| SealError::InvalidKeyEncoding(e.to_string()))?;
    let key_bytes: [u8; 32] = key_bytes
        .as_slice()
        .try_into()
        .map_err(|_| SealError::InvalidKeyLength {
            length: key_bytes.len(),
        })?;

    let recipient = PublicKey::from(key_bytes);
    let sealed = recipient
        .seal(&mut OsRng, plaintext.as_bytes())
        .map_err(|_| SealError::Encryption)?;
    Ok(BASE64.encode(sealed))
}
