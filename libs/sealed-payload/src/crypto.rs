//! AES-128-GCM sealing keyed directly by a bearer token.
//!
//! The key is the first [`KEY_LEN`] bytes of the token's UTF-8 encoding. There
//! is no hashing or salting step: the server derives the same key the same way.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes128Gcm, Key, Nonce};
use rand::Rng;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{DecryptionError, EncryptionError};

/// AES-128 key length in bytes.
pub const KEY_LEN: usize = 16;

/// GCM initialization vector length in bytes (prefix of every sealed payload).
pub const IV_LEN: usize = 12;

/// GCM authentication tag length in bytes (suffix of every sealed payload).
pub const TAG_LEN: usize = 16;

/// Symmetric key derived from a bearer token.
///
/// Usable for both opening and sealing. Key bytes are wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey {
    bytes: [u8; KEY_LEN],
}

impl SessionKey {
    /// Derive the key from a bearer token.
    ///
    /// Tokens longer than [`KEY_LEN`] bytes contribute only their first
    /// [`KEY_LEN`] bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DecryptionError::KeyTooShort`] if the token is shorter than
    /// [`KEY_LEN`] bytes when UTF-8 encoded.
    pub fn from_bearer_token(token: &str) -> Result<Self, DecryptionError> {
        let raw = token.as_bytes();
        let Some(prefix) = raw.get(..KEY_LEN) else {
            return Err(DecryptionError::KeyTooShort {
                required: KEY_LEN,
                actual: raw.len(),
            });
        };

        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(prefix);
        Ok(Self { bytes })
    }

    fn cipher(&self) -> Aes128Gcm {
        Aes128Gcm::new(Key::<Aes128Gcm>::from_slice(&self.bytes))
    }

    /// Open a sealed payload (`IV || ciphertext || tag`).
    ///
    /// # Errors
    ///
    /// - [`DecryptionError::MalformedInput`] if the input is shorter than the IV
    /// - [`DecryptionError::Authentication`] if the tag does not verify
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, DecryptionError> {
        if sealed.len() < IV_LEN {
            return Err(DecryptionError::MalformedInput {
                len: sealed.len(),
                iv_len: IV_LEN,
            });
        }

        let (iv, ciphertext) = sealed.split_at(IV_LEN);
        self.cipher()
            .decrypt(Nonce::from_slice(iv), ciphertext)
            .map_err(|_| DecryptionError::Authentication)
    }

    /// Seal `plaintext` under the given IV, producing `IV || ciphertext || tag`.
    ///
    /// # Errors
    ///
    /// Returns [`EncryptionError::PlaintextRejected`] if the cipher rejects
    /// the input (plaintext beyond the GCM length limit).
    pub fn seal(&self, iv: &[u8; IV_LEN], plaintext: &[u8]) -> Result<Vec<u8>, EncryptionError> {
        let ciphertext = self
            .cipher()
            .encrypt(Nonce::from_slice(iv), plaintext)
            .map_err(|_| EncryptionError::PlaintextRejected {
                len: plaintext.len(),
            })?;

        let mut sealed = Vec::with_capacity(IV_LEN + ciphertext.len());
        sealed.extend_from_slice(iv);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Seal `plaintext` under a freshly generated random IV.
    ///
    /// # Errors
    ///
    /// See [`SessionKey::seal`].
    pub fn seal_random(&self, plaintext: &[u8]) -> Result<Vec<u8>, EncryptionError> {
        let mut iv = [0u8; IV_LEN];
        rand::rng().fill(&mut iv);
        self.seal(&iv, plaintext)
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKey").finish_non_exhaustive()
    }
}

/// Decrypt a sealed payload with a key derived from `token`.
///
/// # Errors
///
/// Returns a [`DecryptionError`] if the token is too short, the payload is
/// malformed, or authentication fails.
pub fn decrypt(sealed: &[u8], token: &str) -> Result<Vec<u8>, DecryptionError> {
    SessionKey::from_bearer_token(token)?.open(sealed)
}
