//! # Sealed Envelope
//!
//! The encrypt/decrypt transform applied to everything the engine persists:
//! session snapshots, reports, cached graphs, and exported backups.
//!
//! The engine only relies on two properties of the transform:
//! - `open(seal(x)) == x`
//! - opening foreign or tampered input FAILS with an explicit error,
//!   never yields garbage bytes
//!
//! An AEAD gives both. The production implementation is
//! XChaCha20-Poly1305 with a key derived from an operator passphrase; the
//! [`Cipher`] trait is the seam for swapping it (e.g. a no-op cipher in
//! throwaway test setups).

use crate::types::InterviewError;
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Nonce length of XChaCha20-Poly1305.
pub const NONCE_LEN: usize = 24;

/// A sealed payload: nonce + ciphertext (tag included).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedBox {
    /// Per-seal random nonce.
    pub nonce: Vec<u8>,
    /// Ciphertext with the authentication tag appended.
    pub ciphertext: Vec<u8>,
}

/// The encrypt/decrypt seam.
///
/// Implementations must be stateless transforms; `open` must reject any
/// input not produced by the matching `seal`.
pub trait Cipher: Send + Sync {
    /// Seal plaintext into an authenticated envelope.
    fn seal(&self, plaintext: &[u8]) -> Result<SealedBox, InterviewError>;

    /// Open a sealed envelope, failing loudly on tamper or key mismatch.
    fn open(&self, sealed: &SealedBox) -> Result<Vec<u8>, InterviewError>;
}

/// XChaCha20-Poly1305 keyed from an operator passphrase.
///
/// The key is SHA-256 of the passphrase. The passphrase is a deterrent for
/// data at rest on a shared workstation, not a hardened secret-management
/// scheme (the admin password in front of the editing surface has the same
/// advisory status).
#[derive(Clone)]
pub struct PassphraseCipher {
    key: [u8; 32],
}

impl std::fmt::Debug for PassphraseCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.debug_struct("PassphraseCipher").finish_non_exhaustive()
    }
}

impl PassphraseCipher {
    /// Derive a cipher from a passphrase.
    #[must_use]
    pub fn new(passphrase: &str) -> Self {
        let digest = Sha256::digest(passphrase.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Self { key }
    }
}

impl Cipher for PassphraseCipher {
    fn seal(&self, plaintext: &[u8]) -> Result<SealedBox, InterviewError> {
        let cipher = XChaCha20Poly1305::new((&self.key).into());
        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| InterviewError::Decryption("sealing failed".to_string()))?;
        Ok(SealedBox {
            nonce: nonce.to_vec(),
            ciphertext,
        })
    }

    fn open(&self, sealed: &SealedBox) -> Result<Vec<u8>, InterviewError> {
        if sealed.nonce.len() != NONCE_LEN {
            return Err(InterviewError::Decryption(format!(
                "bad nonce length: {}",
                sealed.nonce.len()
            )));
        }
        let cipher = XChaCha20Poly1305::new((&self.key).into());
        let nonce = XNonce::from_slice(&sealed.nonce);
        cipher
            .decrypt(nonce, sealed.ciphertext.as_slice())
            .map_err(|_| {
                InterviewError::Decryption("ciphertext rejected (wrong key or tampered data)".to_string())
            })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let cipher = PassphraseCipher::new("clinic-7");
        let sealed = cipher.seal(b"answers: null, true, false").expect("seal");
        let opened = cipher.open(&sealed).expect("open");
        assert_eq!(opened, b"answers: null, true, false");
    }

    #[test]
    fn nonce_is_fresh_per_seal() {
        let cipher = PassphraseCipher::new("clinic-7");
        let a = cipher.seal(b"same").expect("seal");
        let b = cipher.seal(b"same").expect("seal");
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn tampered_ciphertext_is_rejected() {
        let cipher = PassphraseCipher::new("clinic-7");
        let mut sealed = cipher.seal(b"payload").expect("seal");
        if let Some(byte) = sealed.ciphertext.first_mut() {
            *byte ^= 0xFF;
        }
        let err = cipher.open(&sealed);
        assert!(matches!(err, Err(InterviewError::Decryption(_))));
    }

    #[test]
    fn wrong_passphrase_is_rejected() {
        let sealed = PassphraseCipher::new("clinic-7").seal(b"payload").expect("seal");
        let err = PassphraseCipher::new("clinic-8").open(&sealed);
        assert!(matches!(err, Err(InterviewError::Decryption(_))));
    }

    #[test]
    fn truncated_nonce_is_rejected_before_decrypt() {
        let cipher = PassphraseCipher::new("clinic-7");
        let mut sealed = cipher.seal(b"payload").expect("seal");
        sealed.nonce.truncate(4);
        assert!(matches!(cipher.open(&sealed), Err(InterviewError::Decryption(_))));
    }
}
