//! Witness Identity - Node Signing Key
//!
//! The node's Ed25519 key pair, constructed once at startup and shared by
//! reference with both role engines and the query path:
//! - Deterministic signing (identical message, identical signature)
//! - Immutable after construction, safe to share across tasks
//! - Secret key bytes zeroized after loading
//! - Signing counters for observability

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use witness_core::AccountId;
use zeroize::Zeroize;

/// Length of an Ed25519 secret key.
pub const SECRET_KEY_LENGTH: usize = 32;

/// Errors that can occur while building or using an identity.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid key length: {actual} (expected {expected})")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("Invalid signing account: {reason}")]
    InvalidAccount { reason: String },

    #[error("Cryptographic error: {reason}")]
    CryptoError { reason: String },
}

/// Metrics for observability.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityMetrics {
    pub messages_signed_total: u64,
}

/// The node's signing identity.
pub struct Identity {
    signing_key: SigningKey,
    key_id: String,
    signing_account: AccountId,
    signed: AtomicU64,
}

impl Identity {
    /// Build an identity from raw secret key bytes.
    ///
    /// When `signing_account` is `None` the node attests under its key id.
    ///
    /// # Security
    /// The intermediate key copy is zeroized before returning.
    pub fn from_secret(
        secret: &[u8],
        signing_account: Option<AccountId>,
    ) -> Result<Self, IdentityError> {
        if secret.len() != SECRET_KEY_LENGTH {
            return Err(IdentityError::InvalidKeyLength {
                expected: SECRET_KEY_LENGTH,
                actual: secret.len(),
            });
        }

        let mut key_array = [0u8; SECRET_KEY_LENGTH];
        key_array.copy_from_slice(secret);
        let signing_key = SigningKey::from_bytes(&key_array);
        key_array.zeroize();

        let key_id = Self::generate_key_id(&signing_key.verifying_key());
        let signing_account = match signing_account {
            Some(account) => account,
            None => AccountId::new(key_id.clone()).map_err(|e| IdentityError::InvalidAccount {
                reason: e.to_string(),
            })?,
        };

        Ok(Self {
            signing_key,
            key_id,
            signing_account,
            signed: AtomicU64::new(0),
        })
    }

    /// Stable identifier of a verifying key: the first 16 bytes of its
    /// BLAKE3 hash, hex encoded.
    fn generate_key_id(verifying_key: &VerifyingKey) -> String {
        let hash = blake3::hash(verifying_key.as_bytes());
        hex::encode(&hash.as_bytes()[..16])
    }

    /// Sign `message` with the node key and return the 64 signature bytes.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let signature = self.signing_key.sign(message);
        self.signed.fetch_add(1, Ordering::Relaxed);
        signature.to_bytes().to_vec()
    }

    /// The 32 raw public key bytes.
    pub fn public_key(&self) -> Vec<u8> {
        self.signing_key.verifying_key().to_bytes().to_vec()
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Account this node attests on behalf of.
    pub fn signing_account(&self) -> &AccountId {
        &self.signing_account
    }

    /// Verify a signature made by this identity.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        verify(&self.public_key(), message, signature).unwrap_or(false)
    }

    /// Gets a snapshot of current metrics.
    pub fn metrics(&self) -> IdentityMetrics {
        IdentityMetrics {
            messages_signed_total: self.signed.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("key_id", &self.key_id)
            .field("signing_account", &self.signing_account)
            .finish_non_exhaustive()
    }
}

/// Verify an Ed25519 signature against raw public key bytes.
///
/// Returns `Ok(false)` for a well-formed signature that does not match and
/// an error when the key or signature bytes are malformed.
pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<bool, IdentityError> {
    let key_bytes: [u8; 32] =
        public_key
            .try_into()
            .map_err(|_| IdentityError::InvalidKeyLength {
                expected: 32,
                actual: public_key.len(),
            })?;
    let verifying_key =
        VerifyingKey::from_bytes(&key_bytes).map_err(|e| IdentityError::CryptoError {
            reason: e.to_string(),
        })?;
    let signature = Signature::from_slice(signature).map_err(|e| IdentityError::CryptoError {
        reason: e.to_string(),
    })?;
    Ok(verifying_key.verify(message, &signature).is_ok())
}
