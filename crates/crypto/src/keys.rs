//! Key material decoding
//!
//! The configured signing key may be written as a raw secret key or as a
//! seed in one of several encodings. Decoders are tried in a fixed order and
//! the first success wins:
//!
//! 1. `secret-hex`: 64 hex digits, the 32-byte Ed25519 secret key
//! 2. `seed-base58`: a base58 seed (ripple alphabet) with a family-seed or
//!    Ed25519-seed version prefix and a double SHA-256 checksum
//! 3. `seed-hex`: 32 hex digits, the 16 seed bytes
//!
//! A recovered seed becomes a secret key through SHA-512-half. When nothing
//! matches, the error lists every encoding with the reason it was rejected.

use crate::identity::{Identity, IdentityError, SECRET_KEY_LENGTH};
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};
use witness_core::config::SigningSection;
use zeroize::{Zeroize, Zeroizing};

/// Length of a seed.
pub const SEED_LENGTH: usize = 16;

const FAMILY_SEED_PREFIX: &[u8] = &[0x21];
const ED25519_SEED_PREFIX: &[u8] = &[0x01, 0xE1, 0x4B];
const CHECKSUM_LENGTH: usize = 4;

type Secret = Zeroizing<[u8; SECRET_KEY_LENGTH]>;

/// Supported key encodings, in decoding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEncoding {
    SecretHex,
    SeedBase58,
    SeedHex,
}

impl KeyEncoding {
    pub const ALL: [KeyEncoding; 3] = [
        KeyEncoding::SecretHex,
        KeyEncoding::SeedBase58,
        KeyEncoding::SeedHex,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            KeyEncoding::SecretHex => "secret-hex",
            KeyEncoding::SeedBase58 => "seed-base58",
            KeyEncoding::SeedHex => "seed-hex",
        }
    }

    fn decode(self, input: &str) -> Result<Secret, String> {
        match self {
            KeyEncoding::SecretHex => decode_secret_hex(input),
            KeyEncoding::SeedBase58 => decode_seed_base58(input).map(|seed| secret_from_seed(&seed)),
            KeyEncoding::SeedHex => decode_seed_hex(input).map(|seed| secret_from_seed(&seed)),
        }
    }
}

impl fmt::Display for KeyEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rejected decoding attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeAttempt {
    pub encoding: KeyEncoding,
    pub reason: String,
}

/// Errors that can occur while loading key material.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Unrecognized key material: {}", describe(attempts))]
    Unrecognized { attempts: Vec<DecodeAttempt> },

    #[error(transparent)]
    Identity(#[from] IdentityError),
}

fn describe(attempts: &[DecodeAttempt]) -> String {
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.encoding, a.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Decode `input` into a secret key, trying every encoding in order.
pub fn decode_secret(input: &str) -> Result<Zeroizing<[u8; SECRET_KEY_LENGTH]>, KeyError> {
    let input = input.trim();
    let mut attempts = Vec::with_capacity(KeyEncoding::ALL.len());

    for encoding in KeyEncoding::ALL {
        match encoding.decode(input) {
            Ok(secret) => {
                debug!(encoding = %encoding, "Decoded signing key");
                return Ok(secret);
            }
            Err(reason) => attempts.push(DecodeAttempt { encoding, reason }),
        }
    }

    Err(KeyError::Unrecognized { attempts })
}

/// Build the node identity from the `[signing]` configuration section.
pub fn load_identity(section: &SigningSection) -> Result<Identity, KeyError> {
    let secret = decode_secret(&section.key)?;
    let identity = Identity::from_secret(&secret[..], section.signing_account.clone())?;
    info!(
        key_id = %identity.key_id(),
        signing_account = %identity.signing_account(),
        "Loaded witness identity"
    );
    Ok(identity)
}

/// SHA-512-half of a seed.
fn secret_from_seed(seed: &[u8; SEED_LENGTH]) -> Secret {
    let mut digest = Sha512::digest(seed);
    let mut secret = Zeroizing::new([0u8; SECRET_KEY_LENGTH]);
    secret.copy_from_slice(&digest[..SECRET_KEY_LENGTH]);
    digest.as_mut_slice().zeroize();
    secret
}

fn decode_hex_exact<const N: usize>(input: &str) -> Result<Zeroizing<[u8; N]>, String> {
    if input.len() != N * 2 {
        return Err(format!("expected {} hex digits, got {}", N * 2, input.len()));
    }
    let bytes = Zeroizing::new(hex::decode(input).map_err(|e| e.to_string())?);
    let mut out = Zeroizing::new([0u8; N]);
    out.copy_from_slice(&bytes);
    Ok(out)
}

fn decode_secret_hex(input: &str) -> Result<Secret, String> {
    decode_hex_exact::<SECRET_KEY_LENGTH>(input)
}

fn decode_seed_hex(input: &str) -> Result<Zeroizing<[u8; SEED_LENGTH]>, String> {
    decode_hex_exact::<SEED_LENGTH>(input)
}

fn decode_seed_base58(input: &str) -> Result<Zeroizing<[u8; SEED_LENGTH]>, String> {
    let raw = Zeroizing::new(
        bs58::decode(input)
            .with_alphabet(bs58::Alphabet::RIPPLE)
            .into_vec()
            .map_err(|e| e.to_string())?,
    );

    let prefix = [FAMILY_SEED_PREFIX, ED25519_SEED_PREFIX]
        .into_iter()
        .find(|p| raw.len() == p.len() + SEED_LENGTH + CHECKSUM_LENGTH && raw.starts_with(p))
        .ok_or_else(|| format!("no known seed prefix for a {}-byte payload", raw.len()))?;

    let (payload, checksum) = raw.split_at(raw.len() - CHECKSUM_LENGTH);
    let expected = Sha256::digest(Sha256::digest(payload));
    if checksum != &expected[..CHECKSUM_LENGTH] {
        return Err("checksum mismatch".to_string());
    }

    let mut seed = Zeroizing::new([0u8; SEED_LENGTH]);
    seed.copy_from_slice(&payload[prefix.len()..]);
    Ok(seed)
}
