//! Cryptographic primitives for the bridge witness.
//!
//! This crate provides the node's signing identity, the loader that turns
//! configured key material into that identity, and the canonical message
//! encoding every witness signs.
//!
//! # Security Principles
//!
//! - Never roll custom cryptographic primitives
//! - Secrets must never be logged or hardcoded
//! - Secret buffers are zeroized after use
//! - Identical claims must produce identical messages on every code path

pub mod identity;
pub mod keys;
pub mod message;

pub use identity::{verify, Identity, IdentityError, IdentityMetrics, SECRET_KEY_LENGTH};
pub use keys::{decode_secret, load_identity, DecodeAttempt, KeyEncoding, KeyError, SEED_LENGTH};
pub use message::{encode, MESSAGE_VERSION};
