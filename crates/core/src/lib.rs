//! Core functionality for the cross-chain bridge witness.
//!
//! This crate provides the domain types shared by every part of the witness
//! (chain roles, bridge descriptors, amounts, observed events and signed
//! attestations), the durable attestation store, configuration and logging.

pub mod amount;
pub mod attestation;
pub mod bridge;
pub mod chain;
pub mod config;
pub mod error;
pub mod event;
pub mod logging;
#[cfg(feature = "sqlite")]
pub mod store;

pub use amount::{AccountId, Amount, Currency, IouValue, Issue, NATIVE_CURRENCY};
pub use attestation::Attestation;
pub use bridge::BridgeDescriptor;
pub use chain::{ChainRole, Direction};
pub use config::{ConfigError, LogFormat, NodeConfig, NodeMode};
pub use error::{CoreError, Result};
pub use event::{AccountCreateEvent, ChainEvent, ClaimEvent, ClaimKey};
#[cfg(feature = "sqlite")]
pub use store::{
    AttestationStore, ChainSyncState, InsertOutcome, StoreError, StoreMetrics, StoreWriter,
};
