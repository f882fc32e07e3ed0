//! Normalized, finalized chain events handed to the witness by the chain
//! observer.
//!
//! Both kinds of events share the same shape; account creations are keyed by
//! a monotonic create count instead of a claim sequence and carry the reward
//! paid to witnesses.

use crate::amount::{AccountId, Amount};
use crate::bridge::BridgeDescriptor;
use crate::chain::{ChainRole, Direction};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cross-chain key of an attestation: the claim sequence of a transfer or
/// the create count of an account creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimKey {
    Claim(u64),
    CreateAccount(u64),
}

impl ClaimKey {
    /// Numeric value of the key.
    pub fn value(self) -> u64 {
        match self {
            ClaimKey::Claim(seq) | ClaimKey::CreateAccount(seq) => seq,
        }
    }

    /// Single-byte tag used by the message codec.
    pub fn wire_tag(self) -> u8 {
        match self {
            ClaimKey::Claim(_) => 1,
            ClaimKey::CreateAccount(_) => 2,
        }
    }
}

impl fmt::Display for ClaimKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimKey::Claim(seq) => write!(f, "claim#{}", seq),
            ClaimKey::CreateAccount(count) => write!(f, "create#{}", count),
        }
    }
}

/// A finalized transfer observed on its source chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimEvent {
    /// Chain the transaction was observed on
    pub source: ChainRole,
    /// Unique id of the observed transaction on its chain
    pub transaction_id: String,
    pub ledger_sequence: u32,
    /// Cross-chain sequence number assigned by the source door
    pub claim_sequence: u64,
    pub delivered_amount: Amount,
    pub bridge: BridgeDescriptor,
    pub sending_account: AccountId,
    pub reward_account: AccountId,
    pub other_chain_destination: Option<AccountId>,
    pub success: bool,
}

/// A finalized account-creating transfer observed on its source chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCreateEvent {
    pub source: ChainRole,
    pub transaction_id: String,
    pub ledger_sequence: u32,
    /// Monotonic create count assigned by the source door
    pub create_count: u64,
    pub delivered_amount: Amount,
    /// Reward split among the witnesses
    pub reward_amount: Amount,
    pub bridge: BridgeDescriptor,
    pub sending_account: AccountId,
    pub reward_account: AccountId,
    pub other_chain_destination: AccountId,
    pub success: bool,
}

/// Any event the engine consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChainEvent {
    Claim(ClaimEvent),
    CreateAccount(AccountCreateEvent),
}

impl ChainEvent {
    pub fn source(&self) -> ChainRole {
        match self {
            ChainEvent::Claim(e) => e.source,
            ChainEvent::CreateAccount(e) => e.source,
        }
    }

    pub fn direction(&self) -> Direction {
        Direction::from_source(self.source())
    }

    pub fn transaction_id(&self) -> &str {
        match self {
            ChainEvent::Claim(e) => &e.transaction_id,
            ChainEvent::CreateAccount(e) => &e.transaction_id,
        }
    }

    pub fn ledger_sequence(&self) -> u32 {
        match self {
            ChainEvent::Claim(e) => e.ledger_sequence,
            ChainEvent::CreateAccount(e) => e.ledger_sequence,
        }
    }

    pub fn claim_key(&self) -> ClaimKey {
        match self {
            ChainEvent::Claim(e) => ClaimKey::Claim(e.claim_sequence),
            ChainEvent::CreateAccount(e) => ClaimKey::CreateAccount(e.create_count),
        }
    }

    pub fn bridge(&self) -> &BridgeDescriptor {
        match self {
            ChainEvent::Claim(e) => &e.bridge,
            ChainEvent::CreateAccount(e) => &e.bridge,
        }
    }

    pub fn delivered_amount(&self) -> &Amount {
        match self {
            ChainEvent::Claim(e) => &e.delivered_amount,
            ChainEvent::CreateAccount(e) => &e.delivered_amount,
        }
    }
}

impl From<ClaimEvent> for ChainEvent {
    fn from(event: ClaimEvent) -> Self {
        ChainEvent::Claim(event)
    }
}

impl From<AccountCreateEvent> for ChainEvent {
    fn from(event: AccountCreateEvent) -> Self {
        ChainEvent::CreateAccount(event)
    }
}
